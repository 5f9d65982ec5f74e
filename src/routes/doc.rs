use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartLine, CartList, UpdateCartItemRequest},
        contacts::{AddressList, AddressRequest, ContactList, ContactRequest},
        orders::{ChangeStatusRequest, CreateFromCartRequest, OrderList, OrderWithItems},
        products::{
            CategoryList, CreateCategoryRequest, CreateProductRequest, ImportRequest,
            ProductList, UpdateProductRequest,
        },
    },
    models::{Address, Category, Contact, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{
        addresses, auth, cart, categories, contacts, health, orders, params,
        products as product_routes,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        product_routes::import_products,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        cart::list_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        orders::list_orders,
        orders::create_from_cart,
        orders::get_order,
        orders::change_status,
        contacts::list_contacts,
        contacts::get_contact,
        contacts::create_contact,
        contacts::update_contact,
        contacts::delete_contact,
        addresses::list_addresses,
        addresses::get_address,
        addresses::create_address,
        addresses::update_address,
        addresses::delete_address
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            Order,
            OrderItem,
            Contact,
            Address,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartLine,
            CartList,
            CreateFromCartRequest,
            ChangeStatusRequest,
            OrderWithItems,
            OrderList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateCategoryRequest,
            CategoryList,
            ImportRequest,
            ContactRequest,
            ContactList,
            AddressRequest,
            AddressList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CategoryList>,
            ApiResponse<CartList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<ContactList>,
            ApiResponse<AddressList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Contacts", description = "Contact endpoints"),
        (name = "Addresses", description = "Address endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
