pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod contacts;
pub mod order_items;
pub mod orders;
pub mod products;

pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use contacts::Entity as Contacts;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
