use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{ChangeStatusRequest, CreateFromCartRequest, OrderList, OrderWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/create-from-cart", post(create_from_cart))
        .route("/{id}", get(get_order))
        .route("/{id}/change-status", patch(change_status))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "List caller's orders", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/create-from-cart",
    request_body = CreateFromCartRequest,
    responses(
        (status = 201, description = "Order created from cart", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Cart is empty"),
        (status = 404, description = "Contact not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateFromCartRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let resp = order_service::create_from_cart(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found or not owned by caller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/change-status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "New status applied", body = ApiResponse<Order>),
        (status = 400, description = "Unknown status or forbidden transition"),
        (status = 404, description = "Order not found or not owned by caller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn change_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::change_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
