use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::contacts::{ContactList, ContactRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Contact,
    response::ApiResponse,
    routes::params::Pagination,
    services::contact_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route(
            "/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}

#[utoipa::path(
    get,
    path = "/api/contacts",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List caller's contacts", body = ApiResponse<ContactList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ContactList>>> {
    let resp = contact_service::list_contacts(&state.pool, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/contacts/{id}",
    params(
        ("id" = Uuid, Path, description = "Contact ID")
    ),
    responses(
        (status = 200, description = "Contact", body = ApiResponse<Contact>),
        (status = 404, description = "Contact not found or not owned by caller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn get_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = contact_service::get_contact(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Contact created", body = ApiResponse<Contact>)
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ContactRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Contact>>)> {
    let resp = contact_service::create_contact(&state.pool, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/contacts/{id}",
    params(
        ("id" = Uuid, Path, description = "Contact ID")
    ),
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Contact updated", body = ApiResponse<Contact>),
        (status = 404, description = "Contact not found or not owned by caller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn update_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = contact_service::update_contact(&state.pool, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/contacts/{id}",
    params(
        ("id" = Uuid, Path, description = "Contact ID")
    ),
    responses(
        (status = 204, description = "Contact deleted; orders keep running without it"),
        (status = 404, description = "Contact not found or not owned by caller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn delete_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    contact_service::delete_contact(&state.pool, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
