use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::contacts::{AddressList, AddressRequest, ContactList, ContactRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, Contact},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

// All queries are scoped by user_id: another user's record is
// indistinguishable from a missing one.

pub async fn list_contacts(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ContactList>> {
    let (page, limit, offset) = pagination.normalize();
    let items = sqlx::query_as::<_, Contact>(
        "SELECT * FROM contacts WHERE user_id = $1 ORDER BY last_name, first_name LIMIT $2 OFFSET $3",
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contacts WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", ContactList { items }, Some(meta)))
}

pub async fn get_contact(pool: &DbPool, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Contact>> {
    let contact =
        sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.user_id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Contact", contact, None))
}

pub async fn create_contact(
    pool: &DbPool,
    user: &AuthUser,
    payload: ContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(
        r#"
        INSERT INTO contacts (id, user_id, first_name, last_name, middle_name, email, phone, address)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.first_name)
    .bind(payload.last_name)
    .bind(payload.middle_name)
    .bind(payload.email)
    .bind(payload.phone)
    .bind(payload.address)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success("Contact created", contact, None))
}

pub async fn update_contact(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: ContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(
        r#"
        UPDATE contacts
        SET first_name = $3, last_name = $4, middle_name = $5, email = $6, phone = $7, address = $8
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .bind(payload.first_name)
    .bind(payload.last_name)
    .bind(payload.middle_name)
    .bind(payload.email)
    .bind(payload.phone)
    .bind(payload.address)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("Contact updated", contact, None))
}

/// Delete a contact. Orders referencing it keep running with their
/// contact reference nulled by the schema.
pub async fn delete_contact(pool: &DbPool, user: &AuthUser, id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn list_addresses(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<AddressList>> {
    let (page, limit, offset) = pagination.normalize();
    let items = sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY title LIMIT $2 OFFSET $3",
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM addresses WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", AddressList { items }, Some(meta)))
}

pub async fn get_address(pool: &DbPool, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Address>> {
    let address =
        sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.user_id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Address", address, None))
}

pub async fn create_address(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let address = sqlx::query_as::<_, Address>(
        r#"
        INSERT INTO addresses (id, user_id, title, address_line, city, postal_code, country)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.title)
    .bind(payload.address_line)
    .bind(payload.city)
    .bind(payload.postal_code)
    .bind(payload.country)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success("Address created", address, None))
}

pub async fn update_address(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let address = sqlx::query_as::<_, Address>(
        r#"
        UPDATE addresses
        SET title = $3, address_line = $4, city = $5, postal_code = $6, country = $7
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .bind(payload.title)
    .bind(payload.address_line)
    .bind(payload.city)
    .bind(payload.postal_code)
    .bind(payload.country)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("Address updated", address, None))
}

pub async fn delete_address(pool: &DbPool, user: &AuthUser, id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
