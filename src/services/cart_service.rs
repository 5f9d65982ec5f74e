use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartLine, CartList, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    response::ApiResponse,
};

/// List the caller's cart lines with product name and live price. The
/// whole cart comes back in one response, never a page of it.
/// A user who never added anything simply gets an empty list; no cart
/// row is created on read.
pub async fn list_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let items = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT ci.id, ci.product_id, p.name AS product_name, p.price, ci.quantity
        FROM cart_items ci
        JOIN carts c ON c.id = ci.cart_id
        JOIN products p ON p.id = ci.product_id
        WHERE c.user_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success("OK", CartList { items }, None))
}

/// Add a product to the cart, creating the cart lazily and merging the
/// quantity into an existing line for the same product.
pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product_exist.is_none() {
        return Err(AppError::NotFound);
    }

    let cart: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO carts (id, user_id) VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .fetch_one(pool)
    .await?;

    // One line per (cart, product): an existing line absorbs the quantity.
    // The product can vanish between the check above and this insert;
    // the broken reference still reads as a missing product.
    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        INSERT INTO cart_items (id, cart_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (cart_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart.0)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .fetch_one(pool)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::NotFound,
        other => AppError::Db(other),
    })?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Added to cart", cart_item, None))
}

/// Replace the quantity of a cart line owned by the caller.
pub async fn update_cart_item(
    pool: &DbPool,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let updated = sqlx::query_as::<_, CartItem>(
        r#"
        UPDATE cart_items ci
        SET quantity = $3
        FROM carts c
        WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
        RETURNING ci.*
        "#,
    )
    .bind(item_id)
    .bind(user.user_id)
    .bind(payload.quantity)
    .fetch_optional(pool)
    .await?;

    let cart_item = updated.ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("Cart updated", cart_item, None))
}

/// Delete a cart line owned by the caller. Not idempotent: once the
/// line is gone, further calls are NotFound.
pub async fn remove_cart_item(pool: &DbPool, user: &AuthUser, item_id: Uuid) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM cart_items ci
        USING carts c
        WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
        "#,
    )
    .bind(item_id)
    .bind(user.user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "item_id": item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}
