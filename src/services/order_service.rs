use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{ChangeStatusRequest, CreateFromCartRequest, OrderList, OrderWithItems},
    entity::{
        cart_items::{self, Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        contacts::{Column as ContactCol, Entity as Contacts},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::Column as ProdCol,
    },
    error::{AppError, AppResult},
    jobs::Job,
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    status::OrderStatus,
};

#[derive(Debug, FromQueryResult)]
struct CartLineRow {
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
}

/// Convert the caller's cart into an order, atomically: snapshot prices
/// into order items, store the computed total and clear the cart lines.
/// The confirmation mail is enqueued only after the commit and can
/// never undo it.
pub async fn create_from_cart(
    state: &AppState,
    user: &AuthUser,
    payload: CreateFromCartRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let contact = Contacts::find()
        .filter(
            Condition::all()
                .add(ContactCol::Id.eq(payload.contact_id))
                .add(ContactCol::UserId.eq(user.user_id)),
        )
        .one(&txn)
        .await?
        .ok_or(AppError::ContactNotFound)?;

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or(AppError::EmptyCart)?;

    // Row locks serialize concurrent conversions for the same user; the
    // loser re-reads an already emptied cart.
    let lines = CartItems::find()
        .select_only()
        .column_as(CartItemCol::ProductId, "product_id")
        .column_as(CartItemCol::Quantity, "quantity")
        .column_as(ProdCol::Price, "price")
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .filter(CartItemCol::CartId.eq(cart.id))
        .lock(LockType::Update)
        .into_model::<CartLineRow>()
        .all(&txn)
        .await?;

    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let total_amount = order_total(lines.iter().map(|line| (line.quantity, line.price)));

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        contact_id: Set(Some(contact.id)),
        status: Set(OrderStatus::New.as_str().to_owned()),
        total_amount: Set(total_amount),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            // Snapshot of the current catalog price; later catalog
            // changes must not touch this order.
            price: Set(line.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    state.jobs.send(Job::OrderConfirmation { order_id: order.id });

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_created",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": order.total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let order = order_from_entity(order)?;
    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

/// Guarded status change. All transition checking happens here against
/// [`OrderStatus::can_transition_to`]; callers only name a target.
pub async fn change_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ChangeStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let requested = OrderStatus::parse(&payload.status)
        .ok_or_else(|| AppError::Validation(format!("unknown status '{}'", payload.status)))?;

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = parse_stored_status(&order.status)?;
    if !current.can_transition_to(requested) {
        return Err(AppError::InvalidTransition {
            from: current,
            to: requested,
        });
    }

    let mut active: OrderActive = order.into();
    active.status = Set(requested.as_str().to_owned());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_change",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Status updated",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status = OrderStatus::parse(status)
            .ok_or_else(|| AppError::Validation(format!("unknown status '{status}'")))?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "OK",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Order detail, scoped to the owner. A foreign order id reads as
/// NotFound so existence is never leaked.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    let order = order_from_entity(order)?;
    Ok(ApiResponse::success(
        "OK",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

/// Maintenance sweep: cancel orders that sat in `new` past the cutoff.
/// A single conditional update; the status predicate doubles as the
/// `new -> canceled` transition guard, so an order moved on by a
/// concurrent `change_status` is skipped, never overwritten.
pub async fn cancel_stale_orders(
    state: &AppState,
    older_than: chrono::Duration,
) -> AppResult<u64> {
    let cutoff = Utc::now() - older_than;
    let result = Orders::update_many()
        .col_expr(
            OrderCol::Status,
            Expr::value(OrderStatus::Canceled.as_str()),
        )
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(
            Condition::all()
                .add(OrderCol::Status.eq(OrderStatus::New.as_str()))
                .add(OrderCol::CreatedAt.lt(cutoff)),
        )
        .exec(&state.orm)
        .await?;

    Ok(result.rows_affected)
}

fn order_total(lines: impl Iterator<Item = (i32, Decimal)>) -> Decimal {
    lines
        .map(|(quantity, price)| Decimal::from(quantity) * price)
        .sum()
}

fn parse_stored_status(raw: &str) -> AppResult<OrderStatus> {
    OrderStatus::parse(raw).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("order carries unknown status '{raw}'"))
    })
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        contact_id: model.contact_id,
        status: parse_stored_status(&model.status)?,
        total_amount: model.total_amount,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::order_total;
    use rust_decimal::Decimal;

    #[test]
    fn total_is_sum_of_quantity_times_price() {
        let price: Decimal = "799.99".parse().unwrap();
        assert_eq!(
            order_total([(2, price)].into_iter()),
            "1599.98".parse::<Decimal>().unwrap()
        );

        let lines = [
            (2, "799.99".parse::<Decimal>().unwrap()),
            (1, "29.99".parse::<Decimal>().unwrap()),
            (3, "10.00".parse::<Decimal>().unwrap()),
        ];
        assert_eq!(
            order_total(lines.into_iter()),
            "1659.97".parse::<Decimal>().unwrap()
        );
    }

    #[test]
    fn total_of_no_lines_is_zero() {
        assert_eq!(order_total(std::iter::empty()), Decimal::ZERO);
    }
}
