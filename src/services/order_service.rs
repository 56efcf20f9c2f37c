use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::orders::OrderList,
    entity::{
        carts::Entity as Carts,
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, OrderLines},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::cart_service,
    state::AppState,
};

/// Turns the caller's cart into an order.
///
/// Lines are processed in cart order and every stock decrement is persisted as soon as it is
/// made. A failing line aborts the checkout without restoring the decrements of the lines
/// before it, and no order is written in that case.
pub async fn checkout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Order>> {
    let cart = cart_service::find_cart(state.db(), user.user_id)
        .await?
        .filter(|cart| !cart.items.0.is_empty())
        .ok_or_else(|| AppError::BadRequest("Cart is empty or not found".into()))?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(cart.items.0.len());
    let mut total: i64 = 0;

    for line in &cart.items.0 {
        let product = Products::find_by_id(line.product_id)
            .one(state.db())
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Product with ID {} not found", line.product_id))
            })?;

        let insufficient =
            || AppError::InsufficientStock(format!("Insufficient stock for {}", product.name));

        if product.stock < line.quantity {
            return Err(insufficient());
        }

        // Sized before the decrement so an unrepresentable total never costs stock.
        total = product
            .price
            .checked_mul(i64::from(line.quantity))
            .and_then(|amount| total.checked_add(amount))
            .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;

        let result = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .filter(
                Condition::all()
                    .add(ProdCol::Id.eq(product.id))
                    .add(ProdCol::Stock.gte(line.quantity)),
            )
            .exec(state.db())
            .await?;

        // Another checkout took the stock between the read and the update.
        if result.rows_affected == 0 {
            return Err(insufficient());
        }

        items.push(OrderItem {
            product_id: product.id,
            quantity: line.quantity,
            price: product.price,
        });
    }

    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4(),
        order_code: build_order_code(now.timestamp_nanos_opt().unwrap_or_default()),
        user_id: user.user_id,
        items,
        total,
        status: OrderStatus::New,
        created_at: now,
        updated_at: now,
    };

    Orders::insert(OrderActive {
        id: Set(order.id),
        order_code: Set(order.order_code.clone()),
        user_id: Set(order.user_id),
        items: Set(OrderLines(order.items.clone())),
        total: Set(order.total),
        status: Set(order.status),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    })
    .exec_without_returning(state.db())
    .await?;

    if let Err(err) = Carts::delete_by_id(cart.id).exec(state.db()).await {
        tracing::warn!(
            error = %err,
            user_id = %user.user_id,
            "failed to delete cart after checkout"
        );
    }

    tracing::info!(
        order_id = %order.id,
        order_code = %order.order_code,
        user_id = %user.user_id,
        total = order.total,
        "checkout completed"
    );

    Ok(ApiResponse::success(
        "Checkout successful",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(state.db()).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(state.db())
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Orders that belong to another user are reported as not found.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .one(state.db())
        .await?
        .map(Order::from)
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    Ok(ApiResponse::success("Order", order, None))
}

fn build_order_code(unix_nanos: i64) -> String {
    format!("TB-{unix_nanos}")
}
