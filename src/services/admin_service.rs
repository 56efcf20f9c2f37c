use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderList, UpdateOrderStatusRequest},
        users::UserList,
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderStatus, User},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination},
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(state.db()).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(state.db())
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(raw) = query.status.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(parse_status(raw)?));
    }

    let finder = Orders::find()
        .filter(condition)
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

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let status = parse_status(&payload.status)?;

    let order = Orders::find_by_id(id)
        .one(state.db())
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    let previous = order.status;
    let mut active: OrderActive = order.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(state.db()).await?;

    tracing::info!(
        order_id = %id,
        admin_id = %user.user_id,
        from = previous.as_str(),
        to = status.as_str(),
        "order status updated"
    );

    Ok(ApiResponse::success(
        "Order status updated successfully",
        Order::from(updated),
        Some(Meta::empty()),
    ))
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    OrderStatus::parse(raw).ok_or_else(|| AppError::BadRequest("Invalid status value".into()))
}
