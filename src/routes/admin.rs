use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};

use crate::{
    db::bounded,
    dto::{
        orders::{OrderList, UpdateOrderStatusRequest},
        users::UserList,
    },
    error::AppResult,
    middleware::auth::AdminUser,
    models::Order,
    response::ApiResponse,
    routes::params::{JsonBody, OrderListQuery, Pagination, parse_id},
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/orders", get(list_orders))
        .route("/orders/{id}", patch(update_order_status))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    params(
        ("page" = Option<u64>, Query, description = "Page number, default 1"),
        ("limit" = Option<u64>, Query, description = "Items per page, default 10, max 100")
    ),
    responses(
        (status = 200, description = "All users, newest first", body = ApiResponse<UserList>),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = bounded(
        state.config.query_timeout,
        admin_service::list_users(&state, pagination),
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number, default 1"),
        ("limit" = Option<u64>, Query, description = "Items per page, default 10, max 100"),
        ("status" = Option<String>, Query, description = "new, processing, shipped, completed or cancelled")
    ),
    responses(
        (status = 200, description = "All orders, newest first", body = ApiResponse<OrderList>),
        (status = 400, description = "Invalid status value"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = bounded(
        state.config.query_timeout,
        admin_service::list_orders(&state, query),
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/orders/{id}",
    params(
        ("id" = String, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<Order>),
        (status = 400, description = "Invalid order ID or status value"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let id = parse_id(&id, "order")?;
    let resp = bounded(
        state.config.query_timeout,
        admin_service::update_order_status(&state, &admin.user, id, payload),
    )
    .await?;
    Ok(Json(resp))
}
