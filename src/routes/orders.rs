use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    db::bounded,
    dto::orders::OrderList,
    error::AppResult,
    middleware::auth::CustomerUser,
    models::Order,
    response::ApiResponse,
    routes::params::{Pagination, parse_id},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/checkout", post(checkout))
        .route("/{id}", get(get_order))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/checkout",
    responses(
        (status = 201, description = "Order created from the cart", body = ApiResponse<Order>),
        (status = 400, description = "Cart empty or insufficient stock"),
        (status = 404, description = "A product in the cart no longer exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    customer: CustomerUser,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let resp = bounded(
        state.config.checkout_timeout,
        order_service::checkout(&state, &customer.user),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number, default 1"),
        ("limit" = Option<u64>, Query, description = "Items per page, default 10, max 100")
    ),
    responses(
        (status = 200, description = "Orders of the current user, newest first", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    customer: CustomerUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = bounded(
        state.config.query_timeout,
        order_service::list_orders(&state, &customer.user, pagination),
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(
        ("id" = String, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order detail", body = ApiResponse<Order>),
        (status = 400, description = "Invalid order ID"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    customer: CustomerUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let id = parse_id(&id, "order")?;
    let resp = bounded(
        state.config.query_timeout,
        order_service::get_order(&state, &customer.user, id),
    )
    .await?;
    Ok(Json(resp))
}
