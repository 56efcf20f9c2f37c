use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};

use crate::{
    db::bounded,
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    error::AppResult,
    middleware::auth::CustomerUser,
    models::Cart,
    response::ApiResponse,
    routes::params::{JsonBody, parse_id},
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_to_cart).put(update_cart_item))
        .route("/{product_id}", delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/v1/cart",
    responses(
        (status = 200, description = "Cart of the current user, empty if none exists", body = ApiResponse<Cart>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    customer: CustomerUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = bounded(
        state.config.query_timeout,
        cart_service::get_cart(&state, &customer.user),
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Item added", body = ApiResponse<Cart>),
        (status = 400, description = "Invalid input or insufficient stock"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    customer: CustomerUser,
    JsonBody(payload): JsonBody<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = bounded(
        state.config.query_timeout,
        cart_service::add_item(&state, &customer.user, payload),
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/cart",
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity set, zero removes the line", body = ApiResponse<Cart>),
        (status = 400, description = "Invalid input or insufficient stock"),
        (status = 404, description = "Cart or item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    customer: CustomerUser,
    JsonBody(payload): JsonBody<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = bounded(
        state.config.query_timeout,
        cart_service::update_item(&state, &customer.user, payload),
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/{product_id}",
    params(
        ("product_id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Item removed", body = ApiResponse<Cart>),
        (status = 404, description = "Item not found in cart")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    customer: CustomerUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let product_id = parse_id(&product_id, "product")?;
    let resp = bounded(
        state.config.query_timeout,
        cart_service::remove_item(&state, &customer.user, product_id),
    )
    .await?;
    Ok(Json(resp))
}
