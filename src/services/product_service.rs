use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::products::{ProductList, ProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(name) = query.name.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(name));
        condition = condition.add(Expr::col(Column::Name).ilike(pattern));
    }

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Category.eq(category.clone()));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(state.db()).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(state.db())
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

/// A malformed id is reported as not found, the same as a missing product.
pub async fn get_product(state: &AppState, raw_id: &str) -> AppResult<ApiResponse<Product>> {
    let not_found = || AppError::NotFound("Product not found".into());
    let id = Uuid::parse_str(raw_id.trim()).map_err(|_| not_found())?;

    let product = Products::find_by_id(id)
        .one(state.db())
        .await?
        .map(Product::from)
        .ok_or_else(not_found)?;

    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    validate_product(&payload)?;

    let now = Utc::now();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        category: Set(payload.category),
        image_url: Set(payload.image_url),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let product = active.insert(state.db()).await?;

    tracing::info!(product_id = %product.id, admin_id = %user.user_id, "product created");

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

/// Overwrites every editable field.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    validate_product(&payload)?;

    let existing = Products::find_by_id(id)
        .one(state.db())
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(payload.name);
    active.description = Set(payload.description);
    active.price = Set(payload.price);
    active.stock = Set(payload.stock);
    active.category = Set(payload.category);
    active.image_url = Set(payload.image_url);
    active.updated_at = Set(Utc::now().into());

    let product = active.update(state.db()).await?;

    tracing::info!(product_id = %product.id, admin_id = %user.user_id, "product updated");

    Ok(ApiResponse::success(
        "Product updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Products::delete_by_id(id).exec(state.db()).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product not found".into()));
    }

    tracing::info!(product_id = %id, admin_id = %user.user_id, "product deleted");

    Ok(ApiResponse::success(
        "Product deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Upper bound on a unit price, in minor units.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

pub fn validate_product(payload: &ProductRequest) -> AppResult<()> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    if payload.category.trim().is_empty() {
        return Err(AppError::BadRequest("category is required".into()));
    }
    if payload.price <= 0 {
        return Err(AppError::BadRequest("price must be greater than 0".into()));
    }
    if payload.price > MAX_PRICE {
        return Err(AppError::BadRequest(format!(
            "price must not exceed {MAX_PRICE}"
        )));
    }
    if payload.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    Ok(())
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
