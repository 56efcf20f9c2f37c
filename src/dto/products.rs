use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

/// Body for both create and full-overwrite update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductRequest {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub category: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
