use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;

/// Page and limit arrive as raw strings so that non-numeric values fall back to the defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl Pagination {
    /// Returns `(page, limit, offset)`.
    pub fn normalize(&self) -> (u64, u64, u64) {
        let page = parse_positive(self.page.as_deref()).unwrap_or(1);
        let limit = parse_positive(self.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let offset = (page - 1).saturating_mul(limit);
        (page, limit, offset)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).filter(|v| *v > 0)
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    /// Case-insensitive substring of the product name.
    pub name: Option<String>,
    /// Exact category.
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<String>,
}

/// JSON body whose rejections are reported through [`AppError`].
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Invalid {what} ID")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination(page: Option<&str>, limit: Option<&str>) -> Pagination {
        Pagination {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        assert_eq!(pagination(None, None).normalize(), (1, 10, 0));
    }

    #[test]
    fn non_numeric_values_fall_back_to_defaults() {
        assert_eq!(pagination(Some("two"), Some("lots")).normalize(), (1, 10, 0));
        assert_eq!(pagination(Some("0"), Some("-5")).normalize(), (1, 10, 0));
    }

    #[test]
    fn computes_offset_and_caps_limit() {
        assert_eq!(pagination(Some("3"), Some("20")).normalize(), (3, 20, 40));
        assert_eq!(pagination(Some("1"), Some("1000")).normalize(), (1, 100, 0));
    }

    #[test]
    fn parses_ids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "order").unwrap(), id);
        let err = parse_id("12345", "order").unwrap_err();
        assert_eq!(err.to_string(), "Invalid order ID");
    }
}
