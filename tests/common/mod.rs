#![allow(dead_code)]

use axum::{
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use tokobiru_api::{config::AppConfig, state::AppState};

pub const TEST_SECRET: &str = "integration-secret";

pub fn test_config(database_url: &str) -> AppConfig {
    let database_url = database_url.to_string();
    AppConfig::from_lookup(move |key| match key {
        "DATABASE_URL" => Some(database_url.clone()),
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        _ => None,
    })
    .expect("test config")
}

pub fn mock_state() -> AppState {
    let orm = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    state_with(orm, "postgres://mock")
}

pub fn state_with(orm: DatabaseConnection, database_url: &str) -> AppState {
    AppState::new(orm, test_config(database_url), None)
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}
