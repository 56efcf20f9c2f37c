mod common;

use axum::http::StatusCode;
use tokobiru_api::routes::create_app;
use tower::ServiceExt;

#[tokio::test]
async fn health_check_returns_ok() {
    let app = create_app(common::mock_state());

    let response = app
        .oneshot(common::request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = common::json_body(response).await;
    assert_eq!(body["message"], "Health check");
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = create_app(common::mock_state());

    let response = app
        .oneshot(common::request("GET", "/api/v1/nothing-here", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = common::json_body(response).await;
    assert_eq!(body["data"]["path"], "/api/v1/nothing-here");
}
