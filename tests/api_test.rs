mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::test_state;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use movers_backend::routes::create_router;

async fn app() -> Router {
    create_router(test_state().await)
}

async fn send(app: &Router, method: Method, uri: &str, payload: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match payload {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_landing() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the Moving App API!");
}

#[tokio::test]
async fn test_register_and_login_over_http() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/register",
        Some(json!({
            "name": "Yaw",
            "phone": "0244333333",
            "email": "yaw@example.com",
            "password": "carry-boxes",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user_id"].is_i64());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({ "email": "yaw@example.com", "password": "carry-boxes" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({ "email": "yaw@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_errors_are_json() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/register",
        Some(json!({ "name": "Yaw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::POST, "/api/driver/accept-order/4242", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Booking not found");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/user/deposit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_search_over_http() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/user/search-drivers",
        Some(json!({ "pickup_location": "Osu", "dropoff_location": "Tema" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["distance"], 10.5);
    assert_eq!(body["price"], 52.5);
    assert!(body["drivers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unparsable_path_and_query_are_json_errors() {
    let app = app().await;

    let (status, body) = send(&app, Method::POST, "/api/driver/accept-order/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::GET, "/api/user/payments/12.5", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/user/support-tickets?user_id=abc",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_all_support_tickets_route() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/admin/all-support-tickets", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["tickets"].as_array().unwrap().is_empty());
}
