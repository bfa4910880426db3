mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{body_bytes, body_json, get, send, test_app};

const PROD_ORIGIN: &str = "https://app.example.com";

#[tokio::test]
async fn test_development_localhost_origin_is_echoed_with_credentials() {
    let app = test_app("development", "");
    let response = send(
        app,
        get("/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET, POST, PUT, DELETE, PATCH, OPTIONS"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Origin, X-Requested-With, Content-Type, Accept, Authorization, Cache-Control"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_EXPOSE_HEADERS], "Authorization, Content-Type");
    assert_eq!(headers[header::VARY], "Origin");
}

#[tokio::test]
async fn test_development_without_origin_gets_wildcard_and_no_credentials() {
    let app = test_app("development", "");
    let response = send(app, get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
        .is_none());
    assert_eq!(response.headers()[header::VARY], "Origin");
}

#[tokio::test]
async fn test_development_private_network_origin_is_admitted() {
    let app = test_app("development", "");
    let response = send(
        app,
        get("/health")
            .header(header::ORIGIN, "http://192.168.1.20:3000")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://192.168.1.20:3000"
    );
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_development_foreign_origin_gets_no_cors_headers() {
    let app = test_app("development", "");
    let response = send(
        app,
        get("/health")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    // The request itself still runs; the browser enforces the missing header.
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_production_origin_outside_allow_list_is_denied() {
    let app = test_app("production", PROD_ORIGIN);
    let response = send(
        app,
        get("/health")
            .header(header::ORIGIN, "http://203.0.113.5")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
        .is_none());
    assert_eq!(response.headers()[header::VARY], "Origin");
}

#[tokio::test]
async fn test_production_localhost_is_not_special() {
    let app = test_app("production", PROD_ORIGIN);
    let response = send(
        app,
        get("/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_production_allow_list_member_is_echoed() {
    let app = test_app("production", "https://admin.example.com, https://app.example.com");
    let response = send(
        app,
        get("/health")
            .header(header::ORIGIN, PROD_ORIGIN)
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], PROD_ORIGIN);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_production_without_origin_is_denied() {
    let app = test_app("production", PROD_ORIGIN);
    let response = send(app, get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_unknown_environment_name_behaves_like_production() {
    let app = test_app("staging", PROD_ORIGIN);
    let response = send(
        app,
        get("/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_preflight_is_answered_with_204_and_empty_body() {
    let app = test_app("development", "");
    let response = send(
        app,
        Request::builder()
            .method("OPTIONS")
            .uri("/api/v1/client")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    // Protected route, no token: the preflight never reaches the auth gate.
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_preflight_from_denied_origin_is_still_204() {
    let app = test_app("production", PROD_ORIGIN);
    let response = send(
        app,
        Request::builder()
            .method("OPTIONS")
            .uri("/api/v1/invoice")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert_eq!(response.headers()[header::VARY], "Origin");
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_preflight_on_unknown_path_is_204() {
    let app = test_app("development", "");
    let response = send(
        app,
        Request::builder()
            .method("OPTIONS")
            .uri("/does/not/exist")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_cors_test_reports_the_decision() {
    let app = test_app("development", "");
    let response = send(
        app,
        get("/cors-test")
            .header(header::ORIGIN, "http://127.0.0.1:8080")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["decision"], "allow_with_credentials");
    assert_eq!(body["origin"], "http://127.0.0.1:8080");
    assert_eq!(body["environment"], "development");
}

#[tokio::test]
async fn test_strict_cors_test_renders_cors_error() {
    let app = test_app("production", PROD_ORIGIN);
    let response = send(
        app,
        get("/cors-test?strict=true")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    let body = body_json(response).await;
    assert_eq!(body["error"], "CORS Error");
    assert_eq!(body["origin"], "https://evil.example");
    assert!(body["message"].as_str().unwrap().contains("https://evil.example"));
}

#[tokio::test]
async fn test_strict_cors_test_passes_allowed_origin() {
    let app = test_app("production", PROD_ORIGIN);
    let response = send(
        app,
        get("/cors-test?strict=true")
            .header(header::ORIGIN, PROD_ORIGIN)
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], PROD_ORIGIN);
}
