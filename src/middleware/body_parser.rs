//! JSON body parsing stage.
//!
//! Buffers JSON request bodies up to the configured limit and parses them
//! once. Malformed JSON is answered with a 400 here, so handlers only ever
//! see well-formed documents. The parsed document is kept in the request
//! extensions as [`JsonBody`] and the raw bytes are put back for extractors.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use shared::ErrorResponse;
use tracing::warn;

/// Parsed request body, present when the request carried a JSON document.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

/// State is the body limit in bytes.
pub async fn json_body_middleware(
    State(limit): State<usize>,
    request: Request,
    next: Next,
) -> Response {
    if !is_json_content_type(request.headers()) {
        return next.run(request).await;
    }

    let declared_length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_length.is_some_and(|len| len > limit) {
        return payload_too_large(limit);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %parts.uri.path(), error = %e, "⚠️ Request body could not be read");
            return payload_too_large(limit);
        }
    };

    if !bytes.is_empty() {
        match parse_json_document(&bytes) {
            Ok(document) => {
                parts.extensions.insert(JsonBody(document));
            }
            Err(message) => {
                warn!(path = %parts.uri.path(), "⚠️ Malformed JSON body: {}", message);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new("INVALID_JSON", message)),
                )
                    .into_response();
            }
        }
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Only objects and arrays are accepted at the top level.
fn parse_json_document(bytes: &[u8]) -> Result<Value, String> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| format!("Request body is not valid JSON: {}", e))?;

    match document {
        Value::Object(_) | Value::Array(_) => Ok(document),
        _ => Err("Request body must be a JSON object or array".to_string()),
    }
}

/// `application/json` and any `+json` media type.
fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

fn payload_too_large(limit: usize) -> Response {
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(ErrorResponse::new(
            "PAYLOAD_TOO_LARGE",
            format!("Request body exceeds the {} byte limit", limit),
        )),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::HeaderValue,
        middleware::from_fn_with_state,
        routing::post,
        Extension, Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    async fn echo_parsed(body: Option<Extension<JsonBody>>) -> Json<Value> {
        Json(match body {
            Some(Extension(JsonBody(document))) => json!({ "parsed": document }),
            None => json!({ "parsed": null }),
        })
    }

    fn echo_app(limit: usize) -> Router {
        Router::new()
            .route("/", post(echo_parsed))
            .layer(from_fn_with_state(limit, json_body_middleware))
    }

    async fn post_to(app: Router, content_type: &str, body: &'static str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    async fn response_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_parsed_document_reaches_the_handler() {
        let response = post_to(echo_app(1024), "application/json", r#"{"code":"04"}"#).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await["parsed"]["code"], "04");
    }

    #[tokio::test]
    async fn test_non_json_bodies_pass_through_unparsed() {
        let response = post_to(echo_app(1024), "text/plain", "{not json").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response_json(response).await["parsed"].is_null());
    }

    #[tokio::test]
    async fn test_body_over_the_limit_is_413() {
        let response = post_to(echo_app(8), "application/json", r#"{"code":"0004"}"#).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    fn headers_with(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_json_content_types() {
        assert!(is_json_content_type(&headers_with("application/json")));
        assert!(is_json_content_type(&headers_with("application/json; charset=utf-8")));
        assert!(is_json_content_type(&headers_with("Application/JSON")));
        assert!(is_json_content_type(&headers_with("application/merge-patch+json")));
        assert!(!is_json_content_type(&headers_with("text/plain")));
        assert!(!is_json_content_type(&HeaderMap::new()));
    }

    #[test]
    fn test_parse_accepts_objects_and_arrays() {
        assert!(parse_json_document(br#"{"code":"04"}"#).is_ok());
        assert!(parse_json_document(b"[1, 2]").is_ok());
    }

    #[test]
    fn test_parse_rejects_malformed_and_scalar_documents() {
        assert!(parse_json_document(b"{\"code\": ").is_err());
        assert!(parse_json_document(b"\"just a string\"").is_err());
        assert!(parse_json_document(b"42").is_err());
    }
}
