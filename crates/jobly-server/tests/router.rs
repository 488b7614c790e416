//! Router tests that never reach the database.
//!
//! The pool points at a closed port, so anything that gets past input
//! checks and authentication ends in a 500.

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use jobly_server::auth::{Claims, TokenKey};
use jobly_server::{AppState, app};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &[u8] = b"router-test-secret";

fn state() -> AppState {
    let pool = jobly::create_pool_with_config("postgres://jobly@127.0.0.1:1/jobly", 1).unwrap();
    AppState::new(pool, TokenKey::new(SECRET).unwrap(), 200)
}

fn token(is_admin: bool) -> String {
    TokenKey::new(SECRET)
        .unwrap()
        .sign(&Claims {
            username: "u1".into(),
            is_admin,
        })
        .unwrap()
}

async fn send(req: Request<Body>) -> (StatusCode, Value) {
    let response = app(state()).oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_body(method: &str, uri: &str, auth: Option<String>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(t) = auth {
        builder = builder.header(AUTHORIZATION, format!("Bearer {t}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn assert_error(status: StatusCode, body: &Value, expected: StatusCode) {
    assert_eq!(status, expected, "body: {body}");
    assert_eq!(body["error"]["status"], expected.as_u16());
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, body) = send(get("/no-such-thing")).await;
    assert_error(status, &body, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_company_requires_a_token() {
    let company = json!({ "handle": "c1", "name": "C1", "description": "d" });
    let (status, body) = send(with_body("POST", "/companies", None, company)).await;
    assert_error(status, &body, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Authentication required");
}

#[tokio::test]
async fn create_company_requires_admin() {
    let company = json!({ "handle": "c1", "name": "C1", "description": "d" });
    let (status, body) = send(with_body("POST", "/companies", Some(token(false)), company)).await;
    assert_error(status, &body, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Admin privileges required");
}

#[tokio::test]
async fn foreign_signature_is_rejected() {
    let forged = TokenKey::new(b"some-other-secret")
        .unwrap()
        .sign(&Claims {
            username: "mallory".into(),
            is_admin: true,
        })
        .unwrap();
    let req = Request::builder()
        .method("DELETE")
        .uri("/jobs/1")
        .header(AUTHORIZATION, format!("Bearer {forged}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(req).await;
    assert_error(status, &body, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_without_token_is_401() {
    let req = Request::builder()
        .method("DELETE")
        .uri("/companies/c1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(req).await;
    assert_error(status, &body, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_company_body_is_400() {
    let company = json!({
        "handle": "Not A Handle",
        "name": "",
        "description": "d",
        "numEmployees": -3,
    });
    let (status, body) = send(with_body("POST", "/companies", Some(token(true)), company)).await;
    assert_error(status, &body, StatusCode::BAD_REQUEST);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("handle"), "{message}");
    assert!(message.contains("numEmployees"), "{message}");
}

#[tokio::test]
async fn unknown_body_field_is_400() {
    let company = json!({ "handle": "c1", "name": "C1", "description": "d", "ceo": "x" });
    let (status, body) = send(with_body("POST", "/companies", Some(token(true)), company)).await;
    assert_error(status, &body, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn job_patch_cannot_change_company() {
    let patch = json!({ "companyHandle": "other" });
    let (status, body) = send(with_body("PATCH", "/jobs/1", Some(token(true)), patch)).await;
    assert_error(status, &body, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_equity_is_400() {
    let job = json!({ "title": "J", "salary": 1, "equity": 1.5, "companyHandle": "c1" });
    let (status, body) = send(with_body("POST", "/jobs", Some(token(true)), job)).await;
    assert_error(status, &body, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_filters_are_400() {
    for uri in [
        "/companies?minEmployees=abc",
        "/companies?minEmployees=10&maxEmployees=5",
        "/companies?ceo=x",
        "/jobs?hasEquity=yes",
        "/jobs?minSalary=1.5",
        "/jobs?equity=true",
    ] {
        let (status, body) = send(get(uri)).await;
        assert_error(status, &body, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn non_numeric_job_id_is_400() {
    let (status, body) = send(get("/jobs/abc")).await;
    assert_error(status, &body, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn database_failure_is_an_opaque_500() {
    let (status, body) = send(get("/companies?minEmployees=1")).await;
    assert_error(status, &body, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "Internal Server Error");
}
