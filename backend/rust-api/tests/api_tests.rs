use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::{engine::general_purpose, Engine as _};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use anchor_lms_api::config::{Config, ObjectStorageSettings};
use anchor_lms_api::middlewares::auth::{JwtClaims, JwtService};
use anchor_lms_api::{create_router, AppState};

const TEST_JWT_SECRET: &str = "test-secret";

/// App wired to collaborators that are not actually reachable. The mongo
/// driver connects lazily, so routes fail only when a handler queries it.
async fn test_app() -> axum::Router {
    let config = Config {
        bind_addr: "127.0.0.1:0".to_string(),
        mongo_uri: "mongodb://127.0.0.1:9".to_string(),
        mongo_database: "anchor_lms_test".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        storage: ObjectStorageSettings {
            bucket: "anchor-lms".into(),
            region: "ru-central1".into(),
            endpoint: Some("https://127.0.0.1:9".into()),
            access_key: "key".into(),
            secret_key: "secret".into(),
            certificates_prefix: "certificates".into(),
            template_key: "templates/anchor-certificate-template.pdf".into(),
        },
    };

    let mongo_client =
        mongodb::Client::with_uri_str("mongodb://127.0.0.1:9/?serverSelectionTimeoutMS=300")
            .await
            .unwrap();

    let state = Arc::new(AppState::new(config, mongo_client).unwrap());
    create_router(state)
}

fn bearer_token() -> String {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = JwtClaims {
        sub: "user-1".to_string(),
        email: Some("learner@example.com".to_string()),
        role: "learner".to_string(),
        iat: now,
        exp: now + 3600,
    };
    JwtService::new(TEST_JWT_SECRET)
        .generate_token(claims)
        .unwrap()
}

#[tokio::test]
async fn learner_routes_require_a_token() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/certificates")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_tokens_are_rejected() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/certificates")
                .header("authorization", "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_tokens_reach_the_handler() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/lessons/lesson-1/quiz")
                .header("authorization", format!("Bearer {}", bearer_token()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // Past auth; the handler then fails on the unreachable datastore.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn metrics_require_basic_auth() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn metrics_render_with_default_credentials() {
    let app = test_app().await;
    let credentials = general_purpose::STANDARD.encode("admin:changeme");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .header("authorization", format!("Basic {}", credentials))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_reports_degraded_without_a_datastore() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["status"], "degraded");
    assert_eq!(payload["service"], "anchor-lms-api");
}
