// HTTP-level tests using tower::ServiceExt::oneshot to exercise the full
// Axum router without starting a real TCP server.
//
// No external credentials are configured, so any handler that would reach a
// gateway fails with a configuration error before network I/O; the paths
// under test here (validation, auth format checks, health) resolve entirely
// in-process.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use trailkeepers_api::config::{
    ClerkConfig, Config, MembershipConfig, SalesforceConfig, StripeConfig,
};
use trailkeepers_api::{build_router, AppState};

fn test_router() -> Router {
    let config = Config {
        port: 0,
        cors_origins: vec![],
        http_timeout_secs: 5,
        salesforce: SalesforceConfig {
            login_url: "https://login.salesforce.com".into(),
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            api_version: "v59.0".into(),
        },
        stripe: StripeConfig {
            secret_key: String::new(),
            currency: "usd".into(),
            ledger_retries: 5,
            ledger_retry_delay_ms: 0,
        },
        clerk: ClerkConfig {
            secret_key: String::new(),
            api_url: "https://api.clerk.com/v1".into(),
        },
        membership: MembershipConfig {
            utc_offset_hours: -8,
        },
    };
    build_router(AppState::from_config(config))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = test_router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn signup_with_missing_level_is_rejected_before_any_gateway_call() {
    let request = post_json(
        "/api/salesforce/membership",
        json!({
            "firstName": "John",
            "lastName": "Doe",
            "email": "john@example.com",
            "emailOptIn": true
        }),
    );
    let response = test_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Missing required fields: membershipLevel, membershipTerm"
    );
    assert_eq!(body.get("stage"), None);
}

#[tokio::test]
async fn signup_with_missing_names_reports_the_first_validation_error() {
    let request = post_json(
        "/api/salesforce/membership",
        json!({ "membershipLevel": "gold", "membershipTerm": "monthly" }),
    );
    let response = test_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Missing required fields: firstName, lastName, email"
    );
}

#[tokio::test]
async fn signup_rejects_non_boolean_opt_in() {
    let request = post_json(
        "/api/salesforce/membership",
        json!({
            "firstName": "John",
            "lastName": "Doe",
            "email": "john@example.com",
            "emailOptIn": "yes",
            "membershipLevel": "silver",
            "membershipTerm": "annual"
        }),
    );
    let response = test_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "emailOptIn must be a boolean");
}

#[tokio::test]
async fn signup_rejects_unknown_level() {
    let request = post_json(
        "/api/salesforce/membership",
        json!({
            "firstName": "John",
            "lastName": "Doe",
            "email": "john@example.com",
            "emailOptIn": false,
            "membershipLevel": "platinum",
            "membershipTerm": "annual"
        }),
    );
    let response = test_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Invalid membershipLevel"), "{message}");
}

#[tokio::test]
async fn record_lookups_require_a_bearer_token() {
    for uri in [
        "/api/salesforce/contacts/003TEST",
        "/api/salesforce/contacts/email/john@example.com",
        "/api/salesforce/contacts/clerk/user_123",
        "/api/salesforce/opportunities/003TEST",
    ] {
        let response = test_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["error"], "Authentication required");
    }
}

#[tokio::test]
async fn wrong_auth_scheme_is_rejected() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/api/salesforce/contacts/003TEST")
                .header(header::AUTHORIZATION, "Basic am9objpkb2U=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bearer_format_passes_the_auth_layer() {
    // With no CRM secrets configured the handler fails on first use of the
    // gateway, proving the request cleared auth and reached it.
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/api/salesforce/contacts/003TEST")
                .header(header::AUTHORIZATION, "Bearer sess_abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(
        message.starts_with("Missing Salesforce configuration"),
        "{message}"
    );
}

#[tokio::test]
async fn stripe_passthrough_reports_missing_configuration() {
    let request = post_json(
        "/api/stripe/create-payment-intent",
        json!({ "amount": 100.0, "email": "john@example.com" }),
    );
    let response = test_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Missing Stripe configuration: STRIPE_SECRET_KEY"
    );
}

#[tokio::test]
async fn clerk_passthrough_reports_missing_configuration() {
    let request = post_json(
        "/api/clerk/users",
        json!({ "email": "john@example.com", "firstName": "John", "lastName": "Doe" }),
    );
    let response = test_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing Clerk configuration: CLERK_SECRET_KEY");
}
