use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware as axum_mw,
    routing::{delete, get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::clerk::ClerkClient;
use services::salesforce::{SalesforceClient, TokenCache};
use services::stripe_service::StripeClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub salesforce: SalesforceClient,
    pub stripe: StripeClient,
    pub clerk: ClerkClient,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        // One shared client; its timeout bounds every outbound gateway call.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        let salesforce =
            SalesforceClient::new(config.salesforce.clone(), http.clone(), TokenCache::new());
        let stripe = StripeClient::new(config.stripe.clone(), http.clone());
        let clerk = ClerkClient::new(config.clerk.clone(), http);

        Self {
            config: Arc::new(config),
            salesforce,
            stripe,
            clerk,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public signup surface: the saga endpoint plus the contact-creation
    // passthrough used before a visitor has any account.
    let salesforce_public = Router::new()
        .route("/membership", post(routes::membership::signup))
        .route("/contacts", post(routes::contacts::create_contact));

    // Record lookups and direct opportunity writes require a bearer token.
    let salesforce_protected = Router::new()
        .route("/contacts/:id", get(routes::contacts::get_contact))
        .route(
            "/contacts/email/:email",
            get(routes::contacts::get_contact_by_email),
        )
        .route(
            "/contacts/clerk/:clerkUserId",
            get(routes::contacts::get_contact_by_clerk_id),
        )
        .route(
            "/opportunities",
            post(routes::opportunities::create_opportunity),
        )
        .route(
            "/opportunities/:contactId",
            get(routes::opportunities::list_for_contact),
        )
        .layer(axum_mw::from_fn(middleware::auth::require_bearer));

    let stripe_routes = Router::new()
        .route(
            "/create-payment-intent",
            post(routes::payments::create_payment_intent),
        )
        .route(
            "/payment-intent/:id",
            get(routes::payments::get_payment_intent),
        )
        .route("/create-customer", post(routes::payments::create_customer));

    let clerk_routes = Router::new()
        .route("/users", post(routes::users::create_user))
        .route("/users/:userId", delete(routes::users::delete_user));

    Router::new()
        .nest(
            "/api/salesforce",
            salesforce_public.merge(salesforce_protected),
        )
        .nest("/api/stripe", stripe_routes)
        .nest("/api/clerk", clerk_routes)
        .route("/health", get(routes::health::health))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
