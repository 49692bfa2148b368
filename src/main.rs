use trailkeepers_api::{build_router, config::Config, AppState};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .json()
        .init();

    let port = config.port;
    let state = AppState::from_config(config);
    let router = build_router(state);

    tracing::info!("Trailkeepers membership API listening on port {port}");

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("failed to bind listener");
    axum::serve(listener, router).await.expect("server error");
}
