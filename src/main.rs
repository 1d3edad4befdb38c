use axum::{routing::get, Router};
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{trace::TraceLayer, cors::{Any, CorsLayer}};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod certificate;
mod client;
mod config;
mod dashboard;
mod dialog;
mod eligibility;
mod models;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "mitx_enrollment=info,axum=info".into())
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::AppConfig::from_env()?;
    let client = client::MitxOnlineClient::new(&config)?;
    tracing::info!(api_base = %config.api_base, cart_url = %config.cart_url, "upstream configured");

    let port = config.port;
    let state = routes::AppState { config: Arc::new(config), client };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(routes::router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
