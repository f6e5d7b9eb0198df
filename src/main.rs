mod config;
mod error;
mod models;
mod renderer;
mod routes;
mod service_desk_client;
mod stats;
mod view;

use std::sync::Arc;

use config::Config;
use service_desk_client::ServiceDeskClient;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    client: Arc<ServiceDeskClient>,
    config: Arc<Config>,
}

fn router(state: AppState) -> axum::Router {
    let static_dir = state.config.static_dir.clone();

    axum::Router::new()
        .route("/", axum::routing::get(routes::root::root))
        .route("/api/data", axum::routing::get(routes::api::data))
        .route("/api/priority", axum::routing::get(routes::api::priority))
        .route("/api/issue-type", axum::routing::get(routes::api::issue_type))
        .route(
            "/api/average-high-issue-time",
            axum::routing::get(routes::api::average_high_issue_time),
        )
        .route("/api/max-score", axum::routing::get(routes::api::max_score))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// RUST_LOG wins when it parses; otherwise fall back to info.
fn log_filter(rust_log: Option<String>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .init();

    let config = Config::from_env()?;
    let bind_address = config.bind_address;
    info!(service_desk_url = %config.service_desk_url, "using service desk API");

    let state = AppState {
        client: Arc::new(ServiceDeskClient::new(config.service_desk_url.clone())),
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("listening on http://{}", bind_address);
    axum::serve(listener, router(state)).await?;

    Ok(())
}
