use std::sync::Arc;
use recommend_ops::config::ServiceConfig;
use recommend_ops::dal::extractor::HttpFeatureExtractor;
use recommend_ops::dal::hub::HubSession;
use recommend_ops::server::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = ServiceConfig::from_env()?;

    let hub = Arc::new(HubSession::new(config.hub_token.clone(), config.hub_endpoint.clone()));
    if !hub.has_token() {
        tracing::warn!("[main] HUGGINGFACE_TOKEN not found, hub login skipped");
    } else if let Err(e) = hub.ensure_login().await {
        // The embed handler retries the login on each request until it succeeds.
        tracing::warn!("[main] hub login err, will retry on first request. err = {:?}", e);
    }

    let state = AppState {
        hub,
        extractor: Arc::new(HttpFeatureExtractor::new(config.extractor_url.clone())),
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("[main] embedding service listening on {}", config.addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[main] listen for ctrl_c err. err = {}", e);
            }
        })
        .await?;
    tracing::info!("[main] embedding service stopped");
    Ok(())
}
