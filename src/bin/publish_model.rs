use std::sync::Arc;
use recommend_ops::config::{PublisherConfig, S3Config};
use recommend_ops::dal::s3::{ObjectStore, S3Client};
use recommend_ops::handler::publish_handler::{publish_latest, PublishOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = PublisherConfig::from_env()?;
    let connect = || -> anyhow::Result<Arc<dyn ObjectStore>> {
        Ok(Arc::new(S3Client::new(S3Config::from_env()?)))
    };

    match publish_latest(&config, connect).await? {
        PublishOutcome::NotFound => {}
        PublishOutcome::Published { source, bytes } => {
            tracing::info!("[main] done. source = {}, bytes = {}", source.display(), bytes);
        }
    }
    Ok(())
}
