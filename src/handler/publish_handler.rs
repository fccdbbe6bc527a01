use std::path::PathBuf;
use std::sync::Arc;
use crate::artifact;
use crate::config::PublisherConfig;
use crate::dal::s3::ObjectStore;
use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// No file in the target directory follows the naming convention.
    NotFound,
    Published { source: PathBuf, bytes: u64 },
}

/// Copies the newest model to the canonical path and uploads it. `connect`
/// runs only once there is something to upload. Nothing is retried.
pub async fn publish_latest<F>(config: &PublisherConfig, connect: F) -> Result<PublishOutcome>
where
    F: FnOnce() -> Result<Arc<dyn ObjectStore>>,
{
    let Some(source) = artifact::find_latest(&config.target_dir).await
        .context("[publish_latest] find_latest err.")? else {
        tracing::warn!("[publish_latest] latest model not found. dir = {}", config.target_dir.display());
        return Ok(PublishOutcome::NotFound);
    };
    tracing::info!("[publish_latest] latest model = {}", source.display());

    let bytes = tokio::fs::copy(&source, &config.latest_model_path).await
        .with_context(|| format!(
            "[publish_latest] copy err. from = {}, to = {}",
            source.display(),
            config.latest_model_path.display()
        ))?;

    let store = connect().context("[publish_latest] connect object store err.")?;
    store.put_object(&config.s3_bucket, &config.s3_key, &config.latest_model_path).await
        .context("[publish_latest] put_object err.")?;
    tracing::info!(
        "[publish_latest] published. path = {}, bucket = {}, key = {}",
        config.latest_model_path.display(),
        config.s3_bucket,
        config.s3_key
    );
    Ok(PublishOutcome::Published { source, bytes })
}
