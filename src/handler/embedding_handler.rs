use crate::dal::extractor::FeatureExtractor;
use crate::dal::hub::HubSession;
use anyhow::{Context, Result};

pub async fn handle_embedding_request(
    hub: &HubSession,
    extractor: &dyn FeatureExtractor,
    post_id: &str,
) -> Result<()> {
    let result: Result<()> = async {
        hub.ensure_login().await
            .context("[handle_embedding_request] ensure_login err.")?;
        extractor.update_post_features(post_id).await
            .context("[handle_embedding_request] update_post_features err.")
    }.await;
    match result {
        Ok(()) => {
            tracing::info!("[handle_embedding_request] Embedding vector calculation completed successfully. post_id = {}", post_id);
            Ok(())
        }
        Err(e) => {
            tracing::error!("[handle_embedding_request] Embedding vector calculation failed. post_id = {}, err = {:?}", post_id, e);
            Err(e)
        }
    }
}
