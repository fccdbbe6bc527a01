use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::json;

/// Computes and stores the multimodal embedding of a post.
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    async fn update_post_features(&self, post_id: &str) -> Result<()>;
}

/// Delegates feature computation to a remote extraction backend, which loads
/// the post's image and text, runs the encoder and persists the vector.
pub struct HttpFeatureExtractor {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFeatureExtractor {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpFeatureExtractor {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl FeatureExtractor for HttpFeatureExtractor {
    async fn update_post_features(&self, post_id: &str) -> Result<()> {
        let url = format!("{}/features", self.base_url.trim_end_matches('/'));
        let response = self.http
            .post(&url)
            .json(&json!({ "post_id": post_id }))
            .send()
            .await
            .with_context(|| format!("[update_post_features] send request err. url = {}", url))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("[update_post_features] extractor failed. post_id = {}, status = {}, body = {}", post_id, status, text);
        }
        Ok(())
    }
}
