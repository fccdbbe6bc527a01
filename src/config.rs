use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use anyhow::{Context, Result, bail};
use secrecy::SecretString;

pub const DEFAULT_SERVICE_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_HUB_ENDPOINT: &str = "https://huggingface.co";
pub const DEFAULT_EXTRACTOR_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_TARGET_DIR: &str = "model";
pub const DEFAULT_S3_KEY: &str = "latest.model";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Settings for the embedding trigger service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    pub hub_token: Option<SecretString>,
    pub hub_endpoint: String,
    pub extractor_url: String,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let addr = env_or("EMBED_SERVICE_ADDR", DEFAULT_SERVICE_ADDR)
            .parse::<SocketAddr>()
            .context("[ServiceConfig::from_env] parse EMBED_SERVICE_ADDR err.")?;
        Ok(ServiceConfig {
            addr,
            hub_token: env_opt("HUGGINGFACE_TOKEN").map(SecretString::new),
            hub_endpoint: env_or("HF_ENDPOINT", DEFAULT_HUB_ENDPOINT),
            extractor_url: env_or("FEATURE_EXTRACTOR_URL", DEFAULT_EXTRACTOR_URL),
        })
    }
}

/// Settings for the latest-model publisher.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub target_dir: PathBuf,
    pub latest_model_path: PathBuf,
    pub s3_bucket: String,
    pub s3_key: String,
}

impl PublisherConfig {
    pub fn from_env() -> Result<Self> {
        let target_dir = PathBuf::from(env_or("TARGET_DIR", DEFAULT_TARGET_DIR));
        let latest_model_path = env_opt("LATEST_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| target_dir.join("latest.model"));
        let Some(s3_bucket) = env_opt("S3_BUCKET") else {
            bail!("[PublisherConfig::from_env] S3_BUCKET is not set");
        };
        Ok(PublisherConfig {
            target_dir,
            latest_model_path,
            s3_bucket,
            s3_key: env_or("S3_KEY", DEFAULT_S3_KEY),
        })
    }
}

/// Connection settings for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
}

impl S3Config {
    pub fn from_env() -> Result<Self> {
        let region = env_opt("AWS_REGION")
            .or_else(|| env_opt("AWS_DEFAULT_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let Some(access_key_id) = env_opt("AWS_ACCESS_KEY_ID") else {
            bail!("[S3Config::from_env] AWS_ACCESS_KEY_ID is not set");
        };
        let Some(secret_access_key) = env_opt("AWS_SECRET_ACCESS_KEY") else {
            bail!("[S3Config::from_env] AWS_SECRET_ACCESS_KEY is not set");
        };
        Ok(S3Config {
            region,
            endpoint: env_opt("S3_ENDPOINT"),
            access_key_id,
            secret_access_key: SecretString::new(secret_access_key),
            session_token: env_opt("AWS_SESSION_TOKEN").map(SecretString::new),
        })
    }
}

// Empty values count as unset, same as a missing variable.
fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}
