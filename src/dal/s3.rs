use std::path::Path;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HOST};
use reqwest::{Body, Url};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use crate::config::S3Config;
use crate::dal::signing::{self, SigningParams};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Replaces `bucket/key` with the contents of the file at `path`.
    async fn put_object(&self, bucket: &str, key: &str, path: &Path) -> Result<()>;
}

pub struct S3Client {
    http: reqwest::Client,
    config: S3Config,
}

impl S3Client {
    pub fn new(config: S3Config) -> Self {
        S3Client {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> Result<Url> {
        let key = signing::encode_key(key.trim_start_matches('/'));
        let raw = match &self.config.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.config.region, key),
        };
        Url::parse(&raw).with_context(|| format!("[object_url] parse url err. url = {}", raw))
    }
}

const HASH_CHUNK: usize = 64 * 1024;

// SigV4 needs the payload digest up front, so the file is read twice:
// once here in chunks, once more as the streamed request body.
async fn sha256_file(path: &Path) -> Result<(String, u64)> {
    let mut file = tokio::fs::File::open(path).await
        .with_context(|| format!("[sha256_file] open err. path = {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buf).await
            .with_context(|| format!("[sha256_file] read err. path = {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((hex::encode(hasher.finalize()), size))
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let (payload_hash, size) = sha256_file(path).await
            .context("[put_object] sha256_file err.")?;
        let url = self.object_url(bucket, key)?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => bail!("[put_object] url has no host. url = {}", url),
        };

        let timestamp = OffsetDateTime::now_utc();
        let mut headers = vec![
            ("host", host),
            ("x-amz-content-sha256", payload_hash.clone()),
            ("x-amz-date", signing::format_amz_date(timestamp)),
        ];
        if let Some(token) = &self.config.session_token {
            headers.push(("x-amz-security-token", token.expose_secret().clone()));
        }
        let params = SigningParams {
            access_key_id: &self.config.access_key_id,
            secret_access_key: self.config.secret_access_key.expose_secret(),
            region: &self.config.region,
            timestamp,
        };
        let auth = signing::authorization(&params, "PUT", url.path(), &headers, &payload_hash);

        let file = tokio::fs::File::open(path).await
            .with_context(|| format!("[put_object] open file err. path = {}", path.display()))?;
        let mut request = self.http
            .put(url.clone())
            .header(AUTHORIZATION, auth)
            .header(CONTENT_LENGTH, size)
            .body(Body::wrap_stream(ReaderStream::new(file)));
        for (name, value) in headers.iter().filter(|(name, _)| *name != HOST.as_str()) {
            request = request.header(*name, value);
        }
        let response = request.send().await
            .with_context(|| format!("[put_object] send request err. url = {}", url))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("[put_object] s3 rejected upload. status = {}, body = {}", status, text);
        }
        tracing::info!("[put_object] uploaded. bucket = {}, key = {}, bytes = {}", bucket, key, size);
        Ok(())
    }
}
