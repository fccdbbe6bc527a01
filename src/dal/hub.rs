use anyhow::{Context, Result, bail};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::OnceCell;

#[derive(Deserialize)]
struct WhoAmI {
    name: String,
}

/// Authenticated session against the model hub. Login happens on first use
/// and is retried on the next call if it fails.
pub struct HubSession {
    http: reqwest::Client,
    endpoint: String,
    token: Option<SecretString>,
    account: OnceCell<String>,
}

impl HubSession {
    pub fn new(token: Option<SecretString>, endpoint: impl Into<String>) -> Self {
        HubSession {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token,
            account: OnceCell::new(),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Logs in once and returns the account name. Without a token there is
    /// nothing to do and `None` is returned.
    pub async fn ensure_login(&self) -> Result<Option<&str>> {
        let Some(token) = &self.token else {
            return Ok(None);
        };
        let account = self.account
            .get_or_try_init(|| self.whoami(token))
            .await
            .context("[ensure_login] hub login err.")?;
        Ok(Some(account.as_str()))
    }

    async fn whoami(&self, token: &SecretString) -> Result<String> {
        let url = format!("{}/api/whoami-v2", self.endpoint.trim_end_matches('/'));
        let response = self.http
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .context("[whoami] send request err.")?;
        let status = response.status();
        if !status.is_success() {
            bail!("[whoami] token rejected. status = {}", status);
        }
        let who = response.json::<WhoAmI>().await
            .context("[whoami] decode response err.")?;
        tracing::info!("[whoami] logged in to hub. account = {}", who.name);
        Ok(who.name)
    }
}
