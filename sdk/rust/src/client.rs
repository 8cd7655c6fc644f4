use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

pub type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    pub url: String,
    pub alive: bool,
    pub current_connections: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    pub total_backends: usize,
    pub active_backends: usize,
    pub backends: Vec<BackendInfo>,
}

pub struct AdminClient {
    client: Client,
    admin_url: String,
}

impl AdminClient {
    pub fn new(admin_url: &str) -> Self {
        Self::with_client(admin_url, Client::new())
    }

    /// Use a preconfigured HTTP client (timeouts, proxy settings).
    pub fn with_client(admin_url: &str, client: Client) -> Self {
        Self {
            client,
            admin_url: admin_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the pool status.
    pub async fn status(&self) -> Result<PoolStatus, Error> {
        let resp = self.client
            .get(format!("{}/status", self.admin_url))
            .send()
            .await?;
        let resp = expect_success(resp).await?;
        Ok(resp.json::<PoolStatus>().await?)
    }

    /// Add a backend. The proxy probes it right away.
    pub async fn add_backend(&self, url: &str) -> Result<(), Error> {
        let resp = self.client
            .post(format!("{}/backends", self.admin_url))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;
        expect_success(resp).await?;
        Ok(())
    }

    /// Remove a backend. Returns false when it was not a member.
    pub async fn remove_backend(&self, url: &str) -> Result<bool, Error> {
        let resp = self.client
            .delete(format!("{}/backends", self.admin_url))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        expect_success(resp).await?;
        Ok(true)
    }
}

async fn expect_success(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(format!("Admin API returned error status {}: {}", status, text.trim()).into())
}
