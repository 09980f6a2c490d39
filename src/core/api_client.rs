/// HTTP client for the gateway API, used by the dashboard and one-shot commands

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::core::snapshot::SystemSnapshot;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `GET /instances`
    pub async fn list_instances(&self) -> Result<Vec<String>> {
        let url = self.endpoint("instances");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        read_json(response).await
    }

    /// `GET /system[?instance=...]`
    pub async fn system(&self, instance: Option<&str>) -> Result<SystemSnapshot> {
        let url = self.endpoint("system");
        let mut request = self.client.get(&url);
        if let Some(instance) = instance {
            request = request.query(&[("instance", instance)]);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await.context("Failed to read response body")?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { error, detail: Some(detail) }) => {
                anyhow!("HTTP {}: {} ({})", status.as_u16(), error, detail)
            }
            Ok(ErrorBody { error, detail: None }) => anyhow!("HTTP {}: {}", status.as_u16(), error),
            Err(_) => anyhow!("HTTP {}: {}", status.as_u16(), body.trim()),
        });
    }

    serde_json::from_str(&body).context("Invalid JSON response from gateway")
}
