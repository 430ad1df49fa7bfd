// Metrics API repository implementation
use crate::application::metrics_repository::MetricsRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiRepository {
    base_url: String,
    client: reqwest::Client,
}

impl ApiRepository {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

#[async_trait]
impl MetricsRepository for ApiRepository {
    async fn fetch(&self, endpoint: &str) -> Result<serde_json::Value> {
        let url = self.endpoint_url(endpoint);
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Metrics API request to {} failed with status {}: {}", url, status, body);
        }

        response
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_single_slash() {
        let repo = ApiRepository::new("https://api.example.org/".to_string(), Duration::from_secs(5)).unwrap();
        assert_eq!(repo.endpoint_url("capital_metrics"), "https://api.example.org/capital_metrics");
        assert_eq!(repo.endpoint_url("/code_metrics"), "https://api.example.org/code_metrics");
    }
}
