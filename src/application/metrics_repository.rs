// Repository trait for metrics API access
use async_trait::async_trait;

#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Fetch the JSON body of one metrics endpoint, e.g. `capital_metrics`
    async fn fetch(&self, endpoint: &str) -> anyhow::Result<serde_json::Value>;
}
