use super::{MedicationRecord, PharmacyRecord};
use anyhow::{Result, anyhow};
use std::time::Duration;

/// The backend search endpoints consumed by the core. Both operations are
/// idempotent reads; retries, if any, belong to the implementation.
#[async_trait::async_trait]
pub trait SearchGateway: Send + Sync {
  /// Human-readable name of the backend.
  fn name(&self) -> &str;

  /// Free-text pharmacy search. An empty query means "match all" on the
  /// backend side.
  async fn search_pharmacies(&self, query: &str) -> Result<Vec<PharmacyRecord>>;

  /// Free-text medication search.
  async fn search_medications(&self, query: &str) -> Result<Vec<MedicationRecord>>;
}

/// REST gateway against the pharmacy-locator backend.
pub struct HttpGateway {
  base_url: String,
  client: surf::Client,
}

impl HttpGateway {
  #[must_use]
  pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
    let client: surf::Client = surf::Config::new()
      .set_timeout(Some(timeout))
      .try_into()
      .expect("client");
    Self {
      base_url: base_url.into(),
      client,
    }
  }

  async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
    self
      .client
      .get(url)
      .header("User-Agent", "pharmseek/0.1 (search core)")
      .recv_json::<T>()
      .await
      .map_err(|e| anyhow!("request to {url} failed: {e}"))
  }
}

#[async_trait::async_trait]
impl SearchGateway for HttpGateway {
  fn name(&self) -> &str {
    "pharmacy-locator backend"
  }

  async fn search_pharmacies(&self, query: &str) -> Result<Vec<PharmacyRecord>> {
    let url = format!(
      "{}/pharmacies/search?pharmacy={}",
      self.base_url,
      urlencoding::encode(query)
    );
    self
      .get_json(&url)
      .await
      .inspect_err(|e| log::warn!("pharmacy search failed: {e}"))
  }

  async fn search_medications(&self, query: &str) -> Result<Vec<MedicationRecord>> {
    let url = format!(
      "{}/medications/search?medication={}",
      self.base_url,
      urlencoding::encode(query)
    );
    self
      .get_json(&url)
      .await
      .inspect_err(|e| log::warn!("medication search failed: {e}"))
  }
}
