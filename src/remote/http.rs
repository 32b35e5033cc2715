//! Nacos HTTP adapter.
//!
//! # Responsibilities
//! - Fetch documents and search groups over the v1 open API
//! - Apply the configured client timeout to every call
//! - Watch subscribed documents by polling and push changed content

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::config::BootstrapConfig;
use crate::document::{DocumentContent, DocumentId};
use crate::remote::source::{ChangeSink, RemoteSource};
use crate::remote::types::{RemoteError, RemoteResult, SearchPage, SearchQuery};
use crate::resilience::Backoff;

const CONFIGS_PATH: &str = "nacos/v1/cs/configs";

/// Upper bound of the poll backoff, as a multiple of the poll interval.
const MAX_BACKOFF_FACTOR: u32 = 16;

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Unavailable(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    total_count: u64,
    #[serde(default)]
    page_items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    data_id: String,
}

/// Remote source backed by a Nacos server.
#[derive(Clone)]
pub struct NacosHttpSource {
    client: reqwest::Client,
    configs_url: Url,
    namespace: String,
    poll_interval: Duration,
    /// (group, id) pairs with a live poller.
    watched: Arc<DashSet<(String, DocumentId)>>,
}

impl NacosHttpSource {
    /// Create an adapter using the server and timeout settings of `config`.
    pub fn new(config: &BootstrapConfig) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Self::with_client(config, client)
    }

    /// Create an adapter around a preconfigured HTTP client.
    pub fn with_client(config: &BootstrapConfig, client: reqwest::Client) -> RemoteResult<Self> {
        let server = &config.nacos_server;
        let base = format!("{}://{}:{}/", server.scheme, server.ip_addr, server.port);
        let configs_url = Url::parse(&base)
            .and_then(|url| url.join(CONFIGS_PATH))
            .map_err(|e| RemoteError::Unavailable(format!("invalid server address '{}': {}", base, e)))?;

        tracing::debug!(
            url = %configs_url,
            namespace = %config.nacos_client.namespace_id,
            timeout_ms = config.nacos_client.timeout_ms,
            load_cache_at_start = config.load_cache_at_start(),
            "Nacos HTTP source created"
        );

        Ok(Self {
            client,
            configs_url,
            namespace: config.nacos_client.namespace_id.clone(),
            poll_interval: config.poll_interval(),
            watched: Arc::new(DashSet::new()),
        })
    }

    /// Number of documents currently being polled.
    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    async fn get_config(&self, id: &DocumentId, group: &str) -> RemoteResult<DocumentContent> {
        let response = self
            .client
            .get(self.configs_url.clone())
            .query(&[
                ("dataId", id.as_str()),
                ("group", group),
                ("tenant", self.namespace.as_str()),
            ])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(DocumentContent::from(&response.bytes().await?[..])),
            StatusCode::NOT_FOUND => Err(RemoteError::not_found(id, group)),
            status => Err(RemoteError::Unavailable(format!(
                "unexpected status {} fetching '{}'",
                status, id
            ))),
        }
    }

    async fn poll_changes(self, group: String, sink: ChangeSink) {
        let id = sink.id().clone();
        let mut backoff = Backoff::new(
            self.poll_interval,
            self.poll_interval.saturating_mul(MAX_BACKOFF_FACTOR),
        );
        let mut last: Option<DocumentContent> = None;
        let mut delay = Duration::ZERO;

        tracing::debug!(id = %id, group = %group, "Change poller started");

        loop {
            tokio::select! {
                _ = sink.closed() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            match self.get_config(&id, &group).await {
                Ok(content) => {
                    backoff.reset();
                    delay = self.poll_interval;
                    // The first poll is always delivered; it covers changes
                    // made between the initial fetch and this subscription.
                    if last.as_ref() != Some(&content) {
                        last = Some(content.clone());
                        if sink.notify(content).is_err() {
                            break;
                        }
                    }
                }
                Err(RemoteError::NotFound { .. }) => {
                    tracing::debug!(id = %id, group = %group, "Watched document missing on remote");
                    delay = self.poll_interval;
                }
                Err(e) => {
                    delay = backoff.next_delay();
                    tracing::warn!(
                        id = %id,
                        group = %group,
                        error = %e,
                        failures = backoff.attempts(),
                        retry_in_ms = delay.as_millis() as u64,
                        "Change poll failed"
                    );
                }
            }
        }

        self.watched.remove(&(group.clone(), id.clone()));
        tracing::debug!(id = %id, group = %group, "Change poller stopped");
    }
}

impl RemoteSource for NacosHttpSource {
    async fn fetch(&self, id: &DocumentId, group: &str) -> RemoteResult<DocumentContent> {
        self.get_config(id, group).await
    }

    async fn search(&self, group: &str, query: &SearchQuery) -> RemoteResult<SearchPage> {
        let page_no = query.page_no.to_string();
        let page_size = query.page_size.get().to_string();

        let response = self
            .client
            .get(self.configs_url.clone())
            .query(&[
                ("search", query.mode.as_str()),
                ("dataId", query.filter.as_str()),
                ("group", group),
                ("tenant", self.namespace.as_str()),
                ("pageNo", page_no.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Unavailable(format!(
                "unexpected status {} searching group '{}'",
                status, group
            )));
        }

        let body: SearchResponse = response.json().await?;
        Ok(SearchPage {
            items: body
                .page_items
                .into_iter()
                .map(|item| DocumentId::from(item.data_id))
                .collect(),
            total_count: body.total_count,
        })
    }

    async fn subscribe(&self, id: &DocumentId, group: &str, sink: ChangeSink) -> RemoteResult<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RemoteError::subscription_failed(id, e.to_string()))?;

        if !self.watched.insert((group.to_string(), id.clone())) {
            return Err(RemoteError::subscription_failed(id, "already subscribed"));
        }

        let source = self.clone();
        runtime.spawn(source.poll_changes(group.to_string(), sink));
        Ok(())
    }
}

impl std::fmt::Debug for NacosHttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NacosHttpSource")
            .field("configs_url", &self.configs_url.as_str())
            .field("namespace", &self.namespace)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configs_url() {
        let mut config = BootstrapConfig::default();
        config.nacos_server.ip_addr = "10.1.2.3".into();
        config.nacos_server.port = 8848;

        let source = NacosHttpSource::new(&config).unwrap();
        assert_eq!(source.configs_url.as_str(), "http://10.1.2.3:8848/nacos/v1/cs/configs");
    }

    #[test]
    fn test_invalid_address_rejected() {
        let mut config = BootstrapConfig::default();
        config.nacos_server.ip_addr = "bad host".into();
        assert!(matches!(
            NacosHttpSource::new(&config),
            Err(RemoteError::Unavailable(_))
        ));
    }

    #[test]
    fn test_search_response_decoding() {
        let body = r#"{
            "totalCount": 3,
            "pageNumber": 1,
            "pagesAvailable": 2,
            "pageItems": [
                {"id": "1", "dataId": "a", "group": "app", "content": "x=1"},
                {"id": "2", "dataId": "b", "group": "app", "content": "x=2"}
            ]
        }"#;
        let decoded: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(decoded.total_count, 3);
        let ids: Vec<_> = decoded.page_items.iter().map(|i| i.data_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
