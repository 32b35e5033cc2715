//! Bootstrap configuration schema.
//!
//! This module defines the startup parameters of the engine. All types derive
//! Serde traits for deserialization from the bootstrap TOML file; every section
//! falls back to its `Default` so a minimal file only names what differs.

use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root bootstrap configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BootstrapConfig {
    /// What to mirror and where to mirror it.
    pub base_config: BaseConfig,

    /// Remote configuration service endpoint.
    pub nacos_server: NacosServer,

    /// Client-side settings for the remote service.
    pub nacos_client: NacosClient,

    /// Metrics exposition settings.
    pub observability: ObservabilityConfig,
}

impl BootstrapConfig {
    /// Negation of `nacos_client.not_load_cache_at_start`.
    ///
    /// Reported in logs only. Startup always reads from the remote service.
    pub fn load_cache_at_start(&self) -> bool {
        !self.nacos_client.not_load_cache_at_start
    }

    /// Request timeout for the remote service.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.nacos_client.timeout_ms)
    }

    /// Interval between change polls for a subscribed document.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.nacos_client.poll_interval_ms)
    }
}

/// Discovery and cache settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BaseConfig {
    /// Directory holding one cache file per document.
    pub cache_dir: String,

    /// Group whose documents are discovered.
    pub group: String,

    /// Optional document id filter applied during discovery.
    pub data_id: String,

    /// Matching mode for `data_id`.
    pub search_pattern: SearchMode,

    /// Number of ids requested per discovery page.
    pub page_size: NonZeroU32,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            cache_dir: "tmp/nacos/config".to_string(),
            group: "DEFAULT_GROUP".to_string(),
            data_id: String::new(),
            search_pattern: SearchMode::Accurate,
            page_size: NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN),
        }
    }
}

/// How the discovery filter is matched against document ids.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Exact id match; an empty filter matches every id in the group.
    #[default]
    Accurate,
    /// Fuzzy match, `*` acting as a wildcard.
    Blur,
}

impl SearchMode {
    /// Query-string value understood by the remote service.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Accurate => "accurate",
            SearchMode::Blur => "blur",
        }
    }

    /// Check whether `id` is selected by `filter` under this mode.
    pub fn matches(&self, filter: &str, id: &str) -> bool {
        if filter.is_empty() {
            return true;
        }
        match self {
            SearchMode::Accurate => filter == id,
            SearchMode::Blur => {
                // Substring match with `*` gaps, parts in order.
                let mut rest = id;
                for part in filter.split('*').filter(|p| !p.is_empty()) {
                    match rest.find(part) {
                        Some(pos) => rest = &rest[pos + part.len()..],
                        None => return false,
                    }
                }
                true
            }
        }
    }
}

/// Remote service endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NacosServer {
    /// Host name or IP address.
    pub ip_addr: String,

    /// Service port.
    pub port: u16,

    /// `http` or `https`.
    pub scheme: String,
}

impl Default for NacosServer {
    fn default() -> Self {
        Self {
            ip_addr: "127.0.0.1".to_string(),
            port: 8848,
            scheme: "http".to_string(),
        }
    }
}

/// Client-side settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NacosClient {
    /// Namespace (tenant) the group lives in. Empty means the public namespace.
    pub namespace_id: String,

    /// Timeout for every remote call in milliseconds.
    pub timeout_ms: u64,

    /// Accepted for compatibility with existing bootstrap files; has no
    /// effect, startup never reads the cache.
    pub not_load_cache_at_start: bool,

    /// Directory for rolling log files.
    pub log_dir: String,

    /// Accepted for compatibility with existing bootstrap files; unused.
    /// Document cache files live under `base_config.cache_dir`.
    pub cache_dir: String,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Interval between change polls in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for NacosClient {
    fn default() -> Self {
        Self {
            namespace_id: String::new(),
            timeout_ms: 5000,
            not_load_cache_at_start: false,
            log_dir: "tmp/nacos/log".to_string(),
            cache_dir: "tmp/nacos/cache".to_string(),
            log_level: "debug".to_string(),
            poll_interval_ms: 3000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
