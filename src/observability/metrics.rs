//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_road_documents_synced_total` (counter): documents loaded at startup
//! - `config_road_notifications_total` (counter): change notifications by outcome
//! - `config_road_cache_write_failures_total` (counter)
//! - `config_road_subscription_failures_total` (counter)
//! - `config_road_discovery_pages_total` (counter): search pages requested
//! - `config_road_store_documents` (gauge): documents held in memory
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_document_synced() {
    metrics::counter!("config_road_documents_synced_total").increment(1);
}

/// `outcome` is `applied` or `cache_stale`.
pub fn record_notification(outcome: &'static str) {
    metrics::counter!("config_road_notifications_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_write_failure() {
    metrics::counter!("config_road_cache_write_failures_total").increment(1);
}

pub fn record_subscription_failure() {
    metrics::counter!("config_road_subscription_failures_total").increment(1);
}

pub fn record_discovery_page() {
    metrics::counter!("config_road_discovery_pages_total").increment(1);
}

pub fn record_store_size(size: usize) {
    metrics::gauge!("config_road_store_documents").set(size as f64);
}
