//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! discovery, engine, workers, remote pollers produce:
//!     → logging.rs (structured log events: console + rolling file)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log files under nacos_client.log_dir
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```

pub mod logging;
pub mod metrics;
