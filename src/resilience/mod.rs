//! Resilience helpers.
//!
//! # Design Decisions
//! - Every remote call carries the client timeout from the bootstrap file
//! - Background polling backs off exponentially with jitter on failure
//! - Startup never retries: a failed initial load is reported to the caller

pub mod backoff;

pub use backoff::Backoff;
