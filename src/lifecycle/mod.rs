//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (sync::engine):
//!     Load bootstrap → Discover → Initial sync → Steady
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop change workers → Pollers see closed queues → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
