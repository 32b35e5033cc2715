//! Bootstrap configuration subsystem.
//!
//! # Data Flow
//! ```text
//! bootstrap file (TOML)
//!     → loader.rs (parse & deserialize, defaults for missing keys)
//!     → validation.rs (semantic checks)
//!     → BootstrapConfig (validated, immutable)
//!     → shared via Arc with the engine and the remote adapter
//! ```
//!
//! # Design Decisions
//! - Loaded once at startup; there is no reload path
//! - All fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{BaseConfig, BootstrapConfig, NacosClient, NacosServer, ObservabilityConfig, SearchMode};
pub use validation::ValidationError;
