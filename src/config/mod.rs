//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, PORT override)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into the classifier, relay adapter and listener
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, resolve_port, ConfigError};
pub use schema::{
    AliasConfig, GatewayConfig, IsolationConfig, ListenerConfig, LogFormat, MountConfig,
    ObservabilityConfig, RelayBackend, RelayConfig, RelayPrefixConfig, DEFAULT_PORT,
};
