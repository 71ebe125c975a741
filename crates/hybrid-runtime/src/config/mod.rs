//! Configuration for Hybrid agents.
//!
//! Layered TOML (or YAML) files plus `HYBRID_*` environment variables,
//! loaded with figment and checked by [`validate_config`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    AgentConfig, ForwarderConfig, HybridConfig, LogFormat, LogOutput, LoggingConfig,
    ServerConfig, SpanEventConfig,
};
pub use validation::validate_config;
