//! Configuration loader using figment.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. Programmatic merges ([`ConfigLoader::merge`])
//! 3. Profile-specific file (`hybrid.{profile}.toml`)
//! 4. Main file (`hybrid.toml`)
//! 5. Environment variables (`HYBRID_*`)
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: `hybrid.toml` files
//! - `yaml-config`: `hybrid.yaml` / `hybrid.yml` files
//!
//! # Environment Variable Mapping
//!
//! The `HYBRID_` prefix is stripped and `__` separates nesting levels:
//!
//! - `HYBRID_SERVER__PORT=9000` → `server.port = 9000`
//! - `HYBRID_FORWARDER__API_KEY=xxx` → `forwarder.api_key = "xxx"`
//! - `HYBRID_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! The profile is taken from `HYBRID_PROFILE` unless set explicitly.
//!
//! # Example
//!
//! ```rust,ignore
//! use hybrid_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().profile("production").load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::HybridConfig;
use super::validation::validate_config;

const ENV_PREFIX: &str = "HYBRID_";
const PROFILE_VAR: &str = "HYBRID_PROFILE";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name; `dev` and `prod` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `HYBRID_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multi-source configuration loader.
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a directory to search for configuration files.
    ///
    /// Without explicit search paths the current directory and the user
    /// config directory (`~/.config/hybrid` on Linux) are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration values programmatically, above the defaults.
    pub fn merge(mut self, config: HybridConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads the configuration without validating it.
    pub fn load(self) -> ConfigResult<HybridConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: HybridConfig = figment.extract()?;

        debug!(
            profile = %profile,
            agent = %config.agent.name,
            logging_level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Loads the configuration and runs [`validate_config`] on it.
    pub fn load_validated(self) -> ConfigResult<HybridConfig> {
        let config = self.load()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(HybridConfig::default()));
        figment = figment.merge(std::mem::take(&mut self.figment));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["PROFILE"]).split("__"));
        }

        Ok(figment)
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("hybrid"));
        }
        paths
    }

    /// Searches every path for `hybrid.<ext>`, stopping at the first directory
    /// that has one. A profile file next to it is merged first.
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let extensions = enabled_extensions();
        for dir in self.resolve_search_paths() {
            for ext in extensions {
                let profile_path = dir.join(format!("hybrid.{}.{ext}", self.profile));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_known_file(figment, &profile_path, ext);
                }

                let base_path = dir.join(format!("hybrid.{ext}"));
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return merge_known_file(figment, &base_path, ext);
                }
            }
        }
        warn!("No configuration file found, using defaults");
        figment
    }
}

fn enabled_extensions() -> &'static [&'static str] {
    &[
        #[cfg(feature = "toml-config")]
        "toml",
        #[cfg(feature = "yaml-config")]
        "yaml",
        #[cfg(feature = "yaml-config")]
        "yml",
    ]
}

fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if enabled_extensions().contains(&ext) {
        Ok(merge_known_file(figment, path, ext))
    } else {
        Err(ConfigError::UnsupportedFormat(ext.to_string()))
    }
}

#[allow(unused_variables)]
fn merge_known_file(figment: Figment, path: &Path, ext: &str) -> Figment {
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => figment.merge(Toml::file(path)),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        _ => figment,
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<HybridConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from one file, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<HybridConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogOutput;
    use figment::Jail;

    fn load_in(jail: &Jail) -> HybridConfig {
        ConfigLoader::new()
            .profile("development")
            .search_path(jail.directory())
            .load()
            .unwrap()
    }

    #[test]
    fn test_defaults_without_files() {
        Jail::expect_with(|jail| {
            let config = load_in(jail);
            assert_eq!(config, HybridConfig::default());
            assert_eq!(config.server.port, 8454);
            assert_eq!(config.forwarder.max_retries, 3);
            assert_eq!(config.logging.level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_file_values_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "hybrid.toml",
                r#"
                [agent]
                name = "tipbot"

                [forwarder]
                agent_url = "https://agent.example"
                max_retries = 5

                [logging]
                output = "stderr"
                [logging.filters]
                hybrid_framework = "debug"
                "#,
            )?;

            let config = load_in(jail);
            assert_eq!(config.agent.name, "tipbot");
            assert_eq!(config.forwarder.agent_url, "https://agent.example");
            assert_eq!(config.forwarder.max_retries, 5);
            assert_eq!(config.forwarder.timeout_ms, 10_000);
            assert_eq!(config.logging.output, LogOutput::Stderr);
            assert_eq!(config.logging.filters["hybrid_framework"], "debug");
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_is_below_main_file() {
        Jail::expect_with(|jail| {
            jail.create_file("hybrid.production.toml", "[server]\nport = 80\nhost = \"10.0.0.1\"")?;
            jail.create_file("hybrid.toml", "[server]\nport = 9000")?;

            let config = ConfigLoader::new()
                .profile("prod")
                .search_path(jail.directory())
                .load()
                .unwrap();
            assert_eq!(config.server.port, 9000);
            assert_eq!(config.server.host, "10.0.0.1");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("hybrid.toml", "[server]\nport = 9000")?;
            jail.set_env("HYBRID_SERVER__PORT", "9100");
            jail.set_env("HYBRID_FORWARDER__API_KEY", "secret");

            let config = load_in(jail);
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.forwarder.api_key.as_deref(), Some("secret"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = ConfigLoader::new()
            .without_env()
            .file("/definitely/not/here/hybrid.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_validated_rejects_bad_values() {
        Jail::expect_with(|jail| {
            jail.create_file("hybrid.toml", "[forwarder]\ntimeout_ms = 0")?;

            let err = ConfigLoader::new()
                .search_path(jail.directory())
                .load_validated()
                .unwrap_err();
            assert!(matches!(err, ConfigError::Validation { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_format_and_type_errors() {
        Jail::expect_with(|jail| {
            jail.create_file("agent.ini", "port=1")?;
            jail.create_file("typo.toml", "[server]\nport = \"many\"")?;

            let err = ConfigLoader::new()
                .without_env()
                .file("agent.ini")
                .load()
                .unwrap_err();
            assert!(matches!(err, ConfigError::UnsupportedFormat(ref ext) if ext == "ini"));

            let err = ConfigLoader::new()
                .without_env()
                .file("typo.toml")
                .load()
                .unwrap_err();
            assert!(matches!(err, ConfigError::Extract(_)));
            Ok(())
        });
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".into()));
    }
}
