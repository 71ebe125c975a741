//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ForwarderConfig, HybridConfig, LogOutput, LoggingConfig, ServerConfig};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validates the entire configuration.
pub fn validate_config(config: &HybridConfig) -> ConfigResult<()> {
    if config.agent.name.trim().is_empty() {
        return Err(ConfigError::validation("Agent name cannot be empty"));
    }
    validate_logging_config(&config.logging)?;
    validate_server_config(&config.server)?;
    validate_forwarder_config(&config.forwarder)?;
    Ok(())
}

fn validate_log_level(level: &str, context: &str) -> ConfigResult<()> {
    if VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        return Ok(());
    }
    Err(ConfigError::validation(format!(
        "Invalid log level for {context}: {level}. Valid values are: {VALID_LOG_LEVELS:?}"
    )))
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    validate_log_level(&logging.level, "logging.level")?;

    for (module, level) in &logging.filters {
        if module.trim().is_empty() {
            return Err(ConfigError::validation("Log filter module cannot be empty"));
        }
        validate_log_level(level, &format!("logging.filters.{module}"))?;
    }

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when output is \"file\"",
        ));
    }

    Ok(())
}

fn validate_server_config(server: &ServerConfig) -> ConfigResult<()> {
    if server.host.trim().is_empty() {
        return Err(ConfigError::validation("Server host cannot be empty"));
    }
    if server.port == 0 {
        return Err(ConfigError::InvalidPort(server.port));
    }
    Ok(())
}

fn validate_forwarder_config(forwarder: &ForwarderConfig) -> ConfigResult<()> {
    validate_url(&forwarder.agent_url)?;
    if forwarder.timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Forwarder timeout must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::invalid_url(url, "URL cannot be empty"));
    }
    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(ConfigError::invalid_url(url, "URL must include a scheme"));
    };
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::invalid_url(
            url,
            format!("expected http or https, got {scheme}"),
        ));
    }
    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::invalid_url(url, "URL must include a host"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&HybridConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut config = HybridConfig::default();
        config.logging.level = "verbose".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation { .. })
        ));

        let mut config = HybridConfig::default();
        config
            .logging
            .filters
            .insert("hybrid_transport".into(), "loud".into());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_level_is_case_insensitive() {
        let mut config = HybridConfig::default();
        config.logging.level = "DEBUG".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_port_zero() {
        let mut config = HybridConfig::default();
        config.server.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidPort(0))
        ));
    }

    #[test]
    fn test_rejects_bad_agent_urls() {
        for url in ["", "localhost:8454", "ftp://agent", "http://"] {
            let mut config = HybridConfig::default();
            config.forwarder.agent_url = url.into();
            assert!(
                matches!(validate_config(&config), Err(ConfigError::InvalidUrl { .. })),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = HybridConfig::default();
        config.forwarder.timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = HybridConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("logs/hybrid.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
