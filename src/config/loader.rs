//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Path of the TOML config file.
pub const ENV_CONFIG_PATH: &str = "DEALER_BFF_CONFIG";
/// Overrides `upstream.base_url`.
pub const ENV_UPSTREAM_URL: &str = "DEALER_BFF_UPSTREAM_URL";
/// Overrides `listener.bind_address`.
pub const ENV_BIND_ADDRESS: &str = "DEALER_BFF_BIND";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides, then re-validate.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_UPSTREAM_URL) {
        config.upstream.base_url = url;
    }
    if let Some(bind) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Resolve the process configuration: file named by `DEALER_BFF_CONFIG`
/// (defaults otherwise) plus environment overrides.
pub fn load_from_env() -> Result<(AppConfig, Option<std::path::PathBuf>), ConfigError> {
    let path = std::env::var(ENV_CONFIG_PATH).ok().map(std::path::PathBuf::from);
    let base = match &path {
        Some(p) => load_config(p)?,
        None => AppConfig::default(),
    };
    let config = apply_env_overrides(base, |key| std::env::var(key).ok())?;
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [upstream]
            base_url = "https://api.dealer.example/api"
            timeout_secs = 12

            [auth]
            cookie_secure = false
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.base_url, "https://api.dealer.example/api");
        assert_eq!(config.upstream.timeout_secs, 12);
        assert_eq!(config.upstream.connect_timeout_secs, 5);
        assert!(!config.auth.cookie_secure);
        assert_eq!(config.auth.cookie_name, "dealer_session");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = parse_config("[upstream]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("upstream.timeout_secs"));
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_env_overrides(AppConfig::default(), |key| match key {
            ENV_UPSTREAM_URL => Some("https://override.example".into()),
            ENV_BIND_ADDRESS => Some("127.0.0.1:9999".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.upstream.base_url, "https://override.example");
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");

        let err = apply_env_overrides(AppConfig::default(), |key| {
            (key == ENV_UPSTREAM_URL).then(|| "not a url".to_string())
        });
        assert!(err.is_err());
    }
}
