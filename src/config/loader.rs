//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::auth::ServiceAccountKey;
use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Path of the optional TOML file.
pub const CONFIG_PATH_VAR: &str = "PROXY_CONFIG";
pub const BIND_ADDRESS_VAR: &str = "PROXY_BIND_ADDRESS";
pub const SECRET_PREFIX_VAR: &str = "PROXY_SECRET_PREFIX";
pub const CDN_SUBDOMAIN_VAR: &str = "PROXY_CDN_SUBDOMAIN";
pub const API_SUBDOMAIN_VAR: &str = "PROXY_API_SUBDOMAIN";
/// Service-account JSON document.
pub const SERVICE_ACCOUNT_VAR: &str = "PROXY_SERVICE_ACCOUNT";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    ServiceAccount(serde_json::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            // serde_json errors never echo the document, so the key stays out of the message
            ConfigError::ServiceAccount(e) => write!(f, "Invalid {}: {}", SERVICE_ACCOUNT_VAR, e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ProxyConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration the way the binary does: optional file, then process environment.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    let config = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => {
            let content = fs::read_to_string(&path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        Err(_) => ProxyConfig::default(),
    };

    let config = apply_env_overrides(config, std::env::vars())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-style key/value pairs onto `config`.
///
/// Unknown keys are ignored. Empty values are treated as unset.
pub fn apply_env_overrides<I, K, V>(mut config: ProxyConfig, vars: I) -> Result<ProxyConfig, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    for (key, value) in vars {
        let value: String = value.into();
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            BIND_ADDRESS_VAR => config.listener.bind_address = value,
            SECRET_PREFIX_VAR => config.routing.secret_prefix = value,
            CDN_SUBDOMAIN_VAR => config.routing.cdn_subdomain = value,
            API_SUBDOMAIN_VAR => config.routing.api_subdomain = value,
            SERVICE_ACCOUNT_VAR => {
                let key = ServiceAccountKey::from_json(&value).map_err(ConfigError::ServiceAccount)?;
                config.service_account = Some(key);
            }
            _ => {}
        }
    }
    Ok(config)
}
