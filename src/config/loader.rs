//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{FeedConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable names read on top of the config file.
pub const ENV_XDAI_WS_PROVIDER: &str = "XDAI_WS_PROVIDER";
pub const ENV_MAINNET_WS_PROVIDER: &str = "MAINNET_WS_PROVIDER";
pub const ENV_CONTRACT: &str = "POAP_CONTRACT";
pub const ENV_API_KEY: &str = "POAP_API_KEY";
pub const ENV_API_BASEURL: &str = "POAP_API_BASEURL";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML file without validating it.
pub fn read_config_file(path: &Path) -> Result<FeedConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Apply environment overrides using `lookup` to resolve variables.
///
/// Empty values are ignored so an unset `.env` entry does not erase the file value.
pub fn apply_env_overrides<F>(config: &mut FeedConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(ENV_XDAI_WS_PROVIDER) {
        config.nodes.xdai_ws_url = v;
    }
    if let Some(v) = get(ENV_MAINNET_WS_PROVIDER) {
        config.nodes.mainnet_ws_url = v;
    }
    if let Some(v) = get(ENV_CONTRACT) {
        config.contract.address = v;
    }
    if let Some(v) = get(ENV_API_KEY) {
        config.api.api_key = v;
    }
    if let Some(v) = get(ENV_API_BASEURL) {
        config.api.base_url = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = get(ENV_BIND_ADDRESS) {
        config.listener.bind_address = v;
    }
    if let Some(v) = get(ENV_PORT) {
        let port: u16 = v.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Env {
            var: ENV_PORT,
            message: e.to_string(),
        })?;
        config.listener.set_port(port);
    }
    if let Some(v) = get(ENV_LOG_FORMAT) {
        config.observability.log_format = match v.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => {
                return Err(ConfigError::Env {
                    var: ENV_LOG_FORMAT,
                    message: format!("unknown format '{}'", other),
                })
            }
        };
    }

    Ok(())
}

/// Load, override from the process environment, and validate configuration.
///
/// `path` is optional: without a file the defaults plus environment are used.
pub fn load_config(path: Option<&Path>) -> Result<FeedConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => FeedConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
