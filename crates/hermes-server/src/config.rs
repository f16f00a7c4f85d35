//! Server configuration types.
//!
//! Configuration is built in code with [`ServerConfig::builder()`], or
//! loaded from TOML and then overridden from `HERMES__*` environment
//! variables.
//!
//! # Example
//!
//! ```rust
//! use hermes_server::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .http_addr("127.0.0.1:3000")
//!     .max_body_size(64 * 1024)
//!     .build();
//!
//! assert_eq!(config.http_addr(), "127.0.0.1:3000");
//! ```
//!
//! ```toml
//! http_addr = "0.0.0.0:8080"
//! max_body_size = 1048576
//!
//! [log]
//! level = "debug"
//! json_format = false
//!
//! [sse]
//! buffer_size = 16
//! cors_allow_origin = "https://app.example.com"
//! ```

use hermes_sse::SseConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::error::ConfigError;
use crate::logging::LogConfig;

/// Default HTTP bind address.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// Default request body limit (2 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "HERMES";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    http_addr: String,
    max_body_size: usize,
    log: LogConfig,
    sse: SseConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            log: LogConfig::default(),
            sse: SseConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TomlError`] for malformed TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `HERMES__*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvParseError`] for a value that does not parse.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(std::env::vars())
    }

    /// Applies `HERMES__*` overrides from `vars`; other keys are ignored.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `HERMES__HTTP_ADDR` | bind address |
    /// | `HERMES__MAX_BODY_SIZE` | body limit in bytes |
    /// | `HERMES__LOG__LEVEL` | log filter |
    /// | `HERMES__LOG__JSON_FORMAT` | JSON log output |
    /// | `HERMES__SSE__BUFFER_SIZE` | SSE channel buffer |
    /// | `HERMES__SSE__CORS_ALLOW_ORIGIN` | CORS origin, empty to disable |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvParseError`] for a value that does not parse.
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            self.apply_env_var(key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    fn apply_env_var(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let Some(path) = key
            .strip_prefix(ENV_PREFIX)
            .and_then(|k| k.strip_prefix("__"))
        else {
            return Ok(());
        };
        let parts: Vec<&str> = path.split("__").collect();

        match parts.as_slice() {
            ["HTTP_ADDR"] => self.http_addr = value.to_string(),
            ["MAX_BODY_SIZE"] => {
                self.max_body_size = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["LOG", "LEVEL"] => self.log.level = value.to_string(),
            ["LOG", "JSON_FORMAT"] => {
                self.log.json_format = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["SSE", "BUFFER_SIZE"] => {
                self.sse.buffer_size = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["SSE", "CORS_ALLOW_ORIGIN"] => {
                self.sse.cors_allow_origin = (!value.is_empty()).then(|| value.to_string());
            }
            _ => return Err(ConfigError::env_parse_error(key, "unknown setting")),
        }
        Ok(())
    }

    /// Returns the HTTP bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses and returns the HTTP address as a `SocketAddr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.http_addr.parse()
    }

    /// Maximum request body size in bytes.
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Logging settings.
    #[must_use]
    pub fn log(&self) -> &LogConfig {
        &self.log
    }

    /// Event stream settings.
    #[must_use]
    pub fn sse(&self) -> &SseConfig {
        &self.sse
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.http_addr = addr.into();
        self
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.config.max_body_size = bytes;
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn log(mut self, log: LogConfig) -> Self {
        self.config.log = log;
        self
    }

    /// Sets the event stream configuration.
    #[must_use]
    pub fn sse(mut self, sse: SseConfig) -> Self {
        self.config.sse = sse;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        self.config
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
