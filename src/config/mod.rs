//! Configuration loading and management
//!
//! A [`GateConfig`] can be loaded from YAML and then overridden from the
//! environment (`JWT_SECRET`, `API_PREFIX`, `PORT`).
//!
//! ```yaml
//! api_prefix: /api/v1
//! listen_addr: 0.0.0.0:8080
//! token:
//!   secret: change-me
//!   ttl_hours: 24
//! ```

use crate::core::error::ConfigError;
use crate::core::token::{DEFAULT_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Environment variable holding the token signing secret
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
/// Environment variable holding the API mount prefix
pub const ENV_API_PREFIX: &str = "API_PREFIX";
/// Environment variable holding the listen port
pub const ENV_PORT: &str = "PORT";

/// Token signing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// Shared HS256 secret
    pub secret: String,

    /// Token lifetime in hours
    pub ttl_hours: i64,

    /// Clock skew tolerated on expiry, in seconds
    pub leeway_secs: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            leeway_secs: 0,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Prefix every route is mounted under (e.g. `/api/v1`), empty for none
    pub api_prefix: String,

    pub listen_addr: String,

    /// Maximum request body the pipeline will buffer
    pub body_limit_bytes: usize,

    pub token: TokenSettings,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            api_prefix: String::new(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            body_limit_bytes: DEFAULT_BODY_LIMIT,
            token: TokenSettings::default(),
        }
    }
}

impl GateConfig {
    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: None,
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })
    }

    /// Apply `JWT_SECRET`, `API_PREFIX` and `PORT` from the process environment
    pub fn apply_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_JWT_SECRET) {
            self.token.secret = secret;
        }

        if let Some(prefix) = lookup(ENV_API_PREFIX) {
            self.api_prefix = prefix;
        }

        if let Some(port) = lookup(ENV_PORT) {
            let port: u16 = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_PORT.to_string(),
                message: format!("'{}' is not a valid port", port),
            })?;
            let host = self
                .listen_addr
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or("0.0.0.0");
            self.listen_addr = format!("{}:{}", host, port);
        }

        Ok(self)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.secret.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "token.secret".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.token.ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "token.ttl_hours".to_string(),
                message: format!("must be positive, got {}", self.token.ttl_hours),
            });
        }

        if self.token.ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::InvalidValue {
                field: "token.ttl_hours".to_string(),
                message: format!(
                    "must be at most {}, got {}",
                    MAX_TOKEN_TTL_HOURS, self.token.ttl_hours
                ),
            });
        }

        self.validate_mount()
    }

    /// Check the routing settings only, for setups with their own token service
    pub fn validate_mount(&self) -> Result<(), ConfigError> {
        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "api_prefix".to_string(),
                message: format!("must start with '/', got '{}'", self.api_prefix),
            });
        }

        if self.body_limit_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "body_limit_bytes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Join the API prefix and a route template
    pub fn prefixed(&self, template: &str) -> String {
        let prefix = self.api_prefix.trim_end_matches('/');
        match (prefix.is_empty(), template) {
            (true, _) => template.to_string(),
            (false, "" | "/") => prefix.to_string(),
            (false, t) if t.starts_with('/') => format!("{}{}", prefix, t),
            (false, t) => format!("{}/{}", prefix, t),
        }
    }
}
