//! Backend endpoint and client configuration.
//!
//! ```rust
//! use wsession::{BackendConfig, ClientConfig, ReconnectPolicy};
//!
//! let backend = BackendConfig::new("chat.internal", 443, true).expect("valid backend");
//! assert_eq!(backend.websocket_url(), "wss://chat.internal:443/ws/chat");
//!
//! let config = ClientConfig::builder(backend)
//!     .reconnect(ReconnectPolicy::new(8))
//!     .auto_connect(false)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.reconnect.max_attempts, 8);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wprovider::ProfileRegistry;

use crate::{ConfigError, ReconnectPolicy};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_WEBSOCKET_PATH: &str = "/ws/chat";
pub const DEFAULT_COMMAND_CAPACITY: usize = 64;

pub const ENV_BACKEND_HOST: &str = "WIRESTREAM_BACKEND_HOST";
pub const ENV_BACKEND_PORT: &str = "WIRESTREAM_BACKEND_PORT";
pub const ENV_BACKEND_SSL: &str = "WIRESTREAM_BACKEND_SSL";
pub const ENV_BACKEND_PATH: &str = "WIRESTREAM_BACKEND_PATH";

fn default_path() -> String {
    DEFAULT_WEBSOCKET_PATH.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            use_ssl: false,
            path: default_path(),
        }
    }
}

impl BackendConfig {
    pub fn new(host: impl Into<String>, port: u16, use_ssl: bool) -> Result<Self, ConfigError> {
        let config = Self {
            host: host.into().trim().to_string(),
            port,
            use_ssl,
            path: default_path(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Result<Self, ConfigError> {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self.validate()?;
        Ok(self)
    }

    /// Reads `WIRESTREAM_BACKEND_*` variables, defaulting to `localhost:8000` without TLS.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_BACKEND_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(ENV_BACKEND_PORT) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                ConfigError::invalid_backend(format!("{ENV_BACKEND_PORT} is not a valid port: {raw}"))
            })?,
            None => DEFAULT_PORT,
        };
        let use_ssl = lookup(ENV_BACKEND_SSL)
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);

        let config = Self::new(host, port, use_ssl)?;
        match lookup(ENV_BACKEND_PATH) {
            Some(path) => config.with_path(path),
            None => Ok(config),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid_backend("backend host must not be empty"));
        }

        if self.host.contains(['/', ' ']) {
            return Err(ConfigError::invalid_backend(format!(
                "backend host must be a bare host name: {}",
                self.host
            )));
        }

        if self.port == 0 {
            return Err(ConfigError::invalid_backend(
                "backend port must be within 1..=65535",
            ));
        }

        if !self.path.starts_with('/') {
            return Err(ConfigError::invalid_backend(format!(
                "websocket path must start with '/': {}",
                self.path
            )));
        }

        Ok(())
    }

    pub fn websocket_url(&self) -> String {
        let scheme = if self.use_ssl { "wss" } else { "ws" };
        format!("{scheme}://{}:{}{}", self.host, self.port, self.path)
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url())
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub reconnect: ReconnectPolicy,
    pub profiles: Arc<ProfileRegistry>,
    pub command_capacity: usize,
    /// Start connecting as soon as the client is spawned.
    pub auto_connect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            reconnect: ReconnectPolicy::default(),
            profiles: Arc::new(ProfileRegistry::standard()),
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            auto_connect: true,
        }
    }
}

impl ClientConfig {
    pub fn builder(backend: BackendConfig) -> ClientConfigBuilder {
        ClientConfigBuilder::new(backend)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backend.validate()?;
        self.reconnect.validate()?;
        self.profiles.validate()?;

        if self.command_capacity == 0 {
            return Err(ConfigError::invalid_capacity(
                "command capacity must be greater than zero",
            ));
        }

        Ok(())
    }
}

pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new(backend: BackendConfig) -> Self {
        Self {
            config: ClientConfig {
                backend,
                ..ClientConfig::default()
            },
        }
    }

    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.config.reconnect = policy;
        self
    }

    pub fn profiles(mut self, profiles: ProfileRegistry) -> Self {
        self.config.profiles = Arc::new(profiles);
        self
    }

    pub fn shared_profiles(mut self, profiles: Arc<ProfileRegistry>) -> Self {
        self.config.profiles = profiles;
        self
    }

    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.config.command_capacity = capacity;
        self
    }

    pub fn auto_connect(mut self, enabled: bool) -> Self {
        self.config.auto_connect = enabled;
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::ConfigErrorKind;

    #[test]
    fn urls_follow_the_ssl_flag() {
        let plain = BackendConfig::default();
        assert_eq!(plain.websocket_url(), "ws://localhost:8000/ws/chat");
        assert_eq!(plain.base_url(), "http://localhost:8000");
        assert_eq!(plain.health_url(), "http://localhost:8000/health");

        let secure = BackendConfig::new("api.example.com", 8443, true)
            .and_then(|config| config.with_path("stream"))
            .expect("valid backend");
        assert_eq!(secure.websocket_url(), "wss://api.example.com:8443/stream");
        assert_eq!(secure.base_url(), "https://api.example.com:8443");
    }

    #[test]
    fn invalid_backends_fail_fast() {
        let empty = BackendConfig::new("  ", 8000, false).expect_err("empty host");
        assert_eq!(empty.kind, ConfigErrorKind::InvalidBackend);

        assert!(BackendConfig::new("localhost", 0, false).is_err());
        assert!(BackendConfig::new("http://localhost", 8000, false).is_err());
    }

    #[test]
    fn from_lookup_reads_overrides_and_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_BACKEND_HOST, "10.0.0.5"),
            (ENV_BACKEND_PORT, "9001"),
            (ENV_BACKEND_SSL, "TRUE"),
        ]);
        let config = BackendConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("valid env");
        assert_eq!(config.websocket_url(), "wss://10.0.0.5:9001/ws/chat");

        let defaults = BackendConfig::from_lookup(|_| None).expect("defaults");
        assert_eq!(defaults, BackendConfig::default());

        let bad_port = BackendConfig::from_lookup(|key| {
            (key == ENV_BACKEND_PORT).then(|| "eighty".to_string())
        });
        assert!(bad_port.is_err());
    }

    #[test]
    fn backend_deserializes_with_defaults() {
        let config: BackendConfig =
            serde_json::from_str(r#"{"host":"example.org","port":443}"#).expect("parse");
        assert!(!config.use_ssl);
        assert_eq!(config.path, "/ws/chat");
    }

    #[test]
    fn builder_validates_every_part() {
        let config = ClientConfig::builder(BackendConfig::default())
            .auto_connect(false)
            .build()
            .expect("valid config");
        assert!(!config.auto_connect);
        assert_eq!(config.command_capacity, DEFAULT_COMMAND_CAPACITY);

        let invalid = ClientConfig::builder(BackendConfig::default())
            .reconnect(ReconnectPolicy::default().with_jitter(-0.5))
            .build()
            .expect_err("bad jitter");
        assert_eq!(invalid.kind, ConfigErrorKind::InvalidReconnectPolicy);

        let no_capacity = ClientConfig::builder(BackendConfig::default())
            .command_capacity(0)
            .build()
            .expect_err("zero capacity");
        assert_eq!(no_capacity.kind, ConfigErrorKind::InvalidCapacity);
    }
}
