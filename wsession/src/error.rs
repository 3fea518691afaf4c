//! Client, transport, and configuration errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

use wprovider::ProfileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    InvalidBackend,
    InvalidReconnectPolicy,
    InvalidProfile,
    InvalidCapacity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_backend(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::InvalidBackend, message)
    }

    pub fn invalid_reconnect_policy(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::InvalidReconnectPolicy, message)
    }

    pub fn invalid_profile(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::InvalidProfile, message)
    }

    pub fn invalid_capacity(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::InvalidCapacity, message)
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ConfigError {}

impl From<ProfileError> for ConfigError {
    fn from(value: ProfileError) -> Self {
        ConfigError::invalid_profile(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Closed,
    PingTimeout,
    Protocol,
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        let retryable = !matches!(kind, TransportErrorKind::Protocol);
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    pub fn closed(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Closed, message)
    }

    pub fn ping_timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::PingTimeout, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Protocol, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Io, message)
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for TransportError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    NotConnected,
    ShutDown,
    Transport,
    InvalidRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_connected(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::NotConnected, message)
    }

    pub fn shut_down(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::ShutDown, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Transport, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::InvalidRequest, message)
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ClientError {}

impl From<TransportError> for ClientError {
    fn from(value: TransportError) -> Self {
        ClientError::transport(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_retryable_except_protocol() {
        assert!(TransportError::connect("refused").retryable);
        assert!(TransportError::ping_timeout("no pong").retryable);
        assert!(!TransportError::protocol("bad frame").retryable);
        assert!(!TransportError::io("reset").with_retryable(false).retryable);
    }

    #[test]
    fn conversions_keep_the_source_message() {
        let client: ClientError = TransportError::closed("peer went away").into();
        assert_eq!(client.kind, ClientErrorKind::Transport);
        assert_eq!(client.to_string(), "Transport: Closed: peer went away");

        let config: ConfigError = ProfileError::invalid_ping("zero").into();
        assert_eq!(config.kind, ConfigErrorKind::InvalidProfile);
    }
}
