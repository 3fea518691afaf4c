//! Duplex text-frame transport contract.
//!
//! The session machine owns one [`TransportSession`] at a time and drives it
//! from a single task, so sessions need `Send` but not `Sync`.

#[cfg(feature = "transport-websocket")]
pub mod websocket;

use std::time::Duration;

use wcommon::BoxFuture;
use wprovider::{CompressionMode, ProviderProfile};

use crate::TransportError;

/// Connection parameters derived from the best-known provider profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
    pub max_message_size: usize,
    pub compression: CompressionMode,
}

impl ConnectParams {
    pub fn from_profile(profile: &ProviderProfile) -> Self {
        Self {
            ping_interval: profile.ping_interval,
            ping_timeout: profile.ping_timeout,
            max_message_size: profile.max_message_size,
            compression: profile.compression,
        }
    }
}

impl From<&ProviderProfile> for ConnectParams {
    fn from(value: &ProviderProfile) -> Self {
        Self::from_profile(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFrame {
    Text(String),
    /// Orderly close, with the peer's reason when one was given.
    Closed(Option<String>),
    Error(TransportError),
}

pub trait Transport: Send + Sync + std::fmt::Debug {
    fn open<'a>(
        &'a self,
        url: &'a str,
        params: &'a ConnectParams,
    ) -> BoxFuture<'a, Result<Box<dyn TransportSession>, TransportError>>;
}

pub trait TransportSession: Send {
    fn send<'a>(&'a mut self, text: String) -> BoxFuture<'a, Result<(), TransportError>>;

    /// Next inbound frame. Must be cancel-safe: dropping the future before it
    /// resolves loses no frame.
    fn receive<'a>(&'a mut self) -> BoxFuture<'a, TransportFrame>;

    fn close<'a>(&'a mut self) -> BoxFuture<'a, Result<(), TransportError>>;
}
