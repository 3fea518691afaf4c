//! Persistent streaming session against a chat backend.
//!
//! A [`StreamClient`] owns one background task that keeps a single transport
//! connection alive, reconnects with jittered exponential backoff, detects the
//! upstream model provider, and turns inbound frames into [`ClientEvent`]s.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use wsession::{BackendConfig, ClientConfig, ReconnectPolicy};
//!
//! let backend = BackendConfig::new("chat.internal", 443, true).expect("valid backend");
//! let config = ClientConfig::builder(backend)
//!     .reconnect(ReconnectPolicy::default().with_jitter(0.0))
//!     .command_capacity(16)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.backend.websocket_url(), "wss://chat.internal:443/ws/chat");
//! assert_eq!(config.reconnect.backoff_for_attempt(3), Duration::from_secs(4));
//! ```

mod client;
mod config;
mod dispatcher;
mod error;
mod events;
mod hooks;
mod machine;
mod reconnect;
mod types;

pub mod protocol;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub mod prelude {
    pub use crate::protocol::FrontendCommand;
    pub use crate::{
        BackendConfig, ClientConfig, ClientError, ClientErrorKind, ClientEvent, ClientHooks,
        ClientStatus, ConfigError, ConnectionState, DisconnectCause, EventReceiver,
        NoopClientHooks, ReconnectPolicy, StreamClient, StreamClientBuilder,
    };
    pub use wcommon::{RequestId, SessionId};
    pub use wprovider::{DetectedProvider, ProviderId, ProviderProfile};
}

pub use client::{StreamClient, StreamClientBuilder, new_request_id};
pub use config::{
    BackendConfig, ClientConfig, ClientConfigBuilder, DEFAULT_COMMAND_CAPACITY, DEFAULT_HOST,
    DEFAULT_PORT, DEFAULT_WEBSOCKET_PATH, ENV_BACKEND_HOST, ENV_BACKEND_PATH, ENV_BACKEND_PORT,
    ENV_BACKEND_SSL,
};
pub use dispatcher::{
    ChunkLatencyTracker, DROPPED_EXCERPT_CHARS, Dispatcher, DropReason, LATENCY_WINDOW,
    LatencyWindow,
};
pub use error::{
    ClientError, ClientErrorKind, ConfigError, ConfigErrorKind, TransportError,
    TransportErrorKind,
};
pub use events::{
    CLIENT_SHUTDOWN, CONNECTION_LOST, ClientEvent, DisconnectCause, EventEmitter, EventReceiver,
};
pub use hooks::{ClientHooks, NoopClientHooks};
pub use reconnect::{ReconnectDecision, ReconnectPolicy, ReconnectState};
pub use transport::{ConnectParams, Transport, TransportFrame, TransportSession};
#[cfg(feature = "transport-websocket")]
pub use transport::websocket::WebSocketTransport;
pub use types::{ClientStatus, ConnectionState, Request, RequestKind, RequestStatus};
pub use wcommon::{RequestId, SessionId};
