//! Unified facade over the wirestream workspace crates.
//!
//! This crate is designed to be the single dependency for most applications.
//! It re-exports the session, provider, and observability crates and adds
//! wiring helpers, a backend health probe, and a few macros.
//!
//! ```rust,no_run
//! use wirestream::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::builder(BackendConfig::from_env()?).build()?;
//! let (client, mut events) = spawn_client(config)?;
//!
//! let request_id = client.send("Summarize the release notes").await?;
//! let response = collect_response(&mut events, &request_id).await;
//! println!("{}", response.text);
//!
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod macros;

pub mod health;
pub mod prelude;
pub mod runtime;
pub mod util;

pub use wcommon;
pub use wobserve;
pub use wprovider;
pub use wsession;

pub use wcommon::{BoxFuture, RequestId, SessionId};
pub use wobserve::{MetricsClientHooks, SafeClientHooks, TracingClientHooks};
pub use wprovider::{
    ChunkBuffering, CompressionMode, DetectedProvider, ProfileError, ProfileErrorKind,
    ProfileRegistry, ProviderId, ProviderInfo, ProviderProfile,
};
pub use wsession::{
    BackendConfig, CLIENT_SHUTDOWN, CONNECTION_LOST, ClientConfig, ClientConfigBuilder,
    ClientError, ClientErrorKind, ClientEvent, ClientHooks, ClientStatus, ConfigError,
    ConfigErrorKind, ConnectParams, ConnectionState, DisconnectCause, DropReason, EventEmitter,
    EventReceiver, NoopClientHooks, ReconnectPolicy, StreamClient, StreamClientBuilder, Transport,
    TransportError, TransportErrorKind, TransportFrame, TransportSession, new_request_id,
};
#[cfg(feature = "transport-websocket")]
pub use wsession::WebSocketTransport;
pub use wsession::protocol;
#[cfg(feature = "testing")]
pub use wsession::testing;

pub use health::{
    DEFAULT_HEALTH_TIMEOUT, HealthReport, check_backend_health, check_backend_health_with_timeout,
};
pub use runtime::{metrics_hooks, spawn_client_with, spawn_client_with_transport, tracing_hooks};
#[cfg(feature = "transport-websocket")]
pub use runtime::{spawn_client, spawn_client_from_env};
pub use util::{CollectedResponse, collect_response, local_backend, parse_provider_id};
