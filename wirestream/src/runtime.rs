//! Runtime wiring helpers for spawning a streaming session.

use std::sync::Arc;

use crate::{
    ClientConfig, ClientHooks, ConfigError, EventReceiver, MetricsClientHooks, SafeClientHooks,
    StreamClient, TracingClientHooks, Transport,
};

/// Structured-logging hooks, isolated from observer panics.
pub fn tracing_hooks() -> Arc<dyn ClientHooks> {
    Arc::new(SafeClientHooks::new(TracingClientHooks))
}

/// `metrics` facade hooks, isolated from observer panics.
pub fn metrics_hooks() -> Arc<dyn ClientHooks> {
    Arc::new(SafeClientHooks::new(MetricsClientHooks))
}

pub fn spawn_client_with_transport(
    config: ClientConfig,
    transport: Arc<dyn Transport>,
) -> Result<(StreamClient, EventReceiver), ConfigError> {
    spawn_client_with(config, transport, tracing_hooks())
}

pub fn spawn_client_with(
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    hooks: Arc<dyn ClientHooks>,
) -> Result<(StreamClient, EventReceiver), ConfigError> {
    StreamClient::builder(config, transport).hooks(hooks).spawn()
}

/// Spawns a client over the WebSocket transport with tracing hooks.
///
/// Must be called from within a tokio runtime.
#[cfg(feature = "transport-websocket")]
pub fn spawn_client(config: ClientConfig) -> Result<(StreamClient, EventReceiver), ConfigError> {
    spawn_client_with_transport(config, Arc::new(crate::WebSocketTransport::new()))
}

/// Same as [`spawn_client`], with the backend read from `WIRESTREAM_BACKEND_*`.
#[cfg(feature = "transport-websocket")]
pub fn spawn_client_from_env() -> Result<(StreamClient, EventReceiver), ConfigError> {
    let backend = crate::BackendConfig::from_env()?;
    spawn_client(ClientConfig::builder(backend).build()?)
}
