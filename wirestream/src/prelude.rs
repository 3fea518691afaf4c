//! Common imports for most wirestream applications.

pub use crate::{
    check_backend_health, collect_response, local_backend, metrics_hooks, parse_provider_id,
    spawn_client_with, spawn_client_with_transport, tracing_hooks,
};
#[cfg(feature = "transport-websocket")]
pub use crate::{spawn_client, spawn_client_from_env};
pub use crate::{ws_backend, ws_envelope};
pub use crate::{
    BackendConfig, ClientConfig, ClientError, ClientErrorKind, ClientEvent, ClientHooks,
    ClientStatus, CollectedResponse, ConfigError, ConnectionState, DetectedProvider,
    DisconnectCause, EventReceiver, HealthReport, ProviderId, ProviderProfile, ReconnectPolicy,
    RequestId, SessionId, StreamClient,
};
pub use crate::protocol::FrontendCommand;
