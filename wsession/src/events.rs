//! Typed events delivered to the consumer over an ordered channel.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use wcommon::{RequestId, SessionId};
use wprovider::ProviderId;

use crate::ClientHooks;

pub const CONNECTION_LOST: &str = "connection lost";
pub const CLIENT_SHUTDOWN: &str = "client shutdown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectCause {
    ConnectFailed(String),
    ConnectionLost(String),
    PingTimeout,
    ManualReconnect,
    BackendChanged,
    ClientShutdown,
}

impl DisconnectCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectFailed(_) => "connect_failed",
            Self::ConnectionLost(_) => "connection_lost",
            Self::PingTimeout => "ping_timeout",
            Self::ManualReconnect => "manual_reconnect",
            Self::BackendChanged => "backend_changed",
            Self::ClientShutdown => "client_shutdown",
        }
    }

    /// Whether the session schedules a reconnect after this cause.
    pub fn schedules_reconnect(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed(_) | Self::ConnectionLost(_) | Self::PingTimeout
        )
    }
}

impl Display for DisconnectCause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectFailed(detail) => write!(f, "connect failed: {detail}"),
            Self::ConnectionLost(detail) => write!(f, "{CONNECTION_LOST}: {detail}"),
            Self::PingTimeout => write!(f, "{CONNECTION_LOST}: ping timeout"),
            Self::ManualReconnect => f.write_str("manual reconnect"),
            Self::BackendChanged => f.write_str("backend changed"),
            Self::ClientShutdown => f.write_str(CLIENT_SHUTDOWN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Connecting {
        attempt: u32,
    },
    Connected {
        session_id: SessionId,
    },
    Disconnected {
        session_id: Option<SessionId>,
        cause: DisconnectCause,
    },
    ReconnectScheduled {
        delay: Duration,
        attempt: u32,
    },
    /// Reconnection is exhausted; the client idles until a manual reconnect.
    ConnectionFailed {
        attempts: u32,
    },
    ProviderDetected {
        provider: ProviderId,
        model: String,
        orchestrator: String,
    },
    RequestStarted {
        request_id: RequestId,
    },
    ChunkReceived {
        request_id: RequestId,
        text: String,
    },
    RequestComplete {
        request_id: RequestId,
    },
    RequestError {
        request_id: RequestId,
        message: String,
        recoverable: bool,
    },
}

impl ClientEvent {
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::RequestStarted { request_id }
            | Self::ChunkReceived { request_id, .. }
            | Self::RequestComplete { request_id }
            | Self::RequestError { request_id, .. } => Some(request_id),
            _ => None,
        }
    }

    /// Connection-level events, as opposed to request-scoped ones.
    pub fn is_status(&self) -> bool {
        matches!(
            self,
            Self::Connecting { .. }
                | Self::Connected { .. }
                | Self::Disconnected { .. }
                | Self::ReconnectScheduled { .. }
                | Self::ConnectionFailed { .. }
        )
    }
}

pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

/// Write side of the event channel plus the hooks observing it.
#[derive(Clone)]
pub struct EventEmitter {
    events: mpsc::UnboundedSender<ClientEvent>,
    hooks: Arc<dyn ClientHooks>,
}

impl EventEmitter {
    pub fn new(events: mpsc::UnboundedSender<ClientEvent>, hooks: Arc<dyn ClientHooks>) -> Self {
        Self { events, hooks }
    }

    pub fn channel(hooks: Arc<dyn ClientHooks>) -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender, hooks), receiver)
    }

    pub fn emit(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("event receiver dropped; discarding event");
        }
    }

    pub fn hooks(&self) -> &dyn ClientHooks {
        self.hooks.as_ref()
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("closed", &self.events.is_closed())
            .finish_non_exhaustive()
    }
}
