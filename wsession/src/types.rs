//! Connection, request, and snapshot types shared by the session and its callers.

use std::fmt::{Display, Formatter};

use wcommon::{RequestId, SessionId};
use wprovider::ProviderId;

use crate::protocol::FrontendCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
        }
    }
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Processing,
    Streaming,
    Complete,
    Errored,
}

impl RequestStatus {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Processing | Self::Streaming)
    }

    /// Chunks are only accepted once the backend has acknowledged the request.
    pub fn accepts_chunks(self) -> bool {
        matches!(self, Self::Processing | Self::Streaming)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Chat,
    Command(FrontendCommand),
    /// Opened by a `processing` frame the client never submitted.
    Backend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: RequestId,
    pub kind: RequestKind,
    pub status: RequestStatus,
    pub chunk_count: u64,
    pub detected_provider: Option<ProviderId>,
    pub(crate) pending_text: String,
}

impl Request {
    pub fn new(id: RequestId, kind: RequestKind) -> Self {
        Self {
            id,
            kind,
            status: RequestStatus::Pending,
            chunk_count: 0,
            detected_provider: None,
            pending_text: String::new(),
        }
    }

    pub fn buffered_len(&self) -> usize {
        self.pending_text.len()
    }
}

/// Point-in-time view of the background session, answered by the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStatus {
    pub state: ConnectionState,
    pub session_id: Option<SessionId>,
    pub provider: ProviderId,
    pub model: Option<String>,
    pub orchestrator: Option<String>,
    pub open_requests: usize,
    pub reconnect_attempts: u32,
    /// Reconnection gave up; only a manual reconnect resumes.
    pub awaiting_manual_reconnect: bool,
    pub url: String,
}

impl ClientStatus {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}
