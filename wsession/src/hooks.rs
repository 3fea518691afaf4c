//! Observer contract for session lifecycle and dispatch.
//!
//! Hooks run synchronously on the background task, so implementations must
//! return quickly and never block.

use std::time::Duration;

use wcommon::{RequestId, SessionId};
use wprovider::{DetectedProvider, ProviderProfile};

use crate::{DisconnectCause, DropReason};

pub trait ClientHooks: Send + Sync {
    fn on_connect_attempt(&self, _attempt: u32, _url: &str) {}

    fn on_connected(&self, _session_id: SessionId, _profile: &ProviderProfile) {}

    fn on_disconnected(&self, _session_id: Option<SessionId>, _cause: &DisconnectCause) {}

    fn on_reconnect_scheduled(&self, _attempt: u32, _delay: Duration) {}

    fn on_connection_failed(&self, _attempts: u32) {}

    fn on_frame_dropped(&self, _reason: &DropReason) {}

    fn on_provider_detected(&self, _detected: &DetectedProvider) {}

    fn on_chunk(&self, _request_id: &RequestId, _bytes: usize, _interarrival: Option<Duration>) {}

    fn on_request_complete(&self, _request_id: &RequestId, _chunks: u64) {}

    fn on_request_error(&self, _request_id: &RequestId, _message: &str, _recoverable: bool) {}

    fn on_chunk_latency_window(&self, _average: Duration, _total_chunks: u64) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopClientHooks;

impl ClientHooks for NoopClientHooks {}
