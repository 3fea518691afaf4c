//! Tracing-based observability hooks for session, reconnect, and dispatch events.
//!
//! ```rust
//! use wobserve::TracingClientHooks;
//! use wsession::ClientHooks;
//!
//! fn accepts_client_hooks(_hooks: &dyn ClientHooks) {}
//!
//! let hooks = TracingClientHooks;
//! accepts_client_hooks(&hooks);
//! ```

use std::time::Duration;

use wcommon::{RequestId, SessionId};
use wprovider::{DetectedProvider, ProviderProfile};
use wsession::{ClientHooks, DisconnectCause, DropReason};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingClientHooks;

impl ClientHooks for TracingClientHooks {
    fn on_connect_attempt(&self, attempt: u32, url: &str) {
        tracing::info!(phase = "session", event = "connect_attempt", attempt, url);
    }

    fn on_connected(&self, session_id: SessionId, profile: &ProviderProfile) {
        tracing::info!(
            phase = "session",
            event = "connected",
            session_id = %session_id,
            provider = %profile.provider,
            ping_interval_ms = profile.ping_interval.as_millis() as u64,
            max_message_size = profile.max_message_size
        );
    }

    fn on_disconnected(&self, session_id: Option<SessionId>, cause: &DisconnectCause) {
        tracing::warn!(
            phase = "session",
            event = "disconnected",
            session_id = session_id.map(SessionId::get),
            cause = cause.as_str(),
            reconnects = cause.schedules_reconnect(),
            detail = %cause
        );
    }

    fn on_reconnect_scheduled(&self, attempt: u32, delay: Duration) {
        tracing::info!(
            phase = "reconnect",
            event = "reconnect_scheduled",
            attempt,
            delay_ms = delay.as_millis() as u64
        );
    }

    fn on_connection_failed(&self, attempts: u32) {
        tracing::error!(phase = "reconnect", event = "connection_failed", attempts);
    }

    fn on_frame_dropped(&self, reason: &DropReason) {
        tracing::warn!(
            phase = "dispatch",
            event = "frame_dropped",
            reason = reason.as_str(),
            request_id = reason.request_id().map(|id| id.as_str()),
            detail = %reason
        );
    }

    fn on_provider_detected(&self, detected: &DetectedProvider) {
        tracing::info!(
            phase = "dispatch",
            event = "provider_detected",
            provider = %detected.provider,
            model = detected.model,
            orchestrator = detected.orchestrator
        );
    }

    fn on_chunk(&self, request_id: &RequestId, bytes: usize, interarrival: Option<Duration>) {
        tracing::trace!(
            phase = "dispatch",
            event = "chunk",
            request_id = %request_id,
            bytes,
            interarrival_ms = interarrival.map(|gap| gap.as_secs_f64() * 1000.0)
        );
    }

    fn on_request_complete(&self, request_id: &RequestId, chunks: u64) {
        tracing::info!(
            phase = "dispatch",
            event = "request_complete",
            request_id = %request_id,
            chunks
        );
    }

    fn on_request_error(&self, request_id: &RequestId, message: &str, recoverable: bool) {
        if recoverable {
            tracing::warn!(
                phase = "dispatch",
                event = "request_error",
                request_id = %request_id,
                recoverable,
                message
            );
        } else {
            tracing::error!(
                phase = "dispatch",
                event = "request_error",
                request_id = %request_id,
                recoverable,
                message
            );
        }
    }

    fn on_chunk_latency_window(&self, average: Duration, total_chunks: u64) {
        tracing::info!(
            phase = "dispatch",
            event = "chunk_latency",
            average_ms = average.as_secs_f64() * 1000.0,
            total_chunks
        );
    }
}
