//! Metrics-based observability hooks for session, reconnect, and dispatch events.
//!
//! ```rust
//! use wobserve::MetricsClientHooks;
//! use wsession::ClientHooks;
//!
//! fn accepts_client_hooks(_hooks: &dyn ClientHooks) {}
//!
//! let hooks = MetricsClientHooks;
//! accepts_client_hooks(&hooks);
//! ```

use std::time::Duration;

use wcommon::{RequestId, SessionId};
use wprovider::{DetectedProvider, ProviderProfile};
use wsession::{ClientHooks, DisconnectCause, DropReason};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsClientHooks;

impl ClientHooks for MetricsClientHooks {
    fn on_connect_attempt(&self, _attempt: u32, _url: &str) {
        metrics::counter!("wirestream_connect_attempt_total").increment(1);
    }

    fn on_connected(&self, _session_id: SessionId, profile: &ProviderProfile) {
        metrics::counter!(
            "wirestream_connected_total",
            "provider" => profile.provider.to_string()
        )
        .increment(1);
    }

    fn on_disconnected(&self, _session_id: Option<SessionId>, cause: &DisconnectCause) {
        metrics::counter!("wirestream_disconnect_total", "cause" => cause.as_str()).increment(1);
    }

    fn on_reconnect_scheduled(&self, _attempt: u32, delay: Duration) {
        metrics::counter!("wirestream_reconnect_scheduled_total").increment(1);
        metrics::histogram!("wirestream_reconnect_delay_seconds").record(delay.as_secs_f64());
    }

    fn on_connection_failed(&self, _attempts: u32) {
        metrics::counter!("wirestream_connection_failed_total").increment(1);
    }

    fn on_frame_dropped(&self, reason: &DropReason) {
        metrics::counter!("wirestream_frame_dropped_total", "reason" => reason.as_str())
            .increment(1);
    }

    fn on_provider_detected(&self, detected: &DetectedProvider) {
        metrics::counter!(
            "wirestream_provider_detected_total",
            "provider" => detected.provider.to_string()
        )
        .increment(1);
    }

    fn on_chunk(&self, _request_id: &RequestId, _bytes: usize, interarrival: Option<Duration>) {
        metrics::counter!("wirestream_chunk_total").increment(1);
        if let Some(gap) = interarrival {
            metrics::histogram!("wirestream_chunk_interarrival_seconds").record(gap.as_secs_f64());
        }
    }

    fn on_request_complete(&self, _request_id: &RequestId, chunks: u64) {
        metrics::counter!("wirestream_request_complete_total").increment(1);
        metrics::histogram!("wirestream_chunks_per_request").record(chunks as f64);
    }

    fn on_request_error(&self, _request_id: &RequestId, _message: &str, recoverable: bool) {
        metrics::counter!(
            "wirestream_request_error_total",
            "recoverable" => if recoverable { "true" } else { "false" }
        )
        .increment(1);
    }
}
