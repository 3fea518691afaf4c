use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use wcommon::{RequestId, SessionId};
use wprovider::{DetectedProvider, ProviderProfile};
use wsession::{ClientHooks, DisconnectCause, DropReason};

/// Runs the inner hooks behind `catch_unwind`; a panicking observer is
/// swallowed instead of taking down the session task.
pub struct SafeClientHooks<H> {
    inner: H,
}

impl<H> SafeClientHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H> ClientHooks for SafeClientHooks<H>
where
    H: ClientHooks,
{
    fn on_connect_attempt(&self, attempt: u32, url: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_connect_attempt(attempt, url)
        }));
    }

    fn on_connected(&self, session_id: SessionId, profile: &ProviderProfile) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_connected(session_id, profile)
        }));
    }

    fn on_disconnected(&self, session_id: Option<SessionId>, cause: &DisconnectCause) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_disconnected(session_id, cause)
        }));
    }

    fn on_reconnect_scheduled(&self, attempt: u32, delay: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_reconnect_scheduled(attempt, delay)
        }));
    }

    fn on_connection_failed(&self, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_connection_failed(attempts)
        }));
    }

    fn on_frame_dropped(&self, reason: &DropReason) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_frame_dropped(reason)));
    }

    fn on_provider_detected(&self, detected: &DetectedProvider) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_provider_detected(detected)
        }));
    }

    fn on_chunk(&self, request_id: &RequestId, bytes: usize, interarrival: Option<Duration>) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_chunk(request_id, bytes, interarrival)
        }));
    }

    fn on_request_complete(&self, request_id: &RequestId, chunks: u64) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_request_complete(request_id, chunks)
        }));
    }

    fn on_request_error(&self, request_id: &RequestId, message: &str, recoverable: bool) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_request_error(request_id, message, recoverable)
        }));
    }

    fn on_chunk_latency_window(&self, average: Duration, total_chunks: u64) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_chunk_latency_window(average, total_chunks)
        }));
    }
}
