//! Inbound frame classification and request correlation.
//!
//! The dispatcher is synchronous: it parses one frame, updates the request
//! table, and emits events in arrival order without suspending.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use wprovider::ProfileRegistry;
//! use wsession::{ClientEvent, Dispatcher, EventEmitter, NoopClientHooks, RequestKind};
//!
//! let (emitter, mut events) = EventEmitter::channel(Arc::new(NoopClientHooks));
//! let mut dispatcher = Dispatcher::new(Arc::new(ProfileRegistry::standard()));
//! dispatcher.register("r1".into(), RequestKind::Chat).expect("fresh id");
//!
//! dispatcher.dispatch(r#"{"request_id":"r1","status":"processing"}"#, &emitter);
//! dispatcher.dispatch(r#"{"request_id":"r1","status":"chunk","chunk":{"text":"hi"}}"#, &emitter);
//! dispatcher.dispatch(r#"{"request_id":"r1","status":"complete"}"#, &emitter);
//!
//! assert!(matches!(events.try_recv(), Ok(ClientEvent::RequestStarted { .. })));
//! assert!(matches!(events.try_recv(), Ok(ClientEvent::ChunkReceived { .. })));
//! assert!(matches!(events.try_recv(), Ok(ClientEvent::RequestComplete { .. })));
//! assert_eq!(dispatcher.open_requests(), 0);
//! ```

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use wcommon::{Registry, RequestId};
use wprovider::{
    ChunkBuffering, DetectedProvider, ProfileRegistry, ProviderInfo, ProviderProfile, detect,
};

use crate::protocol::{ChunkPayload, FrameBody, FrameRejection, InboundFrame, excerpt, parse_frame};
use crate::{ClientError, ClientEvent, EventEmitter, Request, RequestKind, RequestStatus};

pub const DROPPED_EXCERPT_CHARS: usize = 200;
pub const LATENCY_WINDOW: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Rejected(FrameRejection),
    UnknownRequest {
        request_id: RequestId,
        status: &'static str,
    },
    NotStreaming {
        request_id: RequestId,
        status: RequestStatus,
    },
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rejected(rejection) => rejection.as_str(),
            Self::UnknownRequest { .. } => "unknown_request",
            Self::NotStreaming { .. } => "not_streaming",
        }
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::Rejected(_) => None,
            Self::UnknownRequest { request_id, .. } | Self::NotStreaming { request_id, .. } => {
                Some(request_id)
            }
        }
    }
}

impl Display for DropReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(rejection) => Display::fmt(rejection, f),
            Self::UnknownRequest { request_id, status } => {
                write!(f, "{status} frame for unknown request {request_id}")
            }
            Self::NotStreaming { request_id, status } => {
                write!(f, "chunk for request {request_id} in state {status:?}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyWindow {
    pub average: Duration,
    pub total_chunks: u64,
}

/// Inter-arrival times between text chunks, averaged per fixed window.
#[derive(Debug, Default)]
pub struct ChunkLatencyTracker {
    last_chunk_at: Option<Instant>,
    window: Vec<Duration>,
    total_chunks: u64,
}

impl ChunkLatencyTracker {
    pub fn record(&mut self, now: Instant) -> (Option<Duration>, Option<LatencyWindow>) {
        self.total_chunks += 1;
        let interarrival = self
            .last_chunk_at
            .map(|last| now.saturating_duration_since(last));
        self.last_chunk_at = Some(now);

        let Some(delta) = interarrival else {
            return (None, None);
        };

        self.window.push(delta);
        if self.window.len() < LATENCY_WINDOW {
            return (Some(delta), None);
        }

        let sum: Duration = self.window.drain(..).sum();
        let average = sum / LATENCY_WINDOW as u32;
        (
            Some(delta),
            Some(LatencyWindow {
                average,
                total_chunks: self.total_chunks,
            }),
        )
    }

    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    pub fn reset(&mut self) {
        self.last_chunk_at = None;
        self.window.clear();
        self.total_chunks = 0;
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    profiles: Arc<ProfileRegistry>,
    requests: Registry<RequestId, Request>,
    applied: Option<Arc<ProviderProfile>>,
    detected: Option<DetectedProvider>,
    latency: ChunkLatencyTracker,
}

impl Dispatcher {
    pub fn new(profiles: Arc<ProfileRegistry>) -> Self {
        Self {
            profiles,
            requests: Registry::new(),
            applied: None,
            detected: None,
            latency: ChunkLatencyTracker::default(),
        }
    }

    /// Starts a fresh session with `applied` as its already-known profile.
    pub fn begin_session(&mut self, applied: Option<Arc<ProviderProfile>>) {
        self.applied = applied;
        self.latency.reset();
    }

    pub fn applied_profile(&self) -> Option<&Arc<ProviderProfile>> {
        self.applied.as_ref()
    }

    /// The profile governing dispatch right now; `unknown` until detection.
    pub fn active_profile(&self) -> Arc<ProviderProfile> {
        self.applied
            .clone()
            .unwrap_or_else(|| self.profiles.unknown())
    }

    pub fn detected(&self) -> Option<&DetectedProvider> {
        self.detected.as_ref()
    }

    pub fn open_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn request(&self, request_id: &str) -> Option<&Request> {
        self.requests.get(request_id)
    }

    pub fn register(&mut self, request_id: RequestId, kind: RequestKind) -> Result<(), ClientError> {
        if self.requests.contains_key(request_id.as_str()) {
            return Err(ClientError::invalid_request(format!(
                "request {request_id} is already open"
            )));
        }

        self.requests
            .insert(request_id.clone(), Request::new(request_id, kind));
        Ok(())
    }

    pub fn forget(&mut self, request_id: &str) -> Option<Request> {
        self.requests.remove(request_id)
    }

    /// Handles one raw frame. Returns the provider when this frame switched the
    /// session to a new profile.
    pub fn dispatch(&mut self, raw: &str, emitter: &EventEmitter) -> Option<DetectedProvider> {
        let InboundFrame { request_id, body } = match parse_frame(raw) {
            Ok(frame) => frame,
            Err(rejection) => {
                self.drop_frame(DropReason::Rejected(rejection), raw, emitter);
                return None;
            }
        };

        match body {
            FrameBody::Processing { provider_info } => {
                self.on_processing(request_id, provider_info, emitter)
            }
            FrameBody::Chunk(payload) => {
                self.on_chunk(request_id, payload, raw, emitter);
                None
            }
            FrameBody::Complete => {
                self.on_complete(request_id, raw, emitter);
                None
            }
            FrameBody::Error {
                message,
                recoverable,
            } => {
                self.on_error(request_id, message, recoverable, raw, emitter);
                None
            }
        }
    }

    /// Errors every open request with `message`, in request id order.
    pub fn fail_all(&mut self, message: &str, emitter: &EventEmitter) -> usize {
        let mut requests: Vec<Request> = self.requests.drain().map(|(_, request)| request).collect();
        requests.sort_by(|left, right| left.id.cmp(&right.id));

        for request in requests.iter_mut() {
            flush_pending(request, emitter);
            request.status = RequestStatus::Errored;
            tracing::debug!(
                event = "request_failed",
                request_id = %request.id,
                chunks = request.chunk_count,
                cause = message,
            );
            emitter.emit(ClientEvent::RequestError {
                request_id: request.id.clone(),
                message: message.to_string(),
                recoverable: false,
            });
            emitter.hooks().on_request_error(&request.id, message, false);
        }

        requests.len()
    }

    fn on_processing(
        &mut self,
        request_id: RequestId,
        provider_info: Option<ProviderInfo>,
        emitter: &EventEmitter,
    ) -> Option<DetectedProvider> {
        let started = match self.requests.get_mut(request_id.as_str()) {
            Some(request) if request.status == RequestStatus::Pending => {
                request.status = RequestStatus::Processing;
                true
            }
            Some(_) => false,
            None => {
                let mut request = Request::new(request_id.clone(), RequestKind::Backend);
                request.status = RequestStatus::Processing;
                self.requests.insert(request_id.clone(), request);
                true
            }
        };

        if started {
            tracing::debug!(event = "request_started", request_id = %request_id);
            emitter.emit(ClientEvent::RequestStarted {
                request_id: request_id.clone(),
            });
        }

        let detected = detect(&self.profiles, provider_info.as_ref())?;
        if let Some(request) = self.requests.get_mut(request_id.as_str()) {
            request.detected_provider = Some(detected.provider);
        }

        if !detected.provider.is_known() {
            tracing::debug!(
                request_id = %request_id,
                model = %detected.model,
                "provider not recognized; keeping current profile"
            );
            return None;
        }

        let switched = self.applied.as_ref().map(|profile| profile.provider) != Some(detected.provider);
        self.detected = Some(detected.clone());
        if !switched {
            return None;
        }

        tracing::info!(
            event = "provider_detected",
            request_id = %request_id,
            provider = %detected.provider,
            model = %detected.model,
            orchestrator = %detected.orchestrator,
        );
        self.applied = Some(Arc::clone(&detected.profile));
        emitter.emit(ClientEvent::ProviderDetected {
            provider: detected.provider,
            model: detected.model.clone(),
            orchestrator: detected.orchestrator.clone(),
        });
        emitter.hooks().on_provider_detected(&detected);
        Some(detected)
    }

    fn on_chunk(
        &mut self,
        request_id: RequestId,
        payload: ChunkPayload,
        raw: &str,
        emitter: &EventEmitter,
    ) {
        let buffering = self.active_profile().chunk_buffering;
        let status = match self.requests.get(request_id.as_str()) {
            Some(request) => request.status,
            None => {
                let reason = DropReason::UnknownRequest {
                    request_id,
                    status: "chunk",
                };
                self.drop_frame(reason, raw, emitter);
                return;
            }
        };

        if !status.accepts_chunks() {
            self.drop_frame(DropReason::NotStreaming { request_id, status }, raw, emitter);
            return;
        }

        let Some(request) = self.requests.get_mut(request_id.as_str()) else {
            return;
        };
        request.status = RequestStatus::Streaming;

        match payload {
            ChunkPayload::Text(text) => {
                request.chunk_count += 1;
                let (interarrival, window) = self.latency.record(Instant::now());
                emitter.hooks().on_chunk(&request_id, text.len(), interarrival);
                if let Some(window) = window {
                    tracing::info!(
                        event = "chunk_latency",
                        average_ms = window.average.as_secs_f64() * 1000.0,
                        total_chunks = window.total_chunks,
                    );
                    emitter
                        .hooks()
                        .on_chunk_latency_window(window.average, window.total_chunks);
                }

                match buffering {
                    ChunkBuffering::Immediate => {
                        // Text buffered under an earlier profile goes out first.
                        flush_pending(request, emitter);
                        emitter.emit(ClientEvent::ChunkReceived { request_id, text });
                    }
                    ChunkBuffering::Buffered { size } => {
                        request.pending_text.push_str(&text);
                        if request.pending_text.len() >= size {
                            flush_pending(request, emitter);
                        }
                    }
                }
            }
            ChunkPayload::Metadata(metadata) => {
                tracing::debug!(request_id = %request_id, metadata = %metadata, "chunk metadata");
            }
            ChunkPayload::Error(message) => {
                tracing::warn!(request_id = %request_id, message = %message, "in-band chunk error");
                flush_pending(request, emitter);
                emitter.hooks().on_request_error(&request_id, &message, true);
                emitter.emit(ClientEvent::RequestError {
                    request_id,
                    message,
                    recoverable: true,
                });
            }
            ChunkPayload::Binary { kind } => {
                tracing::debug!(request_id = %request_id, kind = %kind, "binary chunk not surfaced");
            }
        }
    }

    fn on_complete(&mut self, request_id: RequestId, raw: &str, emitter: &EventEmitter) {
        let Some(mut request) = self.requests.remove(request_id.as_str()) else {
            let reason = DropReason::UnknownRequest {
                request_id,
                status: "complete",
            };
            self.drop_frame(reason, raw, emitter);
            return;
        };

        flush_pending(&mut request, emitter);
        request.status = RequestStatus::Complete;
        tracing::debug!(
            event = "request_complete",
            request_id = %request.id,
            chunks = request.chunk_count,
        );
        emitter
            .hooks()
            .on_request_complete(&request.id, request.chunk_count);
        emitter.emit(ClientEvent::RequestComplete {
            request_id: request.id,
        });
    }

    fn on_error(
        &mut self,
        request_id: RequestId,
        message: String,
        recoverable: bool,
        raw: &str,
        emitter: &EventEmitter,
    ) {
        if !self.requests.contains_key(request_id.as_str()) {
            let reason = DropReason::UnknownRequest {
                request_id,
                status: "error",
            };
            self.drop_frame(reason, raw, emitter);
            return;
        }

        if recoverable && self.active_profile().use_recoverable_errors {
            tracing::warn!(
                event = "request_error",
                request_id = %request_id,
                recoverable = true,
                message = %message,
            );
            emitter.hooks().on_request_error(&request_id, &message, true);
            emitter.emit(ClientEvent::RequestError {
                request_id,
                message,
                recoverable: true,
            });
            return;
        }

        let Some(mut request) = self.requests.remove(request_id.as_str()) else {
            return;
        };
        flush_pending(&mut request, emitter);
        request.status = RequestStatus::Errored;
        tracing::warn!(
            event = "request_error",
            request_id = %request.id,
            recoverable = false,
            message = %message,
        );
        emitter.hooks().on_request_error(&request.id, &message, false);
        emitter.emit(ClientEvent::RequestError {
            request_id: request.id,
            message,
            recoverable: false,
        });
    }

    fn drop_frame(&self, reason: DropReason, raw: &str, emitter: &EventEmitter) {
        tracing::warn!(
            event = "frame_dropped",
            reason = reason.as_str(),
            detail = %reason,
            excerpt = %excerpt(raw, DROPPED_EXCERPT_CHARS),
        );
        emitter.hooks().on_frame_dropped(&reason);
    }
}

fn flush_pending(request: &mut Request, emitter: &EventEmitter) {
    if request.pending_text.is_empty() {
        return;
    }

    let text = std::mem::take(&mut request.pending_text);
    emitter.emit(ClientEvent::ChunkReceived {
        request_id: request.id.clone(),
        text,
    });
}
