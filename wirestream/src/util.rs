//! Small convenience helpers for common client flows.

use crate::{BackendConfig, ClientEvent, EventReceiver, ProviderId, RequestId};

pub fn local_backend() -> BackendConfig {
    BackendConfig::default()
}

/// Lenient provider name parsing with common aliases. Unrecognized names map
/// to `None` rather than [`ProviderId::Unknown`].
pub fn parse_provider_id(value: &str) -> Option<ProviderId> {
    match value.trim().to_ascii_lowercase().as_str() {
        "anthropic" | "claude" => Some(ProviderId::Anthropic),
        "openai" | "open-ai" | "gpt" => Some(ProviderId::OpenAi),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectedResponse {
    pub text: String,
    pub chunks: usize,
    /// Informational errors reported while the request stayed open.
    pub warnings: Vec<String>,
    /// Terminal error, when the request did not complete.
    pub error: Option<String>,
}

impl CollectedResponse {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Drains `events` until `request_id` completes or fails, concatenating its
/// chunk text. Events for other requests and status events are discarded.
pub async fn collect_response(
    events: &mut EventReceiver,
    request_id: &RequestId,
) -> CollectedResponse {
    let mut response = CollectedResponse::default();

    while let Some(event) = events.recv().await {
        if event.request_id() != Some(request_id) {
            continue;
        }

        match event {
            ClientEvent::ChunkReceived { text, .. } => {
                response.text.push_str(&text);
                response.chunks += 1;
            }
            ClientEvent::RequestComplete { .. } => return response,
            ClientEvent::RequestError {
                message,
                recoverable: true,
                ..
            } => response.warnings.push(message),
            ClientEvent::RequestError { message, .. } => {
                response.error = Some(message);
                return response;
            }
            _ => {}
        }
    }

    response.error = Some("event channel closed".to_string());
    response
}
