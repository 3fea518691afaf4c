//! Wire format for inbound status frames and outbound envelopes.
//!
//! ```rust
//! use wsession::protocol::{FrameBody, parse_frame};
//!
//! let frame = parse_frame(r#"{"request_id":"r1","status":"chunk","chunk":{"text":"Hel"}}"#)
//!     .expect("valid frame");
//! assert_eq!(frame.request_id.as_str(), "r1");
//! assert!(matches!(frame.body, FrameBody::Chunk(_)));
//!
//! assert!(parse_frame(r#"{"status":"complete"}"#).is_err());
//! ```

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wcommon::RequestId;
use wprovider::ProviderInfo;

use crate::ClientError;

pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub request_id: RequestId,
    pub body: FrameBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameBody {
    Processing { provider_info: Option<ProviderInfo> },
    Chunk(ChunkPayload),
    Complete,
    Error { message: String, recoverable: bool },
}

impl FrameBody {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Processing { .. } => "processing",
            Self::Chunk(_) => "chunk",
            Self::Complete => "complete",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChunkPayload {
    Text(String),
    Metadata(Value),
    /// In-band error chunk; informational, the request stays open.
    Error(String),
    /// Image, audio, or other binary payloads. Only the declared kind is kept.
    Binary { kind: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRejection {
    Malformed(String),
    MissingRequestId,
    MissingStatus,
    UnknownStatus(String),
    MissingChunk,
    UnknownChunkType(String),
}

impl FrameRejection {
    /// Low-cardinality label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::MissingRequestId => "missing_request_id",
            Self::MissingStatus => "missing_status",
            Self::UnknownStatus(_) => "unknown_status",
            Self::MissingChunk => "missing_chunk",
            Self::UnknownChunkType(_) => "unknown_chunk_type",
        }
    }
}

impl Display for FrameRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(detail) => write!(f, "malformed frame: {detail}"),
            Self::MissingRequestId => f.write_str("frame has no request_id"),
            Self::MissingStatus => f.write_str("frame has no status"),
            Self::UnknownStatus(status) => write!(f, "unknown status '{status}'"),
            Self::MissingChunk => f.write_str("chunk frame carries no chunk text"),
            Self::UnknownChunkType(kind) => write!(f, "unknown chunk type '{kind}'"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    chunk: Option<WireChunk>,
    #[serde(default)]
    recoverable: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireChunk {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    metadata: Option<Value>,
}

/// Parses one raw text frame. Parsing never panics; every defect maps to a
/// [`FrameRejection`].
pub fn parse_frame(raw: &str) -> Result<InboundFrame, FrameRejection> {
    let wire: WireFrame =
        serde_json::from_str(raw).map_err(|error| FrameRejection::Malformed(error.to_string()))?;

    let request_id = match wire.request_id {
        Some(id) if !id.trim().is_empty() => RequestId::new(id),
        _ => return Err(FrameRejection::MissingRequestId),
    };
    let status = wire.status.ok_or(FrameRejection::MissingStatus)?;

    let body = match status.as_str() {
        "processing" => FrameBody::Processing {
            provider_info: wire
                .chunk
                .as_ref()
                .and_then(|chunk| chunk.metadata.as_ref())
                .and_then(|metadata| metadata.get("provider_info"))
                .and_then(ProviderInfo::from_value),
        },
        "chunk" => FrameBody::Chunk(parse_chunk(wire.chunk.ok_or(FrameRejection::MissingChunk)?)?),
        "complete" => FrameBody::Complete,
        "error" => FrameBody::Error {
            message: wire
                .message
                .or(wire.error)
                .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
            recoverable: wire.recoverable.unwrap_or(false),
        },
        _ => return Err(FrameRejection::UnknownStatus(status)),
    };

    Ok(InboundFrame { request_id, body })
}

fn parse_chunk(chunk: WireChunk) -> Result<ChunkPayload, FrameRejection> {
    if let Some(text) = chunk.text {
        return Ok(ChunkPayload::Text(text));
    }

    let kind = chunk.kind.ok_or(FrameRejection::MissingChunk)?;
    match kind.as_str() {
        "text" => Ok(ChunkPayload::Text(value_text(chunk.data))),
        "metadata" => Ok(ChunkPayload::Metadata(chunk.data.unwrap_or(Value::Null))),
        "error" => Ok(ChunkPayload::Error(value_text(chunk.data))),
        "image" | "audio" | "binary" => Ok(ChunkPayload::Binary { kind }),
        _ => Err(FrameRejection::UnknownChunkType(kind)),
    }
}

fn value_text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(text)) => text,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Commands the frontend can issue besides chat turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontendCommand {
    Ping,
    GetHistory,
    ClearHistory,
    GetConfig,
}

impl FrontendCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::GetHistory => "get_history",
            Self::ClearHistory => "clear_history",
            Self::GetConfig => "get_config",
        }
    }
}

impl Display for FrontendCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundAction {
    Chat,
    FrontendCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutboundPayload {
    Chat { text: String },
    Command { command: FrontendCommand },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEnvelope {
    pub action: OutboundAction,
    pub payload: OutboundPayload,
    pub request_id: String,
    pub user_id: Option<String>,
}

impl OutboundEnvelope {
    pub fn chat(request_id: &RequestId, text: impl Into<String>) -> Self {
        Self {
            action: OutboundAction::Chat,
            payload: OutboundPayload::Chat { text: text.into() },
            request_id: request_id.to_string(),
            user_id: None,
        }
    }

    pub fn command(request_id: &RequestId, command: FrontendCommand) -> Self {
        Self {
            action: OutboundAction::FrontendCommand,
            payload: OutboundPayload::Command { command },
            request_id: request_id.to_string(),
            user_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn to_json(&self) -> Result<String, ClientError> {
        serde_json::to_string(self).map_err(|error| {
            ClientError::invalid_request(format!("failed to encode outbound frame: {error}"))
        })
    }
}

/// First `max_chars` characters of `raw`, for log excerpts.
pub fn excerpt(raw: &str, max_chars: usize) -> String {
    match raw.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &raw[..index]),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wprovider::ProviderId;

    use super::*;

    #[test]
    fn parses_each_status() {
        let processing = parse_frame(
            &json!({
                "request_id": "r1",
                "status": "processing",
                "chunk": { "metadata": { "provider_info": {
                    "provider": "Anthropic",
                    "model": "claude-sonnet-4",
                    "orchestrator_type": "langgraph"
                }}}
            })
            .to_string(),
        )
        .expect("processing");
        match processing.body {
            FrameBody::Processing {
                provider_info: Some(info),
            } => {
                assert_eq!(info.provider_id(), ProviderId::Anthropic);
                assert_eq!(info.model, "claude-sonnet-4");
            }
            other => panic!("unexpected body: {other:?}"),
        }

        let complete = parse_frame(r#"{"request_id":"r1","status":"complete"}"#).expect("complete");
        assert_eq!(complete.body, FrameBody::Complete);

        let error = parse_frame(r#"{"request_id":"r1","status":"error","message":"rate limited","recoverable":true}"#)
            .expect("error");
        assert_eq!(
            error.body,
            FrameBody::Error {
                message: "rate limited".to_string(),
                recoverable: true,
            }
        );
    }

    #[test]
    fn error_message_falls_back_and_recoverable_defaults_false() {
        let legacy = parse_frame(r#"{"request_id":"r1","status":"error","error":"boom"}"#)
            .expect("legacy error");
        assert_eq!(
            legacy.body,
            FrameBody::Error {
                message: "boom".to_string(),
                recoverable: false,
            }
        );

        let bare = parse_frame(r#"{"request_id":"r1","status":"error"}"#).expect("bare error");
        assert_eq!(
            bare.body,
            FrameBody::Error {
                message: UNKNOWN_ERROR_MESSAGE.to_string(),
                recoverable: false,
            }
        );
    }

    #[test]
    fn typed_chunks_map_to_payload_variants() {
        let cases = [
            (json!({ "type": "text", "data": "hi" }), ChunkPayload::Text("hi".to_string())),
            (
                json!({ "type": "metadata", "data": { "tokens": 3 } }),
                ChunkPayload::Metadata(json!({ "tokens": 3 })),
            ),
            (
                json!({ "type": "error", "data": "tool failed" }),
                ChunkPayload::Error("tool failed".to_string()),
            ),
            (
                json!({ "type": "image", "data": "aGk=" }),
                ChunkPayload::Binary {
                    kind: "image".to_string(),
                },
            ),
        ];

        for (chunk, expected) in cases {
            let raw = json!({ "request_id": "r", "status": "chunk", "chunk": chunk }).to_string();
            assert_eq!(parse_frame(&raw).expect("chunk").body, FrameBody::Chunk(expected));
        }
    }

    #[test]
    fn malformed_frames_are_rejected_without_panicking() {
        let cases = [
            ("not json", "malformed"),
            ("[1,2,3]", "malformed"),
            (r#"{"request_id":7,"status":"chunk"}"#, "malformed"),
            (r#"{"status":"chunk","chunk":{"text":"x"}}"#, "missing_request_id"),
            (r#"{"request_id":"","status":"chunk"}"#, "missing_request_id"),
            (r#"{"request_id":"r"}"#, "missing_status"),
            (r#"{"request_id":"r","status":"queued"}"#, "unknown_status"),
            (r#"{"request_id":"r","status":"chunk"}"#, "missing_chunk"),
            (r#"{"request_id":"r","status":"chunk","chunk":{}}"#, "missing_chunk"),
            (
                r#"{"request_id":"r","status":"chunk","chunk":{"type":"video"}}"#,
                "unknown_chunk_type",
            ),
        ];

        for (raw, reason) in cases {
            let rejection = parse_frame(raw).expect_err(raw);
            assert_eq!(rejection.as_str(), reason, "{raw}");
        }
    }

    #[test]
    fn outbound_envelopes_serialize_to_the_backend_shape() {
        let chat = OutboundEnvelope::chat(&RequestId::from("abc"), "hello")
            .to_json()
            .expect("encode");
        let value: Value = serde_json::from_str(&chat).expect("json");
        assert_eq!(
            value,
            json!({
                "action": "chat",
                "payload": { "text": "hello" },
                "request_id": "abc",
                "user_id": null
            })
        );

        let command = OutboundEnvelope::command(&RequestId::from("c1"), FrontendCommand::GetHistory)
            .with_user_id("u-9")
            .to_json()
            .expect("encode");
        let value: Value = serde_json::from_str(&command).expect("json");
        assert_eq!(
            value,
            json!({
                "action": "frontend_command",
                "payload": { "command": "get_history" },
                "request_id": "c1",
                "user_id": "u-9"
            })
        );
    }

    #[test]
    fn excerpt_truncates_on_char_boundaries() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("héllo wörld", 5), "héllo...");
    }
}
