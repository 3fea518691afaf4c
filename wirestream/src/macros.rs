/// Creates a validated [`BackendConfig`](crate::BackendConfig).
///
/// ```rust
/// use wirestream::ws_backend;
///
/// let local = ws_backend!("localhost", 8000).expect("valid backend");
/// assert_eq!(local.websocket_url(), "ws://localhost:8000/ws/chat");
///
/// let secure = ws_backend!("chat.example", 443, tls).expect("valid backend");
/// assert_eq!(secure.websocket_url(), "wss://chat.example:443/ws/chat");
///
/// let custom = ws_backend!("localhost", 9000, path = "/stream").expect("valid backend");
/// assert_eq!(custom.websocket_url(), "ws://localhost:9000/stream");
///
/// assert!(ws_backend!("", 8000).is_err());
/// ```
#[macro_export]
macro_rules! ws_backend {
    ($host:expr, $port:expr $(,)?) => {
        $crate::BackendConfig::new($host, $port, false)
    };
    ($host:expr, $port:expr, tls $(,)?) => {
        $crate::BackendConfig::new($host, $port, true)
    };
    ($host:expr, $port:expr, path = $path:expr $(,)?) => {
        $crate::BackendConfig::new($host, $port, false).and_then(|backend| backend.with_path($path))
    };
    ($host:expr, $port:expr, tls, path = $path:expr $(,)?) => {
        $crate::BackendConfig::new($host, $port, true).and_then(|backend| backend.with_path($path))
    };
}

/// Builds an [`OutboundEnvelope`](crate::protocol::OutboundEnvelope) for a
/// chat turn or a frontend command, with a fresh request id.
///
/// ```rust
/// use wirestream::ws_envelope;
/// use wirestream::protocol::{FrontendCommand, OutboundAction};
///
/// let chat = ws_envelope!(chat => "hello");
/// assert_eq!(chat.action, OutboundAction::Chat);
///
/// let ping = ws_envelope!(command => FrontendCommand::Ping);
/// assert_eq!(ping.action, OutboundAction::FrontendCommand);
/// assert_ne!(chat.request_id, ping.request_id);
/// ```
#[macro_export]
macro_rules! ws_envelope {
    (chat => $text:expr $(,)?) => {
        $crate::protocol::OutboundEnvelope::chat(&$crate::new_request_id(), $text)
    };
    (command => $command:expr $(,)?) => {
        $crate::protocol::OutboundEnvelope::command(&$crate::new_request_id(), $command)
    };
    ($kind:ident => $value:expr $(,)?) => {
        compile_error!("unsupported envelope kind: use chat or command");
    };
}
