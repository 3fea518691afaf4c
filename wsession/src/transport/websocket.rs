//! WebSocket transport over `tokio-tungstenite`.
//!
//! Liveness is ping driven: after `ping_interval` without inbound traffic a
//! ping is sent, and if nothing arrives within `ping_timeout` afterwards the
//! session reports [`TransportErrorKind::PingTimeout`].

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use http::HeaderValue;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_with_config};
use wcommon::BoxFuture;
use wprovider::CompressionMode;

use super::{ConnectParams, Transport, TransportFrame, TransportSession};
use crate::{TransportError, TransportErrorKind};

pub const USER_AGENT: &str = concat!("wirestream/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    disable_nagle: bool,
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self {
            disable_nagle: true,
        }
    }

    pub fn with_nagle(mut self, enabled: bool) -> Self {
        self.disable_nagle = !enabled;
        self
    }
}

impl Transport for WebSocketTransport {
    fn open<'a>(
        &'a self,
        url: &'a str,
        params: &'a ConnectParams,
    ) -> BoxFuture<'a, Result<Box<dyn TransportSession>, TransportError>> {
        Box::pin(async move {
            let mut request = url.into_client_request().map_err(|error| {
                TransportError::connect(format!("invalid websocket url {url}: {error}"))
                    .with_retryable(false)
            })?;
            request
                .headers_mut()
                .insert(http::header::USER_AGENT, HeaderValue::from_static(USER_AGENT));

            let config = WebSocketConfig::default()
                .max_message_size(Some(params.max_message_size))
                .max_frame_size(Some(params.max_message_size));
            if params.compression == CompressionMode::Deflate {
                tracing::debug!(url, "permessage-deflate requested; not negotiated by this transport");
            }

            let (stream, response) =
                connect_async_with_config(request, Some(config), self.disable_nagle)
                    .await
                    .map_err(|error| transport_error(error, TransportErrorKind::Connect))?;
            tracing::debug!(url, status = %response.status(), "websocket handshake complete");

            let session: Box<dyn TransportSession> =
                Box::new(WebSocketSession::new(stream, params));
            Ok(session)
        })
    }
}

struct WebSocketSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    ping_interval: Duration,
    ping_timeout: Duration,
    last_traffic: Instant,
    ping_sent_at: Option<Instant>,
}

impl WebSocketSession {
    fn new(stream: WebSocketStream<MaybeTlsStream<TcpStream>>, params: &ConnectParams) -> Self {
        Self {
            stream,
            ping_interval: params.ping_interval,
            ping_timeout: params.ping_timeout,
            last_traffic: Instant::now(),
            ping_sent_at: None,
        }
    }

    fn liveness_deadline(&self) -> Instant {
        match self.ping_sent_at {
            Some(sent) => sent + self.ping_timeout,
            None => self.last_traffic + self.ping_interval,
        }
    }
}

impl TransportSession for WebSocketSession {
    fn send<'a>(&'a mut self, text: String) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            self.stream
                .send(Message::text(text))
                .await
                .map_err(|error| transport_error(error, TransportErrorKind::Io))
        })
    }

    fn receive<'a>(&'a mut self) -> BoxFuture<'a, TransportFrame> {
        Box::pin(async move {
            loop {
                let deadline = self.liveness_deadline();
                match tokio::time::timeout_at(deadline, self.stream.next()).await {
                    Ok(Some(Ok(message))) => {
                        self.last_traffic = Instant::now();
                        self.ping_sent_at = None;
                        match message {
                            Message::Text(text) => return TransportFrame::Text(text.to_string()),
                            Message::Close(frame) => {
                                return TransportFrame::Closed(
                                    frame.map(|frame| frame.reason.to_string()),
                                );
                            }
                            Message::Binary(payload) => {
                                tracing::debug!(bytes = payload.len(), "ignoring binary websocket frame");
                            }
                            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
                        }
                    }
                    Ok(Some(Err(error))) => {
                        return TransportFrame::Error(transport_error(error, TransportErrorKind::Io));
                    }
                    Ok(None) => return TransportFrame::Closed(None),
                    Err(_) if self.ping_sent_at.is_some() => {
                        return TransportFrame::Error(TransportError::ping_timeout(format!(
                            "no traffic within {:?} after ping",
                            self.ping_timeout
                        )));
                    }
                    Err(_) => {
                        if let Err(error) = self.stream.send(Message::Ping(Default::default())).await {
                            return TransportFrame::Error(transport_error(
                                error,
                                TransportErrorKind::Io,
                            ));
                        }
                        tracing::trace!("idle connection; ping sent");
                        self.ping_sent_at = Some(Instant::now());
                    }
                }
            }
        })
    }

    fn close<'a>(&'a mut self) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            match self.stream.close(None).await {
                Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
                Err(error) => Err(transport_error(error, TransportErrorKind::Io)),
            }
        })
    }
}

fn transport_error(error: WsError, fallback: TransportErrorKind) -> TransportError {
    let message = error.to_string();
    match error {
        WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::closed(message),
        WsError::Io(_) if fallback == TransportErrorKind::Connect => TransportError::connect(message),
        WsError::Io(_) => TransportError::io(message),
        WsError::Capacity(_) | WsError::Protocol(_) => TransportError::protocol(message),
        _ => TransportError::new(fallback, message),
    }
}
