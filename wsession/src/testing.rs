//! In-memory scripted transport for exercising the session without a network.
//!
//! Compiled for tests and behind the `testing` feature.
//!
//! Each call to [`ScriptedTransport::accept`] or [`ScriptedTransport::fail`]
//! queues the outcome of one future `open`. An accepted connection is driven
//! through its [`ScriptedRemote`]: push frames in, inspect what was sent.
//! Keep the remote alive for as long as the connection should stay up;
//! dropping it reads as the peer closing the socket.
//!
//! ```rust
//! use wsession::testing::ScriptedTransport;
//!
//! let transport = ScriptedTransport::new();
//! transport.fail("connection refused");
//! let remote = transport.accept();
//! remote.push_text(r#"{"request_id":"r1","status":"processing"}"#);
//!
//! assert_eq!(transport.pending_outcomes(), 2);
//! assert!(remote.sent().is_empty());
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::mpsc;
use wcommon::BoxFuture;

use crate::transport::{ConnectParams, Transport, TransportFrame, TransportSession};
use crate::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRecord {
    pub url: String,
    pub params: ConnectParams,
}

#[derive(Debug)]
enum ScriptedOpen {
    Accept(ScriptedSession),
    Fail(TransportError),
}

#[derive(Debug, Default)]
struct ScriptState {
    outcomes: VecDeque<ScriptedOpen>,
    opens: Vec<OpenRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an open that succeeds, returning the peer side of that connection.
    pub fn accept(&self) -> ScriptedRemote {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));

        self.lock().outcomes.push_back(ScriptedOpen::Accept(ScriptedSession {
            frames: frames_rx,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        }));

        ScriptedRemote {
            frames: frames_tx,
            sent,
            closed,
        }
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.fail_with(TransportError::connect(message));
    }

    pub fn fail_with(&self, error: TransportError) {
        self.lock().outcomes.push_back(ScriptedOpen::Fail(error));
    }

    pub fn opens(&self) -> Vec<OpenRecord> {
        self.lock().opens.clone()
    }

    pub fn open_count(&self) -> usize {
        self.lock().opens.len()
    }

    pub fn pending_outcomes(&self) -> usize {
        self.lock().outcomes.len()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for ScriptedTransport {
    fn open<'a>(
        &'a self,
        url: &'a str,
        params: &'a ConnectParams,
    ) -> BoxFuture<'a, Result<Box<dyn TransportSession>, TransportError>> {
        Box::pin(async move {
            let outcome = {
                let mut state = self.lock();
                state.opens.push(OpenRecord {
                    url: url.to_string(),
                    params: params.clone(),
                });
                state.outcomes.pop_front()
            };

            match outcome {
                Some(ScriptedOpen::Accept(session)) => {
                    let session: Box<dyn TransportSession> = Box::new(session);
                    Ok(session)
                }
                Some(ScriptedOpen::Fail(error)) => Err(error),
                None => Err(TransportError::connect("no scripted connection available")),
            }
        })
    }
}

/// Peer side of one accepted scripted connection.
#[derive(Debug)]
pub struct ScriptedRemote {
    frames: mpsc::UnboundedSender<TransportFrame>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl ScriptedRemote {
    pub fn push_text(&self, text: impl Into<String>) {
        self.push(TransportFrame::Text(text.into()));
    }

    pub fn push_json(&self, value: &Value) {
        self.push_text(value.to_string());
    }

    pub fn close(&self, reason: impl Into<String>) {
        self.push(TransportFrame::Closed(Some(reason.into())));
    }

    pub fn fail(&self, error: TransportError) {
        self.push(TransportFrame::Error(error));
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sent_json(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .filter_map(|text| serde_json::from_str(text).ok())
            .collect()
    }

    /// Whether the client side closed this connection.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn push(&self, frame: TransportFrame) {
        if self.frames.send(frame).is_err() {
            tracing::trace!("scripted session already dropped");
        }
    }
}

#[derive(Debug)]
struct ScriptedSession {
    frames: mpsc::UnboundedReceiver<TransportFrame>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl TransportSession for ScriptedSession {
    fn send<'a>(&'a mut self, text: String) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            if self.closed.load(Ordering::SeqCst) {
                return Err(TransportError::closed("scripted session is closed"));
            }

            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(text);
            Ok(())
        })
    }

    fn receive<'a>(&'a mut self) -> BoxFuture<'a, TransportFrame> {
        Box::pin(async move {
            match self.frames.recv().await {
                Some(frame) => frame,
                None => TransportFrame::Closed(None),
            }
        })
    }

    fn close<'a>(&'a mut self) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        })
    }
}
