//! Clone-able handle to the background session.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use wsession::testing::ScriptedTransport;
//! use wsession::{BackendConfig, ClientConfig, ClientEvent, StreamClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ScriptedTransport::new();
//! let remote = transport.accept();
//! let config = ClientConfig::builder(BackendConfig::default()).build()?;
//!
//! let (client, mut events) = StreamClient::builder(config, Arc::new(transport)).spawn()?;
//! while let Some(event) = events.recv().await {
//!     if let ClientEvent::Connected { .. } = event {
//!         break;
//!     }
//! }
//!
//! let request_id = client.send("hello").await?;
//! assert_eq!(remote.sent().len(), 1);
//! println!("sent {request_id}");
//!
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;
use wcommon::RequestId;

use crate::machine::{Command, SessionMachine};
use crate::protocol::{FrontendCommand, OutboundEnvelope};
use crate::transport::Transport;
use crate::{
    BackendConfig, ClientConfig, ClientError, ClientHooks, ClientStatus, ConfigError,
    EventEmitter, EventReceiver, NoopClientHooks, RequestKind,
};

pub struct StreamClientBuilder {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    hooks: Arc<dyn ClientHooks>,
    jitter_seed: Option<u64>,
    user_id: Option<String>,
}

impl StreamClientBuilder {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            hooks: Arc::new(NoopClientHooks),
            jitter_seed: None,
            user_id: None,
        }
    }

    pub fn hooks(mut self, hooks: Arc<dyn ClientHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Seeds the reconnect jitter source for reproducible delays.
    pub fn jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    /// Attaches `user_id` to every outbound envelope.
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Validates the configuration and spawns the session task on the current
    /// tokio runtime.
    pub fn spawn(self) -> Result<(StreamClient, EventReceiver), ConfigError> {
        self.config.validate()?;

        let rng = match self.jitter_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (emitter, events) = EventEmitter::channel(self.hooks);
        let (commands, receiver) = mpsc::channel(self.config.command_capacity);

        let machine = SessionMachine::new(self.config, self.transport, emitter, rng);
        let task = tokio::spawn(machine.run(receiver));

        let client = StreamClient {
            commands,
            task: Arc::new(Mutex::new(Some(task))),
            user_id: self.user_id.map(Arc::from),
        };
        Ok((client, events))
    }
}

#[derive(Clone)]
pub struct StreamClient {
    commands: mpsc::Sender<Command>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
    user_id: Option<Arc<str>>,
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl StreamClient {
    pub fn builder(config: ClientConfig, transport: Arc<dyn Transport>) -> StreamClientBuilder {
        StreamClientBuilder::new(config, transport)
    }

    /// Starts connecting when idle or after reconnection gave up.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.post(Command::Connect).await
    }

    /// Drops any live session, resets the attempt counter, and connects again.
    pub async fn reconnect(&self) -> Result<(), ClientError> {
        self.post(Command::Reconnect).await
    }

    /// Submits a chat turn and returns its client-generated request id.
    pub async fn send(&self, text: impl Into<String>) -> Result<RequestId, ClientError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ClientError::invalid_request("message text must not be empty"));
        }

        let request_id = new_request_id();
        let envelope = self.stamp(OutboundEnvelope::chat(&request_id, text));
        self.submit(request_id, RequestKind::Chat, envelope).await
    }

    pub async fn send_command(&self, command: FrontendCommand) -> Result<RequestId, ClientError> {
        let request_id = new_request_id();
        let envelope = self.stamp(OutboundEnvelope::command(&request_id, command));
        self.submit(request_id, RequestKind::Command(command), envelope)
            .await
    }

    pub async fn ping(&self) -> Result<RequestId, ClientError> {
        self.send_command(FrontendCommand::Ping).await
    }

    pub async fn get_history(&self) -> Result<RequestId, ClientError> {
        self.send_command(FrontendCommand::GetHistory).await
    }

    pub async fn clear_history(&self) -> Result<RequestId, ClientError> {
        self.send_command(FrontendCommand::ClearHistory).await
    }

    pub async fn get_config(&self) -> Result<RequestId, ClientError> {
        self.send_command(FrontendCommand::GetConfig).await
    }

    /// Points the client at a new backend. An active client reconnects there.
    pub async fn set_backend(&self, backend: BackendConfig) -> Result<(), ClientError> {
        backend
            .validate()
            .map_err(|error| ClientError::invalid_request(error.to_string()))?;

        let (reply, ack) = oneshot::channel();
        self.post(Command::SetBackend { backend, reply }).await?;
        ack.await.map_err(|_| session_gone())
    }

    pub async fn status(&self) -> Result<ClientStatus, ClientError> {
        let (reply, answer) = oneshot::channel();
        self.post(Command::Status { reply }).await?;
        answer.await.map_err(|_| session_gone())
    }

    /// Stops the session: cancels any pending reconnect, closes the live
    /// transport, and errors open requests. Returns once the task has exited.
    /// Calling it again is a no-op.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        let (reply, ack) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).await.is_ok() {
            let _ = ack.await;
        }

        let task = self.task.lock().await.take();
        if let Some(task) = task {
            task.await
                .map_err(|error| ClientError::shut_down(format!("session task failed: {error}")))?;
        }

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn submit(
        &self,
        request_id: RequestId,
        kind: RequestKind,
        envelope: OutboundEnvelope,
    ) -> Result<RequestId, ClientError> {
        let frame = envelope.to_json()?;
        let (reply, answer) = oneshot::channel();
        self.post(Command::Submit {
            request_id,
            kind,
            frame,
            reply,
        })
        .await?;
        answer.await.map_err(|_| session_gone())?
    }

    async fn post(&self, command: Command) -> Result<(), ClientError> {
        self.commands.send(command).await.map_err(|_| session_gone())
    }

    fn stamp(&self, envelope: OutboundEnvelope) -> OutboundEnvelope {
        match &self.user_id {
            Some(user_id) => envelope.with_user_id(user_id.to_string()),
            None => envelope,
        }
    }
}

/// Fresh UUID v4 request id, the form the client stamps on outbound envelopes.
pub fn new_request_id() -> RequestId {
    RequestId::new(Uuid::new_v4().to_string())
}

fn session_gone() -> ClientError {
    ClientError::shut_down("session task is no longer running")
}
