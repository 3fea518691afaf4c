//! Background session actor.
//!
//! One task owns the live transport session, the dispatcher, and the
//! reconnect state. Callers talk to it through [`Command`]s and observe it
//! through the ordered event channel; nothing else mutates session state.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use wcommon::{RequestId, SessionId};
use wprovider::ProviderProfile;

use crate::events::{CLIENT_SHUTDOWN, CONNECTION_LOST};
use crate::transport::{ConnectParams, Transport, TransportFrame, TransportSession};
use crate::{
    BackendConfig, ClientConfig, ClientError, ClientEvent, ClientStatus, ConnectionState,
    DisconnectCause, Dispatcher, EventEmitter, ReconnectDecision, ReconnectPolicy, ReconnectState,
    RequestKind, TransportError, TransportErrorKind,
};

const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) enum Command {
    Connect,
    Reconnect,
    Submit {
        request_id: RequestId,
        kind: RequestKind,
        frame: String,
        reply: oneshot::Sender<Result<RequestId, ClientError>>,
    },
    SetBackend {
        backend: BackendConfig,
        reply: oneshot::Sender<()>,
    },
    Status {
        reply: oneshot::Sender<ClientStatus>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for a command; nothing scheduled.
    Idle,
    ConnectNow,
    Backoff { until: Instant },
    Streaming,
    /// Reconnection gave up; waiting for a manual reconnect.
    Exhausted,
    Stopped,
}

enum Flow {
    Continue,
    Stop,
}

enum Step {
    Frame(TransportFrame),
    Command(Option<Command>),
}

enum ConnectOutcome {
    Opened(Result<Box<dyn TransportSession>, TransportError>),
    Restart(DisconnectCause),
    Shutdown(Option<oneshot::Sender<()>>),
}

struct LiveSession {
    id: SessionId,
    transport: Box<dyn TransportSession>,
    opened_at: Instant,
    last_activity: Instant,
}

pub(crate) struct SessionMachine {
    backend: BackendConfig,
    policy: ReconnectPolicy,
    transport: Arc<dyn Transport>,
    emitter: EventEmitter,
    dispatcher: Dispatcher,
    state: ConnectionState,
    phase: Phase,
    live: Option<LiveSession>,
    next_session_id: SessionId,
    reconnect: ReconnectState,
    /// Profile applied to the next open; upgraded by detection.
    best_known: Arc<ProviderProfile>,
    rng: StdRng,
}

impl SessionMachine {
    pub(crate) fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        emitter: EventEmitter,
        rng: StdRng,
    ) -> Self {
        let phase = if config.auto_connect {
            Phase::ConnectNow
        } else {
            Phase::Idle
        };

        Self {
            best_known: config.profiles.unknown(),
            dispatcher: Dispatcher::new(Arc::clone(&config.profiles)),
            backend: config.backend,
            policy: config.reconnect,
            transport,
            emitter,
            state: ConnectionState::Disconnected,
            phase,
            live: None,
            next_session_id: SessionId::initial(),
            reconnect: ReconnectState::default(),
            rng,
        }
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        tracing::debug!(url = %self.backend.websocket_url(), "session actor started");

        loop {
            let flow = match self.phase {
                Phase::Stopped => Flow::Stop,
                Phase::Idle | Phase::Exhausted => match commands.recv().await {
                    Some(command) => self.handle_command(command).await,
                    None => self.stop_orphaned().await,
                },
                Phase::ConnectNow => self.connect(&mut commands).await,
                Phase::Backoff { until } => {
                    let command = tokio::select! {
                        () = tokio::time::sleep_until(until) => None,
                        command = commands.recv() => Some(command),
                    };
                    match command {
                        None => {
                            self.phase = Phase::ConnectNow;
                            Flow::Continue
                        }
                        Some(Some(command)) => self.handle_command(command).await,
                        Some(None) => self.stop_orphaned().await,
                    }
                }
                Phase::Streaming => self.stream_step(&mut commands).await,
            };

            if let Flow::Stop = flow {
                break;
            }
        }

        tracing::debug!("session actor stopped");
    }

    async fn handle_command(&mut self, command: Command) -> Flow {
        match command {
            Command::Connect => {
                if matches!(self.phase, Phase::Streaming) {
                    tracing::debug!("connect ignored; session already live");
                } else {
                    self.reconnect.reset();
                    self.phase = Phase::ConnectNow;
                }
            }
            Command::Reconnect => {
                self.teardown(DisconnectCause::ManualReconnect).await;
                self.reconnect.reset();
                self.phase = Phase::ConnectNow;
            }
            Command::SetBackend { backend, reply } => {
                tracing::info!(url = %backend.websocket_url(), "backend updated");
                self.backend = backend;
                if !matches!(self.phase, Phase::Idle) {
                    self.teardown(DisconnectCause::BackendChanged).await;
                    self.reconnect.reset();
                    self.phase = Phase::ConnectNow;
                }
                let _ = reply.send(());
            }
            Command::Submit {
                request_id,
                kind,
                frame,
                reply,
            } => {
                let result = self.submit(request_id, kind, frame).await;
                let _ = reply.send(result);
            }
            Command::Status { reply } => {
                let _ = reply.send(self.status());
            }
            Command::Shutdown { reply } => {
                self.shutdown().await;
                let _ = reply.send(());
                return Flow::Stop;
            }
        }

        Flow::Continue
    }

    async fn connect(&mut self, commands: &mut mpsc::Receiver<Command>) -> Flow {
        let attempt = self.reconnect.attempts();
        let url = self.backend.websocket_url();
        let params = ConnectParams::from_profile(&self.best_known);

        self.state = ConnectionState::Connecting;
        tracing::info!(
            event = "connecting",
            url = %url,
            attempt,
            provider = %self.best_known.provider,
        );
        self.emitter.emit(ClientEvent::Connecting { attempt });
        self.emitter.hooks().on_connect_attempt(attempt, &url);

        let transport = Arc::clone(&self.transport);
        let mut open = transport.open(&url, &params);
        let outcome = loop {
            tokio::select! {
                result = &mut open => break ConnectOutcome::Opened(result),
                command = commands.recv() => match command {
                    None => break ConnectOutcome::Shutdown(None),
                    Some(Command::Shutdown { reply }) => break ConnectOutcome::Shutdown(Some(reply)),
                    Some(Command::Reconnect) => {
                        break ConnectOutcome::Restart(DisconnectCause::ManualReconnect);
                    }
                    Some(Command::SetBackend { backend, reply }) => {
                        tracing::info!(url = %backend.websocket_url(), "backend updated");
                        self.backend = backend;
                        let _ = reply.send(());
                        break ConnectOutcome::Restart(DisconnectCause::BackendChanged);
                    }
                    Some(Command::Connect) => {}
                    Some(Command::Submit { request_id, reply, .. }) => {
                        let _ = reply.send(Err(ClientError::not_connected(format!(
                            "cannot send request {request_id}: connection is still opening"
                        ))));
                    }
                    Some(Command::Status { reply }) => {
                        let _ = reply.send(self.status());
                    }
                }
            }
        };
        drop(open);

        match outcome {
            ConnectOutcome::Opened(Ok(session)) => {
                self.on_opened(session, &url);
                Flow::Continue
            }
            ConnectOutcome::Opened(Err(error)) => {
                self.on_connect_failed(error, attempt);
                Flow::Continue
            }
            ConnectOutcome::Restart(cause) => {
                self.mark_disconnected(None, cause);
                self.reconnect.reset();
                self.phase = Phase::ConnectNow;
                Flow::Continue
            }
            ConnectOutcome::Shutdown(reply) => {
                self.shutdown().await;
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
                Flow::Stop
            }
        }
    }

    fn on_opened(&mut self, session: Box<dyn TransportSession>, url: &str) {
        let id = self.next_session_id;
        self.next_session_id = id.next();
        let now = Instant::now();
        self.live = Some(LiveSession {
            id,
            transport: session,
            opened_at: now,
            last_activity: now,
        });

        self.reconnect.reset();
        let applied = self
            .best_known
            .provider
            .is_known()
            .then(|| Arc::clone(&self.best_known));
        self.dispatcher.begin_session(applied);
        self.state = ConnectionState::Connected;
        self.phase = Phase::Streaming;

        tracing::info!(
            event = "connected",
            session_id = %id,
            url,
            provider = %self.best_known.provider,
        );
        self.emitter.hooks().on_connected(id, &self.best_known);
        self.emitter.emit(ClientEvent::Connected { session_id: id });
    }

    fn on_connect_failed(&mut self, error: TransportError, attempt: u32) {
        tracing::warn!(event = "connect_failed", attempt, error = %error);
        self.mark_disconnected(None, DisconnectCause::ConnectFailed(error.message));
        self.schedule_reconnect();
    }

    async fn stream_step(&mut self, commands: &mut mpsc::Receiver<Command>) -> Flow {
        let step = {
            let Some(live) = self.live.as_mut() else {
                self.phase = Phase::Idle;
                return Flow::Continue;
            };

            tokio::select! {
                frame = live.transport.receive() => Step::Frame(frame),
                command = commands.recv() => Step::Command(command),
            }
        };

        match step {
            Step::Frame(TransportFrame::Text(raw)) => {
                self.on_frame(&raw);
                Flow::Continue
            }
            Step::Frame(TransportFrame::Closed(reason)) => {
                let detail = reason.unwrap_or_else(|| "closed by peer".to_string());
                self.connection_lost(DisconnectCause::ConnectionLost(detail));
                Flow::Continue
            }
            Step::Frame(TransportFrame::Error(error)) => {
                let cause = if error.kind == TransportErrorKind::PingTimeout {
                    DisconnectCause::PingTimeout
                } else {
                    DisconnectCause::ConnectionLost(error.message)
                };
                self.connection_lost(cause);
                Flow::Continue
            }
            Step::Command(Some(command)) => self.handle_command(command).await,
            Step::Command(None) => self.stop_orphaned().await,
        }
    }

    fn on_frame(&mut self, raw: &str) {
        if let Some(live) = self.live.as_mut() {
            live.last_activity = Instant::now();
        }
        self.reconnect.reset();

        if let Some(detected) = self.dispatcher.dispatch(raw, &self.emitter) {
            tracing::info!(
                provider = %detected.provider,
                ping_interval_ms = detected.profile.ping_interval.as_millis() as u64,
                "provider profile applies from the next connect",
            );
            self.best_known = detected.profile;
        }
    }

    async fn submit(
        &mut self,
        request_id: RequestId,
        kind: RequestKind,
        frame: String,
    ) -> Result<RequestId, ClientError> {
        if self.live.is_none() {
            return Err(ClientError::not_connected(format!(
                "cannot send request {request_id}: not connected"
            )));
        }

        self.dispatcher.register(request_id.clone(), kind)?;
        let Some(live) = self.live.as_mut() else {
            self.dispatcher.forget(request_id.as_str());
            return Err(ClientError::not_connected("session closed during send"));
        };

        match live.transport.send(frame).await {
            Ok(()) => {
                tracing::debug!(event = "request_sent", request_id = %request_id, session_id = %live.id);
                Ok(request_id)
            }
            Err(error) => {
                tracing::warn!(event = "send_failed", request_id = %request_id, error = %error);
                self.dispatcher.forget(request_id.as_str());
                Err(error.into())
            }
        }
    }

    /// Live transport is gone without our say; error requests and back off.
    fn connection_lost(&mut self, cause: DisconnectCause) {
        let live = self.live.take();
        let failed = self.dispatcher.fail_all(CONNECTION_LOST, &self.emitter);

        if let Some(live) = &live {
            tracing::warn!(
                event = "disconnected",
                session_id = %live.id,
                cause = %cause,
                failed_requests = failed,
                uptime_ms = live.opened_at.elapsed().as_millis() as u64,
                idle_ms = live.last_activity.elapsed().as_millis() as u64,
            );
        }

        self.mark_disconnected(live.map(|live| live.id), cause);
        self.schedule_reconnect();
    }

    /// Closes the live session on our own initiative. The caller decides what
    /// happens next.
    async fn teardown(&mut self, cause: DisconnectCause) {
        let Some(mut live) = self.live.take() else {
            return;
        };

        close_quietly(&mut live).await;
        let failed = self.dispatcher.fail_all(CONNECTION_LOST, &self.emitter);
        tracing::info!(
            event = "disconnected",
            session_id = %live.id,
            cause = %cause,
            failed_requests = failed,
        );
        self.mark_disconnected(Some(live.id), cause);
    }

    async fn shutdown(&mut self) {
        self.phase = Phase::Stopped;
        let was_disconnected = self.state == ConnectionState::Disconnected;
        let mut session_id = None;

        if let Some(mut live) = self.live.take() {
            self.state = ConnectionState::Closing;
            session_id = Some(live.id);
            close_quietly(&mut live).await;
        }

        let failed = self.dispatcher.fail_all(CLIENT_SHUTDOWN, &self.emitter);
        tracing::info!(event = "shutdown", failed_requests = failed);

        if was_disconnected {
            self.state = ConnectionState::Disconnected;
        } else {
            self.mark_disconnected(session_id, DisconnectCause::ClientShutdown);
        }
    }

    async fn stop_orphaned(&mut self) -> Flow {
        tracing::debug!("all client handles dropped; shutting down session");
        self.shutdown().await;
        Flow::Stop
    }

    fn mark_disconnected(&mut self, session_id: Option<SessionId>, cause: DisconnectCause) {
        self.state = ConnectionState::Disconnected;
        self.emitter.hooks().on_disconnected(session_id, &cause);
        self.emitter
            .emit(ClientEvent::Disconnected { session_id, cause });
    }

    fn schedule_reconnect(&mut self) {
        let ceiling = self.retry_ceiling();
        match self
            .reconnect
            .record_failure(&self.policy, ceiling, &mut self.rng)
        {
            ReconnectDecision::Retry { attempt, delay } => {
                tracing::info!(
                    event = "reconnect_scheduled",
                    attempt,
                    ceiling,
                    delay_ms = delay.as_millis() as u64,
                );
                self.emitter.hooks().on_reconnect_scheduled(attempt, delay);
                self.emitter
                    .emit(ClientEvent::ReconnectScheduled { delay, attempt });
                self.phase = Phase::Backoff {
                    until: Instant::now() + delay,
                };
            }
            ReconnectDecision::Exhausted { attempts } => {
                tracing::error!(
                    event = "connection_failed",
                    attempts,
                    "reconnection exhausted; waiting for a manual reconnect",
                );
                self.emitter.hooks().on_connection_failed(attempts);
                self.emitter
                    .emit(ClientEvent::ConnectionFailed { attempts });
                self.phase = Phase::Exhausted;
            }
        }
    }

    /// A detected provider's retry budget overrides the policy ceiling.
    fn retry_ceiling(&self) -> u32 {
        if self.best_known.provider.is_known() {
            self.best_known.max_retries
        } else {
            self.policy.max_attempts
        }
    }

    fn status(&self) -> ClientStatus {
        let detected = self.dispatcher.detected();
        ClientStatus {
            state: self.state,
            session_id: self.live.as_ref().map(|live| live.id),
            provider: detected
                .map(|detected| detected.provider)
                .unwrap_or(self.best_known.provider),
            model: detected.map(|detected| detected.model.clone()),
            orchestrator: detected.map(|detected| detected.orchestrator.clone()),
            open_requests: self.dispatcher.open_requests(),
            reconnect_attempts: self.reconnect.attempts(),
            awaiting_manual_reconnect: self.phase == Phase::Exhausted,
            url: self.backend.websocket_url(),
        }
    }
}

async fn close_quietly(live: &mut LiveSession) {
    match tokio::time::timeout(CLOSE_TIMEOUT, live.transport.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            tracing::debug!(session_id = %live.id, error = %error, "transport close failed");
        }
        Err(_) => {
            tracing::debug!(session_id = %live.id, "transport close timed out");
        }
    }
}
