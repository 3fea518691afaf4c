use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::Instant;
use wprovider::{ProviderId, ProviderProfile};
use wsession::testing::{ScriptedRemote, ScriptedTransport};
use wsession::transport::ConnectParams;
use wsession::{
    BackendConfig, ClientConfig, ClientErrorKind, ClientEvent, ClientHooks, ConnectionState,
    DisconnectCause, DropReason, EventReceiver, ReconnectPolicy, RequestId, SessionId,
    StreamClient, TransportError,
};

const EVENT_WAIT: Duration = Duration::from_secs(600);

fn policy() -> ReconnectPolicy {
    ReconnectPolicy::default().with_jitter(0.0)
}

fn spawn(transport: &ScriptedTransport, config: ClientConfig) -> (StreamClient, EventReceiver) {
    StreamClient::builder(config, Arc::new(transport.clone()))
        .jitter_seed(7)
        .spawn()
        .expect("client should spawn")
}

fn config() -> ClientConfig {
    ClientConfig::builder(BackendConfig::default())
        .reconnect(policy())
        .build()
        .expect("valid config")
}

async fn next_event(events: &mut EventReceiver) -> ClientEvent {
    tokio::time::timeout(EVENT_WAIT, events.recv())
        .await
        .expect("event should arrive")
        .expect("event channel open")
}

/// Collects events up to and including the first one matching `stop`.
async fn collect_until<F>(events: &mut EventReceiver, stop: F) -> Vec<ClientEvent>
where
    F: Fn(&ClientEvent) -> bool,
{
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let done = stop(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

async fn connected(events: &mut EventReceiver) -> SessionId {
    let seen = collect_until(events, |event| matches!(event, ClientEvent::Connected { .. })).await;
    match seen.last() {
        Some(ClientEvent::Connected { session_id }) => *session_id,
        other => panic!("expected connected, got {other:?}"),
    }
}

fn processing(request_id: &RequestId, provider: &str) -> Value {
    json!({
        "request_id": request_id.as_str(),
        "status": "processing",
        "chunk": { "metadata": { "provider_info": {
            "provider": provider,
            "model": format!("{}-model", provider.to_ascii_lowercase()),
            "orchestrator_type": "langgraph"
        }}}
    })
}

fn chunk(request_id: &RequestId, text: &str) -> Value {
    json!({ "request_id": request_id.as_str(), "status": "chunk", "chunk": { "text": text } })
}

fn complete(request_id: &RequestId) -> Value {
    json!({ "request_id": request_id.as_str(), "status": "complete" })
}

fn assert_quiet(events: &mut EventReceiver) {
    match events.try_recv() {
        Err(_) => {}
        Ok(event) => panic!("unexpected event {event:?}"),
    }
}

async fn shutdown(client: StreamClient, remote: Option<ScriptedRemote>) {
    client.shutdown().await.expect("shutdown");
    drop(remote);
}

#[tokio::test(start_paused = true)]
async fn chunks_arrive_in_order_followed_by_a_single_completion() {
    let transport = ScriptedTransport::new();
    let remote = transport.accept();
    let (client, mut events) = spawn(&transport, config());

    assert_eq!(next_event(&mut events).await, ClientEvent::Connecting { attempt: 0 });
    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::Connected {
            session_id: SessionId::initial()
        }
    );

    let request_id = client.send("hello").await.expect("send");
    let sent = remote.sent_json();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["action"], "chat");
    assert_eq!(sent[0]["payload"]["text"], "hello");
    assert_eq!(sent[0]["request_id"], request_id.as_str());

    remote.push_json(&json!({ "request_id": request_id.as_str(), "status": "processing" }));
    for text in ["Hel", "lo", " world"] {
        remote.push_json(&chunk(&request_id, text));
    }
    remote.push_json(&complete(&request_id));
    remote.push_json(&complete(&request_id));

    let seen = collect_until(&mut events, |event| {
        matches!(event, ClientEvent::RequestComplete { .. })
    })
    .await;
    assert_eq!(
        seen,
        vec![
            ClientEvent::RequestStarted {
                request_id: request_id.clone()
            },
            ClientEvent::ChunkReceived {
                request_id: request_id.clone(),
                text: "Hel".to_string()
            },
            ClientEvent::ChunkReceived {
                request_id: request_id.clone(),
                text: "lo".to_string()
            },
            ClientEvent::ChunkReceived {
                request_id: request_id.clone(),
                text: " world".to_string()
            },
            ClientEvent::RequestComplete {
                request_id: request_id.clone()
            },
        ]
    );

    let status = client.status().await.expect("status");
    assert_eq!(status.state, ConnectionState::Connected);
    assert_eq!(status.open_requests, 0);
    assert_quiet(&mut events);

    shutdown(client, Some(remote)).await;
}

#[derive(Default)]
struct DropRecorder {
    reasons: Mutex<Vec<String>>,
}

impl ClientHooks for DropRecorder {
    fn on_frame_dropped(&self, reason: &DropReason) {
        self.reasons
            .lock()
            .expect("reasons lock")
            .push(reason.as_str().to_string());
    }
}

#[tokio::test(start_paused = true)]
async fn malformed_frames_are_dropped_without_disturbing_the_session() {
    let transport = ScriptedTransport::new();
    let remote = transport.accept();
    let hooks = Arc::new(DropRecorder::default());
    let (client, mut events) = StreamClient::builder(config(), Arc::new(transport.clone()))
        .hooks(hooks.clone())
        .spawn()
        .expect("client should spawn");
    connected(&mut events).await;

    let request_id = client.send("hi").await.expect("send");
    remote.push_text("{not json");
    remote.push_text(r#"{"status":"chunk","chunk":{"text":"x"}}"#);
    remote.push_text(r#"{"request_id":"r","status":"queued"}"#);
    remote.push_json(&chunk(&request_id, "early"));
    remote.push_json(&chunk(&RequestId::from("stranger"), "who"));
    remote.push_json(&json!({ "request_id": request_id.as_str(), "status": "processing" }));
    remote.push_json(&chunk(&request_id, "ok"));
    remote.push_json(&complete(&request_id));

    let seen = collect_until(&mut events, |event| {
        matches!(event, ClientEvent::RequestComplete { .. })
    })
    .await;
    let texts: Vec<&str> = seen
        .iter()
        .filter_map(|event| match event {
            ClientEvent::ChunkReceived { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["ok"]);
    assert!(seen.iter().all(|event| !event.is_status()));

    assert_eq!(
        *hooks.reasons.lock().expect("reasons lock"),
        vec![
            "malformed",
            "missing_request_id",
            "unknown_status",
            "not_streaming",
            "unknown_request"
        ]
    );
    assert_eq!(transport.open_count(), 1);

    shutdown(client, Some(remote)).await;
}

#[tokio::test(start_paused = true)]
async fn provider_is_detected_once_and_applied_on_the_next_connect() {
    let transport = ScriptedTransport::new();
    let first = transport.accept();
    let second = transport.accept();
    let (client, mut events) = spawn(&transport, config());
    connected(&mut events).await;

    let one = client.send("one").await.expect("send");
    first.push_json(&processing(&one, "anthropic"));
    first.push_json(&complete(&one));
    let two = client.send("two").await.expect("send");
    first.push_json(&processing(&two, "Anthropic"));
    first.push_json(&complete(&two));

    let mut seen = collect_until(&mut events, |event| {
        event == &ClientEvent::RequestComplete {
            request_id: one.clone(),
        }
    })
    .await;
    seen.extend(
        collect_until(&mut events, |event| {
            event
                == &ClientEvent::RequestComplete {
                    request_id: two.clone(),
                }
        })
        .await,
    );

    let detections: Vec<&ClientEvent> = seen
        .iter()
        .filter(|event| matches!(event, ClientEvent::ProviderDetected { .. }))
        .collect();
    assert_eq!(
        detections,
        vec![&ClientEvent::ProviderDetected {
            provider: ProviderId::Anthropic,
            model: "anthropic-model".to_string(),
            orchestrator: "langgraph".to_string(),
        }]
    );

    let status = client.status().await.expect("status");
    assert_eq!(status.provider, ProviderId::Anthropic);
    assert_eq!(status.model.as_deref(), Some("anthropic-model"));

    first.close("restart");
    let session = connected(&mut events).await;
    assert_eq!(session, SessionId::initial().next());

    let opens = transport.opens();
    assert_eq!(opens.len(), 2);
    assert_eq!(opens[0].params, ConnectParams::from(&ProviderProfile::unknown()));
    assert_eq!(opens[1].params, ConnectParams::from(&ProviderProfile::anthropic()));

    shutdown(client, Some(second)).await;
}

#[tokio::test(start_paused = true)]
async fn recoverable_errors_keep_the_request_open_for_anthropic() {
    let transport = ScriptedTransport::new();
    let remote = transport.accept();
    let (client, mut events) = spawn(&transport, config());
    connected(&mut events).await;

    let request_id = client.send("hi").await.expect("send");
    remote.push_json(&processing(&request_id, "anthropic"));
    remote.push_json(&json!({
        "request_id": request_id.as_str(),
        "status": "error",
        "message": "overloaded",
        "recoverable": true
    }));
    remote.push_json(&chunk(&request_id, "after"));
    remote.push_json(&complete(&request_id));

    let seen = collect_until(&mut events, |event| {
        matches!(event, ClientEvent::RequestComplete { .. })
    })
    .await;
    let tail: Vec<ClientEvent> = seen
        .into_iter()
        .filter(|event| !matches!(event, ClientEvent::ProviderDetected { .. }))
        .skip(1)
        .collect();
    assert_eq!(
        tail,
        vec![
            ClientEvent::RequestError {
                request_id: request_id.clone(),
                message: "overloaded".to_string(),
                recoverable: true
            },
            ClientEvent::ChunkReceived {
                request_id: request_id.clone(),
                text: "after".to_string()
            },
            ClientEvent::RequestComplete {
                request_id: request_id.clone()
            },
        ]
    );

    shutdown(client, Some(remote)).await;
}

#[tokio::test(start_paused = true)]
async fn recoverable_errors_end_the_request_without_a_recoverable_profile() {
    let transport = ScriptedTransport::new();
    let remote = transport.accept();
    let (client, mut events) = spawn(&transport, config());
    connected(&mut events).await;

    let request_id = client.send("hi").await.expect("send");
    remote.push_json(&processing(&request_id, "openai"));
    remote.push_json(&json!({
        "request_id": request_id.as_str(),
        "status": "error",
        "error": "rate limited",
        "recoverable": true
    }));
    remote.push_json(&chunk(&request_id, "late"));

    let seen = collect_until(&mut events, |event| {
        matches!(event, ClientEvent::RequestError { .. })
    })
    .await;
    assert_eq!(
        seen.last(),
        Some(&ClientEvent::RequestError {
            request_id: request_id.clone(),
            message: "rate limited".to_string(),
            recoverable: false
        })
    );

    assert_eq!(client.status().await.expect("status").open_requests, 0);
    assert_quiet(&mut events);

    shutdown(client, Some(remote)).await;
}

#[tokio::test(start_paused = true)]
async fn backoff_doubles_and_resets_after_a_healthy_connect() {
    let transport = ScriptedTransport::new();
    transport.fail("refused");
    transport.fail("refused");
    transport.fail("refused");
    let remote = transport.accept();
    let started = Instant::now();
    let (client, mut events) = spawn(&transport, config());

    let seen = collect_until(&mut events, |event| {
        matches!(event, ClientEvent::Connected { .. })
    })
    .await;
    let delays: Vec<(u32, Duration)> = seen
        .iter()
        .filter_map(|event| match event {
            ClientEvent::ReconnectScheduled { delay, attempt } => Some((*attempt, *delay)),
            _ => None,
        })
        .collect();
    assert_eq!(
        delays,
        vec![
            (1, Duration::from_secs(1)),
            (2, Duration::from_secs(2)),
            (3, Duration::from_secs(4))
        ]
    );
    assert!(started.elapsed() >= Duration::from_secs(7));
    assert_eq!(
        seen[1],
        ClientEvent::Disconnected {
            session_id: None,
            cause: DisconnectCause::ConnectFailed("refused".to_string())
        }
    );
    assert_eq!(seen[seen.len() - 2], ClientEvent::Connecting { attempt: 3 });
    assert_eq!(client.status().await.expect("status").reconnect_attempts, 0);

    remote.close("going away");
    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::Disconnected {
            session_id: Some(SessionId::initial()),
            cause: DisconnectCause::ConnectionLost("going away".to_string())
        }
    );
    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::ReconnectScheduled {
            delay: Duration::from_secs(1),
            attempt: 1
        }
    );

    shutdown(client, Some(remote)).await;
}

#[tokio::test(start_paused = true)]
async fn reconnection_gives_up_after_the_ceiling_until_asked_again() {
    let transport = ScriptedTransport::new();
    let (client, mut events) = spawn(&transport, config());

    let seen = collect_until(&mut events, |event| {
        matches!(event, ClientEvent::ConnectionFailed { .. })
    })
    .await;
    assert_eq!(seen.last(), Some(&ClientEvent::ConnectionFailed { attempts: 5 }));
    assert_eq!(
        seen.iter()
            .filter(|event| matches!(event, ClientEvent::ConnectionFailed { .. }))
            .count(),
        1
    );
    assert_eq!(transport.open_count(), 6);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(transport.open_count(), 6);
    assert_quiet(&mut events);

    let status = client.status().await.expect("status");
    assert!(status.awaiting_manual_reconnect);
    assert_eq!(status.state, ConnectionState::Disconnected);

    let remote = transport.accept();
    client.reconnect().await.expect("reconnect");
    assert_eq!(next_event(&mut events).await, ClientEvent::Connecting { attempt: 0 });
    assert!(matches!(
        next_event(&mut events).await,
        ClientEvent::Connected { .. }
    ));
    assert!(!client.status().await.expect("status").awaiting_manual_reconnect);

    shutdown(client, Some(remote)).await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_errors_open_requests_and_closes_the_transport() {
    let transport = ScriptedTransport::new();
    let remote = transport.accept();
    let (client, mut events) = spawn(&transport, config());
    let session = connected(&mut events).await;

    let one = client.send("one").await.expect("send");
    let two = client.get_history().await.expect("send command");
    assert_eq!(remote.sent_json()[1]["payload"]["command"], "get_history");

    client.shutdown().await.expect("shutdown");
    assert!(remote.is_closed());
    assert!(!client.is_running());

    let mut failed = HashSet::new();
    let mut tail = Vec::new();
    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::RequestError {
                request_id,
                message,
                recoverable,
            } => {
                assert_eq!(message, "client shutdown");
                assert!(!recoverable);
                failed.insert(request_id);
            }
            other => tail.push(other),
        }
    }

    assert_eq!(failed, HashSet::from([one, two]));
    assert_eq!(
        tail,
        vec![ClientEvent::Disconnected {
            session_id: Some(session),
            cause: DisconnectCause::ClientShutdown
        }]
    );
    assert_eq!(transport.open_count(), 1);

    client.shutdown().await.expect("second shutdown is a no-op");
    let error = client.send("late").await.expect_err("send after shutdown");
    assert_eq!(error.kind, ClientErrorKind::ShutDown);
}

#[tokio::test(start_paused = true)]
async fn lost_connections_fail_open_requests_and_reconnect() {
    let transport = ScriptedTransport::new();
    let first = transport.accept();
    let second = transport.accept();
    let (client, mut events) = spawn(&transport, config());
    connected(&mut events).await;

    let request_id = client.send("one").await.expect("send");
    first.fail(TransportError::ping_timeout("no pong"));

    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::RequestError {
            request_id,
            message: "connection lost".to_string(),
            recoverable: false
        }
    );
    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::Disconnected {
            session_id: Some(SessionId::initial()),
            cause: DisconnectCause::PingTimeout
        }
    );
    assert!(DisconnectCause::PingTimeout.schedules_reconnect());
    assert!(matches!(
        next_event(&mut events).await,
        ClientEvent::ReconnectScheduled { attempt: 1, .. }
    ));
    assert_eq!(connected(&mut events).await, SessionId::initial().next());

    shutdown(client, Some(second)).await;
}

#[tokio::test(start_paused = true)]
async fn sending_while_disconnected_is_rejected() {
    let transport = ScriptedTransport::new();
    let config = ClientConfig::builder(BackendConfig::default())
        .reconnect(policy())
        .auto_connect(false)
        .build()
        .expect("valid config");
    let (client, mut events) = spawn(&transport, config);

    let error = client.send("hi").await.expect_err("not connected");
    assert_eq!(error.kind, ClientErrorKind::NotConnected);
    let error = client.send("   ").await.expect_err("empty text");
    assert_eq!(error.kind, ClientErrorKind::InvalidRequest);
    assert_eq!(transport.open_count(), 0);
    assert_quiet(&mut events);

    let remote = transport.accept();
    client.connect().await.expect("connect");
    connected(&mut events).await;
    client.send("hi").await.expect("send once connected");
    assert_eq!(remote.sent().len(), 1);

    shutdown(client, Some(remote)).await;
}

#[tokio::test(start_paused = true)]
async fn changing_the_backend_reconnects_to_the_new_url() {
    let transport = ScriptedTransport::new();
    let first = transport.accept();
    let second = transport.accept();
    let (client, mut events) = spawn(&transport, config());
    connected(&mut events).await;

    let backend = BackendConfig::new("chat.example", 9443, true).expect("valid backend");
    client.set_backend(backend).await.expect("set backend");

    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::Disconnected {
            session_id: Some(SessionId::initial()),
            cause: DisconnectCause::BackendChanged
        }
    );
    assert_eq!(connected(&mut events).await, SessionId::initial().next());
    assert!(first.is_closed());

    let opens = transport.opens();
    assert_eq!(opens[0].url, "ws://localhost:8000/ws/chat");
    assert_eq!(opens[1].url, "wss://chat.example:9443/ws/chat");
    assert_eq!(
        client.status().await.expect("status").url,
        "wss://chat.example:9443/ws/chat"
    );

    let invalid = BackendConfig {
        host: String::new(),
        ..BackendConfig::default()
    };
    let error = client.set_backend(invalid).await.expect_err("invalid backend");
    assert_eq!(error.kind, ClientErrorKind::InvalidRequest);

    shutdown(client, Some(second)).await;
}

#[tokio::test(start_paused = true)]
async fn manual_reconnect_replaces_the_live_session() {
    let transport = ScriptedTransport::new();
    let first = transport.accept();
    let second = transport.accept();
    let (client, mut events) = spawn(&transport, config());
    connected(&mut events).await;

    client.reconnect().await.expect("reconnect");
    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::Disconnected {
            session_id: Some(SessionId::initial()),
            cause: DisconnectCause::ManualReconnect
        }
    );
    assert!(!DisconnectCause::ManualReconnect.schedules_reconnect());
    assert_eq!(next_event(&mut events).await, ClientEvent::Connecting { attempt: 0 });
    assert_eq!(connected(&mut events).await, SessionId::initial().next());
    assert!(first.is_closed());
    assert!(!second.is_closed());

    shutdown(client, Some(second)).await;
}
