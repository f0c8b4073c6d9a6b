#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chat_api::{
    ChatApiError, GeneratedImage, SpellcheckResult, SynthesizedSpeech, Translation,
    WeatherReport,
};
use chat_protocol::{Timestamp, WireMessage};
use chatline::dispatcher::{ChatBackend, Clock, ToolReply};
use chatline::session::{
    ConnectionStatus, MemoryConnector, MemoryPeer, MemoryPeers, SessionConnection, SessionEvent,
};
use tokio::sync::{mpsc, Notify};

pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

pub fn at(raw: &str) -> Timestamp {
    Timestamp::parse(raw).expect("test timestamp parses")
}

pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Backend that answers from a queue of scripted replies.
#[derive(Default)]
pub struct ScriptedBackend {
    state: Mutex<BackendState>,
    gate: Option<Arc<Notify>>,
}

#[derive(Default)]
struct BackendState {
    history: Vec<WireMessage>,
    history_error: Option<String>,
    history_stalled: bool,
    replies: VecDeque<Result<ToolReply, String>>,
    calls: Vec<String>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tool call waits for one `notify_one` on the returned handle.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let backend = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (backend, gate)
    }

    pub fn with_history(self, frames: &[&str]) -> Self {
        lock_unpoisoned(&self.state).history = frames
            .iter()
            .map(|frame| WireMessage::parse(frame).expect("history frame parses"))
            .collect();
        self
    }

    pub fn with_history_error(self, message: &str) -> Self {
        lock_unpoisoned(&self.state).history_error = Some(message.to_string());
        self
    }

    /// History requests never complete.
    pub fn with_stalled_history(self) -> Self {
        lock_unpoisoned(&self.state).history_stalled = true;
        self
    }

    pub fn with_reply(self, reply: ToolReply) -> Self {
        lock_unpoisoned(&self.state).replies.push_back(Ok(reply));
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        lock_unpoisoned(&self.state)
            .replies
            .push_back(Err(message.to_string()));
        self
    }

    /// Tool calls in arrival order, as `name:input`.
    pub fn calls(&self) -> Vec<String> {
        lock_unpoisoned(&self.state).calls.clone()
    }

    async fn next_reply(&self, call: String) -> Result<ToolReply, ChatApiError> {
        lock_unpoisoned(&self.state).calls.push(call);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match lock_unpoisoned(&self.state).replies.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(ChatApiError::Backend(message)),
            None => Err(ChatApiError::Backend("no scripted reply".to_string())),
        }
    }
}

fn unexpected(reply: ToolReply) -> ChatApiError {
    ChatApiError::Backend(format!("unexpected scripted reply: {reply:?}"))
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn fetch_history(&self) -> Result<Vec<WireMessage>, ChatApiError> {
        let outcome = {
            let state = lock_unpoisoned(&self.state);
            if state.history_stalled {
                None
            } else {
                Some(match &state.history_error {
                    Some(message) => Err(ChatApiError::Backend(message.clone())),
                    None => Ok(state.history.clone()),
                })
            }
        };
        match outcome {
            Some(outcome) => outcome,
            None => std::future::pending().await,
        }
    }

    async fn spellcheck(&self, text: &str) -> Result<SpellcheckResult, ChatApiError> {
        match self.next_reply(format!("spellcheck:{text}")).await? {
            ToolReply::Spellcheck(result) => Ok(result),
            other => Err(unexpected(other)),
        }
    }

    async fn translate(&self, text: &str) -> Result<Translation, ChatApiError> {
        match self.next_reply(format!("translate:{text}")).await? {
            ToolReply::Translation(result) => Ok(result),
            other => Err(unexpected(other)),
        }
    }

    async fn weather(&self, location: &str) -> Result<WeatherReport, ChatApiError> {
        match self.next_reply(format!("weather:{location}")).await? {
            ToolReply::Weather(report) => Ok(report),
            other => Err(unexpected(other)),
        }
    }

    async fn synthesize_speech(&self, text: &str) -> Result<SynthesizedSpeech, ChatApiError> {
        match self.next_reply(format!("text-to-speech:{text}")).await? {
            ToolReply::Speech(speech) => Ok(speech),
            other => Err(unexpected(other)),
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ChatApiError> {
        match self.next_reply(format!("generate-image:{prompt}")).await? {
            ToolReply::Image(image) => Ok(image),
            other => Err(unexpected(other)),
        }
    }
}

pub fn seoul_weather() -> ToolReply {
    ToolReply::Weather(WeatherReport {
        location: "Seoul".to_string(),
        temperature: "5°C".to_string(),
        condition: "Clear".to_string(),
        humidity: "40%".to_string(),
        wind: "10km/h".to_string(),
    })
}

/// A session driven by hand over an in-memory transport.
pub struct SessionHarness {
    pub session: SessionConnection,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub connector: MemoryConnector,
    pub peers: MemoryPeers,
}

impl SessionHarness {
    pub fn new() -> Self {
        let (connector, peers) = MemoryConnector::new();
        let (session, events) = SessionConnection::new(Arc::new(connector.clone()), RECONNECT_DELAY);
        Self {
            session,
            events,
            connector,
            peers,
        }
    }

    /// Opens `identity` and drives the session until it is connected.
    pub async fn connected(identity: &str) -> (Self, MemoryPeer) {
        let mut harness = Self::new();
        assert!(harness.session.open(identity));
        let peer = harness.peers.accept().await.expect("connection accepted");
        harness.pump().await;
        assert_eq!(harness.session.status(), ConnectionStatus::Connected);
        (harness, peer)
    }

    /// Applies the next session event and returns any inbound frame text.
    pub async fn pump(&mut self) -> Option<String> {
        let event = self.events.recv().await.expect("session event");
        self.session.handle_event(event)
    }

    pub async fn next_event(&mut self) -> SessionEvent {
        self.events.recv().await.expect("session event")
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
