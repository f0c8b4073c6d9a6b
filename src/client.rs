//! Event loop that owns the timeline, the session and the dispatcher.
//!
//! The presentation layer talks to it through a cloneable
//! [`ChatClientHandle`]; every state change happens on the loop task, one
//! command or event at a time. History is fetched on its own task and merged
//! into the timeline whenever it arrives.

use std::sync::Arc;

use chat_api::{ChatApiClient, ChatApiError};
use chat_protocol::{Intent, MessageRecord, WireMessage};
use thiserror::Error;
use timeline_store::{TimelineStore, TimelineSubscription};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ChatlineConfig;
use crate::dispatcher::{
    ChatBackend, Clock, Dispatcher, Notice, SystemClock, ToolCompletion, ToolRequest,
};
use crate::session::{ConnectionStatus, Connector, SessionConnection, SessionEvent, WsConnector};

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("chat client is no longer running")]
pub struct ClientClosed;

enum Command {
    Open(String),
    Leave,
    Push { intent: Intent, content: String },
    Tool(ToolRequest),
    Snapshot(oneshot::Sender<Vec<MessageRecord>>),
    Observe(oneshot::Sender<(Vec<MessageRecord>, TimelineSubscription)>),
    Shutdown,
}

/// Cloneable front end of a running [`ChatClient`].
#[derive(Clone)]
pub struct ChatClientHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
}

impl ChatClientHandle {
    /// Binds `identity` and connects. Ignored when blank, already open, or a
    /// different identity is bound.
    pub fn open(&self, identity: impl Into<String>) -> Result<(), ClientClosed> {
        self.command(Command::Open(identity.into()))
    }

    /// Unbinds the identity and stops reconnecting.
    pub fn leave(&self) -> Result<(), ClientClosed> {
        self.command(Command::Leave)
    }

    pub fn push(&self, intent: Intent, content: impl Into<String>) -> Result<(), ClientClosed> {
        self.command(Command::Push {
            intent,
            content: content.into(),
        })
    }

    pub fn send_text(&self, content: impl Into<String>) -> Result<(), ClientClosed> {
        self.push(Intent::Text, content)
    }

    pub fn ask_ai(&self, content: impl Into<String>) -> Result<(), ClientClosed> {
        self.push(Intent::AiChat, content)
    }

    pub fn call_function(&self, content: impl Into<String>) -> Result<(), ClientClosed> {
        self.push(Intent::FunctionCall, content)
    }

    pub fn request_image(&self, content: impl Into<String>) -> Result<(), ClientClosed> {
        self.push(Intent::ImageGeneration, content)
    }

    pub fn invoke_tool(&self, request: ToolRequest) -> Result<(), ClientClosed> {
        self.command(Command::Tool(request))
    }

    pub fn spellcheck(&self, text: impl Into<String>) -> Result<(), ClientClosed> {
        self.invoke_tool(ToolRequest::Spellcheck(text.into()))
    }

    pub fn translate(&self, text: impl Into<String>) -> Result<(), ClientClosed> {
        self.invoke_tool(ToolRequest::Translate(text.into()))
    }

    pub fn weather(&self, location: impl Into<String>) -> Result<(), ClientClosed> {
        self.invoke_tool(ToolRequest::Weather(location.into()))
    }

    pub fn speak(&self, text: impl Into<String>) -> Result<(), ClientClosed> {
        self.invoke_tool(ToolRequest::TextToSpeech(text.into()))
    }

    pub fn generate_image(&self, prompt: impl Into<String>) -> Result<(), ClientClosed> {
        self.invoke_tool(ToolRequest::GenerateImage(prompt.into()))
    }

    /// Current timeline, in order.
    pub async fn snapshot(&self) -> Result<Vec<MessageRecord>, ClientClosed> {
        let (reply, receiver) = oneshot::channel();
        self.command(Command::Snapshot(reply))?;
        receiver.await.map_err(|_| ClientClosed)
    }

    /// Current timeline plus a subscription that starts right after it.
    pub async fn observe(&self) -> Result<(Vec<MessageRecord>, TimelineSubscription), ClientClosed> {
        let (reply, receiver) = oneshot::channel();
        self.command(Command::Observe(reply))?;
        receiver.await.map_err(|_| ClientClosed)
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn status_changes(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Stops the loop. The session is left and its transport aborted.
    pub fn shutdown(&self) -> Result<(), ClientClosed> {
        self.command(Command::Shutdown)
    }

    fn command(&self, command: Command) -> Result<(), ClientClosed> {
        self.commands.send(command).map_err(|_| ClientClosed)
    }
}

/// A spawned client loop and its outputs.
pub struct RunningClient {
    pub handle: ChatClientHandle,
    pub notices: mpsc::UnboundedReceiver<Notice>,
    pub task: JoinHandle<()>,
}

pub struct ChatClient {
    store: TimelineStore,
    session: SessionConnection,
    dispatcher: Dispatcher,
    backend: Arc<dyn ChatBackend>,
    commands: mpsc::UnboundedReceiver<Command>,
    session_events: mpsc::UnboundedReceiver<SessionEvent>,
    completions: mpsc::UnboundedReceiver<ToolCompletion>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl ChatClient {
    /// Spawns a client wired to the real backend described by `config`.
    pub fn connect(config: &ChatlineConfig) -> Result<RunningClient, ChatApiError> {
        let backend = ChatApiClient::new(config.api_config())?;
        let connector = WsConnector::new(config.base_url.clone());
        Ok(Self::spawn(config, Arc::new(connector), Arc::new(backend)))
    }

    pub fn spawn(
        config: &ChatlineConfig,
        connector: Arc<dyn Connector>,
        backend: Arc<dyn ChatBackend>,
    ) -> RunningClient {
        Self::spawn_with_clock(config, connector, backend, Arc::new(SystemClock))
    }

    /// Like [`ChatClient::spawn`], stamping records with `clock`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_with_clock(
        config: &ChatlineConfig,
        connector: Arc<dyn Connector>,
        backend: Arc<dyn ChatBackend>,
        clock: Arc<dyn Clock>,
    ) -> RunningClient {
        let (session, session_events) = SessionConnection::new(connector, config.reconnect_delay);
        let (dispatcher, completions) =
            Dispatcher::new(Arc::clone(&backend), clock, config.surface_tool_errors);
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (notices_tx, notices) = mpsc::unbounded_channel();

        let handle = ChatClientHandle {
            commands: commands_tx,
            status: session.subscribe_status(),
        };
        let client = Self {
            store: TimelineStore::new(),
            session,
            dispatcher,
            backend,
            commands,
            session_events,
            completions,
            notices: notices_tx,
        };
        let task = tokio::spawn(client.run());

        RunningClient {
            handle,
            notices,
            task,
        }
    }

    async fn run(mut self) {
        let (history_tx, mut history) = mpsc::unbounded_channel();
        let backend = Arc::clone(&self.backend);
        let history_task = tokio::spawn(async move {
            let _ = history_tx.send(backend.fetch_history().await);
        });

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Some(event) = self.session_events.recv() => self.on_session_event(event),
                Some(completion) = self.completions.recv() => self.on_tool_completion(completion),
                Some(result) = history.recv() => self.on_history(result),
            }
        }

        history_task.abort();
        self.session.leave();
        debug!("chat client stopped");
    }

    fn on_history(&mut self, result: Result<Vec<WireMessage>, ChatApiError>) {
        match result {
            Ok(messages) => {
                let report = self.store.hydrate(messages);
                for rejected in &report.rejected {
                    warn!(error = %rejected, "skipping unreadable history entry");
                }
                info!(
                    appended = report.appended,
                    duplicates = report.duplicates,
                    rejected = report.rejected.len(),
                    "timeline hydrated"
                );
            }
            Err(error) => warn!(%error, "history fetch failed; timeline holds live messages only"),
        }
    }

    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Open(identity) => {
                self.session.open(&identity);
            }
            Command::Leave => self.session.leave(),
            Command::Push { intent, content } => {
                self.dispatcher
                    .push(intent, &content, &mut self.store, &self.session);
            }
            Command::Tool(request) => {
                self.dispatcher.invoke_tool(request);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.store.snapshot());
            }
            Command::Observe(reply) => {
                let _ = reply.send(self.store.observe_with_snapshot());
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        if let Some(text) = self.session.handle_event(event) {
            self.dispatcher.classify_inbound(&text, &mut self.store);
        }
    }

    fn on_tool_completion(&mut self, completion: ToolCompletion) {
        if let Some(notice) = self.dispatcher.complete_tool(completion, &mut self.store) {
            let _ = self.notices.send(notice);
        }
    }
}
