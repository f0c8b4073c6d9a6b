//! Translates user intents into realtime sends or tool calls and merges every
//! result into the timeline.

mod backend;
mod clock;
mod tool;

use std::sync::Arc;

use chat_protocol::{decode_inbound, Intent, MessageRecord, OutboundFrame};
use timeline_store::{AppendOutcome, TimelineStore};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::session::SessionConnection;

pub use backend::ChatBackend;
pub use clock::{Clock, SystemClock};
pub use tool::{
    Notice, ToolCompletion, ToolReply, ToolRequest, IMAGE_SENDER, SPEECH_SENDER,
    SPELLCHECK_SENDER, TRANSLATOR_SENDER, WEATHER_SENDER,
};

/// Echo body prefix for image generation requests sent over the session.
pub const IMAGE_REQUEST_PREFIX: &str = "Image generation request: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// No identity bound or blank content; nothing happened.
    Ignored,
    /// The frame was handed to the live transport.
    Sent,
    /// The frame was dropped because the session is not connected. Any
    /// optimistic echo stays in the timeline.
    Dropped,
}

pub struct Dispatcher {
    backend: Arc<dyn ChatBackend>,
    clock: Arc<dyn Clock>,
    surface_tool_errors: bool,
    busy: bool,
    completions: mpsc::UnboundedSender<ToolCompletion>,
}

impl Dispatcher {
    /// Tool results arrive on the returned receiver and must be fed back
    /// through [`Dispatcher::complete_tool`].
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        clock: Arc<dyn Clock>,
        surface_tool_errors: bool,
    ) -> (Self, mpsc::UnboundedReceiver<ToolCompletion>) {
        let (completions, receiver) = mpsc::unbounded_channel();
        let dispatcher = Self {
            backend,
            clock,
            surface_tool_errors,
            busy: false,
            completions,
        };
        (dispatcher, receiver)
    }

    /// Whether a tool call is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Sends a push-based intent over the session.
    ///
    /// Intents that expect a reply are echoed into `store` first, stamped
    /// with the same timestamp as the outbound frame so the server's
    /// broadcast of the utterance merges with the echo.
    pub fn push(
        &self,
        intent: Intent,
        content: &str,
        store: &mut TimelineStore,
        session: &SessionConnection,
    ) -> PushOutcome {
        let Some(identity) = session.identity() else {
            debug!(intent = intent.as_str(), "push ignored: no identity bound");
            return PushOutcome::Ignored;
        };
        if content.trim().is_empty() {
            return PushOutcome::Ignored;
        }

        let created_at = self.clock.now();
        if intent.expects_reply() {
            let body = match intent {
                Intent::ImageGeneration => format!("{IMAGE_REQUEST_PREFIX}{content}"),
                _ => content.to_string(),
            };
            store.append(MessageRecord::plain(identity, body, created_at));
        }

        let frame = OutboundFrame::new(intent, identity, content, created_at);
        let text = match frame.to_json() {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "failed to encode outbound frame");
                return PushOutcome::Dropped;
            }
        };

        if session.send(text) {
            PushOutcome::Sent
        } else {
            PushOutcome::Dropped
        }
    }

    /// Starts a tool call unless one is already in flight or the input is
    /// blank. Returns whether a call was started.
    pub fn invoke_tool(&mut self, request: ToolRequest) -> bool {
        if request.input().trim().is_empty() {
            return false;
        }
        if self.busy {
            debug!(tool = request.name(), "tool call ignored: another call is in flight");
            return false;
        }

        self.busy = true;
        let backend = Arc::clone(&self.backend);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let outcome = request.run(backend.as_ref()).await;
            let _ = completions.send(ToolCompletion { request, outcome });
        });
        true
    }

    /// Applies a finished tool call: clears the busy flag and appends the
    /// resulting record.
    pub fn complete_tool(
        &mut self,
        completion: ToolCompletion,
        store: &mut TimelineStore,
    ) -> Option<Notice> {
        self.busy = false;
        let ToolCompletion { request, outcome } = completion;

        match outcome {
            Ok(reply) => {
                match reply.to_record(self.clock.now()) {
                    Some(record) => {
                        store.append(record);
                    }
                    None => debug!(tool = request.name(), "tool reply had nothing to show"),
                }
                reply.notice()
            }
            Err(error) => {
                warn!(tool = request.name(), %error, "tool call failed");
                if self.surface_tool_errors {
                    store.append(MessageRecord::error(
                        request.sender(),
                        format!("{} failed: {error}", request.name()),
                        self.clock.now(),
                    ));
                }
                None
            }
        }
    }

    /// Classifies an inbound frame and appends it. Malformed frames are
    /// logged and discarded.
    pub fn classify_inbound(&self, text: &str, store: &mut TimelineStore) -> Option<AppendOutcome> {
        match decode_inbound(text) {
            Ok(record) => Some(store.append(record)),
            Err(error) => {
                warn!(%error, "discarding malformed inbound frame");
                None
            }
        }
    }
}
