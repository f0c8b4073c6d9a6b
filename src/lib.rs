//! Session and timeline synchronization engine for a realtime chat client.
//!
//! One reconnecting WebSocket session, a set of stateless REST tools and the
//! initial history snapshot all feed a single append-only, deduplicated
//! timeline.
//!
//! # Public API Overview
//! - Spawn the engine with [`ChatClient::connect`] (or [`ChatClient::spawn`]
//!   with a custom [`Connector`] and [`ChatBackend`]) and drive it through the
//!   returned [`ChatClientHandle`].
//! - Read the timeline with [`ChatClientHandle::snapshot`] or follow it with
//!   [`ChatClientHandle::observe`].
//! - Watch connection state with [`ChatClientHandle::status_changes`].
//! - Play synthesized speech from the [`Notice`] stream.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod logging;
pub mod session;

pub use chat_protocol::{Attachment, Intent, MessageKind, MessageRecord, Timestamp};
pub use timeline_store::{TimelineChange, TimelineStore, TimelineSubscription};

/// Client runtime.
pub use crate::client::{ChatClient, ChatClientHandle, ClientClosed, RunningClient};

/// Configuration.
pub use crate::config::{ChatlineConfig, ConfigError};

/// Intent dispatch and tool calls.
pub use crate::dispatcher::{
    ChatBackend, Clock, Dispatcher, Notice, PushOutcome, SystemClock, ToolRequest,
};

/// Realtime session.
pub use crate::session::{
    ConnectionStatus, Connector, MemoryConnector, MemoryPeer, MemoryPeers, SessionConnection,
    TransportError, WsConnector,
};
