//! Realtime session: one reconnecting connection per bound identity.
//!
//! Lifecycle: `disconnected -> connecting -> connected -> (disconnected |
//! errored) -> connecting ...`. Every attempt runs on a fresh handle with a
//! new generation; a closed handle schedules exactly one reconnect while an
//! identity stays bound.

mod connection;
mod event;
mod memory;
mod status;
mod transport;

pub use connection::SessionConnection;
pub use event::{Generation, SessionEvent, TimerId};
pub use memory::{MemoryConnector, MemoryPeer, MemoryPeers};
pub use status::ConnectionStatus;
pub use transport::{
    Connector, FrameSink, FrameStream, TransportError, TransportParts, WsConnector,
};
