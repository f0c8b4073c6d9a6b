use super::transport::TransportError;

/// Generation number of a session handle. Every connection attempt gets a
/// fresh, strictly larger value.
pub type Generation = u64;

/// Identifier of a scheduled reconnect attempt.
pub type TimerId = u64;

/// Input to [`super::SessionConnection::handle_event`], produced by the
/// transport task of a handle or by the reconnect timer.
#[derive(Debug)]
pub enum SessionEvent {
    /// The handshake for `generation` completed.
    Opened { generation: Generation },
    /// A text frame arrived on `generation`.
    Frame { generation: Generation, text: String },
    /// The transport of `generation` failed. Always followed by `Closed`.
    Errored {
        generation: Generation,
        error: TransportError,
    },
    /// The transport of `generation` is gone.
    Closed { generation: Generation },
    /// The reconnect delay for `timer` elapsed.
    ReconnectDue { timer: TimerId },
}

impl SessionEvent {
    pub fn generation(&self) -> Option<Generation> {
        match self {
            Self::Opened { generation }
            | Self::Frame { generation, .. }
            | Self::Errored { generation, .. }
            | Self::Closed { generation } => Some(*generation),
            Self::ReconnectDue { .. } => None,
        }
    }
}
