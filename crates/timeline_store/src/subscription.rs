use chat_protocol::MessageRecord;
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Notification for one admitted append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineChange {
    /// Position of the record in the timeline.
    pub index: usize,
    pub record: MessageRecord,
}

/// Unbounded, ordered stream of timeline changes.
///
/// Dropping the subscription unregisters it on the next append.
#[derive(Debug)]
pub struct TimelineSubscription {
    receiver: mpsc::UnboundedReceiver<TimelineChange>,
}

impl TimelineSubscription {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<TimelineChange>) -> Self {
        Self { receiver }
    }

    /// Waits for the next change. Returns `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<TimelineChange> {
        self.receiver.recv().await
    }

    /// Returns the next already-delivered change without waiting.
    pub fn try_recv(&mut self) -> Option<TimelineChange> {
        match self.receiver.try_recv() {
            Ok(change) => Some(change),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drains every change delivered so far.
    pub fn drain(&mut self) -> Vec<TimelineChange> {
        let mut changes = Vec::new();
        while let Some(change) = self.try_recv() {
            changes.push(change);
        }
        changes
    }
}
