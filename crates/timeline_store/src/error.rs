use chat_protocol::ProtocolError;
use thiserror::Error;

/// A history entry that could not be turned into a timeline record.
#[derive(Debug, Error)]
#[error("history entry {index} could not be classified: {source}")]
pub struct HistoryEntryError {
    pub index: usize,
    #[source]
    pub source: ProtocolError,
}

impl HistoryEntryError {
    #[must_use]
    pub fn new(index: usize, source: ProtocolError) -> Self {
        Self { index, source }
    }
}
