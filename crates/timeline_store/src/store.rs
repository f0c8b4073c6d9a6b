use std::collections::HashSet;

use chat_protocol::{DedupKey, MessageRecord, WireMessage};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::HistoryEntryError;
use crate::subscription::{TimelineChange, TimelineSubscription};

/// Append-only, deduplicated log of timeline records.
///
/// The store is owned by a single event loop; callers mutate it through
/// `&mut self` and observers receive changes over unbounded channels in the
/// exact order of admitted appends.
#[derive(Debug, Default)]
pub struct TimelineStore {
    records: Vec<MessageRecord>,
    seen: HashSet<DedupKey>,
    observers: Vec<mpsc::UnboundedSender<TimelineChange>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended { index: usize },
    Duplicate,
}

impl AppendOutcome {
    #[must_use]
    pub fn is_appended(&self) -> bool {
        matches!(self, Self::Appended { .. })
    }
}

/// Result of seeding the store from the history endpoint.
#[derive(Debug, Default)]
pub struct HydrateReport {
    pub appended: usize,
    pub duplicates: usize,
    pub rejected: Vec<HistoryEntryError>,
}

impl TimelineStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<MessageRecord> {
        self.records.clone()
    }

    #[must_use]
    pub fn records(&self) -> &[MessageRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn contains(&self, record: &MessageRecord) -> bool {
        self.seen.contains(&record.dedup_key())
    }

    /// Admits `record` at the tail unless the same event is already present.
    pub fn append(&mut self, record: MessageRecord) -> AppendOutcome {
        if !self.seen.insert(record.dedup_key()) {
            debug!(
                sender = record.sender(),
                created_at = %record.created_at(),
                "duplicate timeline record suppressed"
            );
            return AppendOutcome::Duplicate;
        }

        let index = self.records.len();
        self.records.push(record.clone());
        self.notify(TimelineChange { index, record });
        AppendOutcome::Appended { index }
    }

    /// Seeds the store with already-classified records, in order.
    pub fn seed(&mut self, records: impl IntoIterator<Item = MessageRecord>) -> HydrateReport {
        let mut report = HydrateReport::default();
        for record in records {
            match self.append(record) {
                AppendOutcome::Appended { .. } => report.appended += 1,
                AppendOutcome::Duplicate => report.duplicates += 1,
            }
        }
        report
    }

    /// Seeds the store from raw history documents.
    ///
    /// Entries that fail classification are skipped and reported; the rest
    /// keep their relative order.
    pub fn hydrate(&mut self, messages: Vec<WireMessage>) -> HydrateReport {
        let mut rejected = Vec::new();
        let records = messages
            .into_iter()
            .enumerate()
            .filter_map(|(index, message)| match message.into_record() {
                Ok(record) => Some(record),
                Err(source) => {
                    rejected.push(HistoryEntryError::new(index, source));
                    None
                }
            })
            .collect::<Vec<_>>();

        let mut report = self.seed(records);
        report.rejected = rejected;
        report
    }

    /// Subscribes to every append admitted from now on.
    pub fn observe(&mut self) -> TimelineSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.observers.push(sender);
        TimelineSubscription::new(receiver)
    }

    /// Returns the current records together with a subscription that starts
    /// right after them, so no change is missed or seen twice.
    pub fn observe_with_snapshot(&mut self) -> (Vec<MessageRecord>, TimelineSubscription) {
        (self.snapshot(), self.observe())
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn notify(&mut self, change: TimelineChange) {
        self.observers
            .retain(|observer| observer.send(change.clone()).is_ok());
    }
}
