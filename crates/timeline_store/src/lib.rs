mod error;
mod store;
mod subscription;

pub use error::HistoryEntryError;
pub use store::{AppendOutcome, HydrateReport, TimelineStore};
pub use subscription::{TimelineChange, TimelineSubscription};
