//! Message model and wire frames shared by the chat timeline, the realtime
//! session and the REST tool client.
//!
//! This crate intentionally defines only data shapes and their conversions.
//! It owns no I/O, no connection state and no timeline ordering rules.
//!
//! Dedup identity for timeline records is the `(sender, created_at, body)`
//! triple exposed through [`MessageRecord::dedup_key`]. Nothing else in the
//! workspace compares records for equality of events.

mod error;
mod frame;
mod kind;
mod record;
mod timestamp;

pub use error::ProtocolError;
pub use frame::{decode_inbound, Intent, OutboundFrame, WireMessage};
pub use kind::MessageKind;
pub use record::{Attachment, DedupKey, MessageRecord, AUDIO_MEDIA_TYPE, IMAGE_MEDIA_TYPE};
pub use timestamp::Timestamp;
