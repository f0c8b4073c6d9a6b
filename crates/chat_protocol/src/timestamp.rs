use std::fmt;

use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::ProtocolError;

/// Creation instant of a record, normalized to UTC.
///
/// Equality compares instants, so `2024-05-01T09:30:00Z` and
/// `2024-05-01T09:30:00.000` are the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Current UTC time truncated to millisecond precision.
    #[must_use]
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        let millis_only = now.nanosecond() / 1_000_000 * 1_000_000;
        Self(now.replace_nanosecond(millis_only).unwrap_or(now))
    }

    #[must_use]
    pub fn from_datetime(value: OffsetDateTime) -> Self {
        Self(value.to_offset(UtcOffset::UTC))
    }

    /// Parses RFC3339, or a naive ISO-8601 date-time which is taken as UTC.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let trimmed = raw.trim();
        if let Ok(value) = OffsetDateTime::parse(trimmed, &Rfc3339) {
            return Ok(Self::from_datetime(value));
        }
        if let Ok(value) = PrimitiveDateTime::parse(trimmed, &Iso8601::DEFAULT) {
            return Ok(Self::from_datetime(value.assume_utc()));
        }

        Err(ProtocolError::invalid_timestamp(raw))
    }

    #[must_use]
    pub fn as_datetime(&self) -> OffsetDateTime {
        self.0
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub fn unix_millis(&self) -> i128 {
        self.0.unix_timestamp_nanos() / 1_000_000
    }

    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.0.unix_timestamp().to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(value: OffsetDateTime) -> Self {
        Self::from_datetime(value)
    }
}
