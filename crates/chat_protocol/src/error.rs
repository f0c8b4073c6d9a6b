use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to parse inbound frame: {source}")]
    MalformedFrame {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid timestamp '{value}'; expected RFC3339 or ISO-8601 date-time")]
    InvalidTimestamp { value: String },

    #[error("image_data is not valid base64: {source}")]
    InvalidImageData {
        #[source]
        source: base64::DecodeError,
    },

    #[error("failed to encode outbound frame: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    #[must_use]
    pub fn malformed(source: serde_json::Error) -> Self {
        Self::MalformedFrame { source }
    }

    #[must_use]
    pub fn invalid_timestamp(value: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
        }
    }
}
