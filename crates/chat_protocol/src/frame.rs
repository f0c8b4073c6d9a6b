use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::kind::MessageKind;
use crate::record::{Attachment, MessageRecord};
use crate::timestamp::Timestamp;

/// Outbound `type` of a realtime frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Text,
    AiChat,
    FunctionCall,
    ImageGeneration,
}

impl Intent {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::AiChat => "ai_chat",
            Self::FunctionCall => "function_call",
            Self::ImageGeneration => "image_generation",
        }
    }

    /// Intents that ask the backend for a reply rather than broadcasting the
    /// text itself. These are the ones echoed locally before sending.
    #[must_use]
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// Frame sent over the realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    pub intent: Intent,
    pub nickname: String,
    pub message: String,
    pub timestamp: String,
}

impl OutboundFrame {
    #[must_use]
    pub fn new(
        intent: Intent,
        nickname: impl Into<String>,
        message: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            intent,
            nickname: nickname.into(),
            message: message.into(),
            timestamp: created_at.to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|source| ProtocolError::Encode { source })
    }
}

/// Message object as pushed over the realtime channel or returned by the
/// history endpoint. Unknown fields (for example the storage `_id`) are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type", default = "default_wire_type")]
    pub kind: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

fn default_wire_type() -> String {
    "text".to_string()
}

impl WireMessage {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::malformed)
    }

    /// Classifies the wire message into a timeline record.
    ///
    /// `image_data` is only honoured on `image` messages; an image message
    /// without it becomes a text-only image record.
    pub fn into_record(self) -> Result<MessageRecord, ProtocolError> {
        let created_at = Timestamp::parse(&self.timestamp)?;
        let kind = MessageKind::from_wire(&self.kind);

        if kind != MessageKind::Image {
            return Ok(MessageRecord::new(
                kind,
                self.nickname,
                self.message,
                created_at,
            ));
        }

        let attachment = match self.image_data.as_deref().map(str::trim) {
            Some(encoded) if !encoded.is_empty() => {
                let data = STANDARD
                    .decode(encoded)
                    .map_err(|source| ProtocolError::InvalidImageData { source })?;
                Some(Attachment::png(data))
            }
            _ => None,
        };

        Ok(MessageRecord::image(
            self.nickname,
            self.message,
            created_at,
            attachment,
        ))
    }
}

/// Parses and classifies one inbound realtime frame.
pub fn decode_inbound(text: &str) -> Result<MessageRecord, ProtocolError> {
    WireMessage::parse(text)?.into_record()
}
