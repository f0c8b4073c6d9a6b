use crate::kind::MessageKind;
use crate::timestamp::Timestamp;

/// Media type of generated images carried in `image_data`.
pub const IMAGE_MEDIA_TYPE: &str = "image/png";
/// Media type of synthesized speech returned by the TTS endpoint.
pub const AUDIO_MEDIA_TYPE: &str = "audio/mpeg";

/// Binary payload attached to an image record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    #[must_use]
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    #[must_use]
    pub fn png(data: Vec<u8>) -> Self {
        Self::new(IMAGE_MEDIA_TYPE, data)
    }
}

/// One entry of the conversation timeline.
///
/// Fields are read-only so that an attachment can only exist on
/// [`MessageKind::Image`] records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    kind: MessageKind,
    sender: String,
    body: String,
    attachment: Option<Attachment>,
    created_at: Timestamp,
}

/// Key used to recognize the same logical event arriving twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    sender: String,
    created_at: Timestamp,
    body: String,
}

impl MessageRecord {
    /// Creates a text-only record.
    #[must_use]
    pub fn new(
        kind: MessageKind,
        sender: impl Into<String>,
        body: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            kind,
            sender: sender.into(),
            body: body.into(),
            attachment: None,
            created_at,
        }
    }

    #[must_use]
    pub fn plain(sender: impl Into<String>, body: impl Into<String>, created_at: Timestamp) -> Self {
        Self::new(MessageKind::Plain, sender, body, created_at)
    }

    #[must_use]
    pub fn system(
        sender: impl Into<String>,
        body: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self::new(MessageKind::System, sender, body, created_at)
    }

    #[must_use]
    pub fn error(sender: impl Into<String>, body: impl Into<String>, created_at: Timestamp) -> Self {
        Self::new(MessageKind::Error, sender, body, created_at)
    }

    /// Creates an image record, with or without its binary payload.
    #[must_use]
    pub fn image(
        sender: impl Into<String>,
        body: impl Into<String>,
        created_at: Timestamp,
        attachment: Option<Attachment>,
    ) -> Self {
        Self {
            kind: MessageKind::Image,
            sender: sender.into(),
            body: body.into(),
            attachment,
            created_at,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// The `(sender, created_at, body)` identity of this record.
    ///
    /// Swap this for a server-assigned id once the backend provides one.
    #[must_use]
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            sender: self.sender.clone(),
            created_at: self.created_at,
            body: self.body.clone(),
        }
    }

    #[must_use]
    pub fn is_same_event(&self, other: &Self) -> bool {
        self.dedup_key() == other.dedup_key()
    }
}
