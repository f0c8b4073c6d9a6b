/// Classification of a timeline record.
///
/// The closed set mirrors what the backend broadcasts. Unknown inbound kinds
/// are kept verbatim in [`MessageKind::Other`] instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Plain,
    AiReply,
    ToolResult,
    Image,
    Error,
    System,
    Other(String),
}

impl MessageKind {
    /// Maps an inbound frame `type` to a record kind.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "text" | "" => Self::Plain,
            "ai_chat" => Self::AiReply,
            "function_result" => Self::ToolResult,
            "image" => Self::Image,
            "error" => Self::Error,
            "system" => Self::System,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Plain => "text",
            Self::AiReply => "ai_chat",
            Self::ToolResult => "function_result",
            Self::Image => "image",
            Self::Error => "error",
            Self::System => "system",
            Self::Other(raw) => raw,
        }
    }

    /// Unknown kinds render like plain chat lines.
    #[must_use]
    pub fn displays_as_plain(&self) -> bool {
        matches!(self, Self::Plain | Self::Other(_))
    }
}
