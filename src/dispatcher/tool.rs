use chat_api::{
    ChatApiError, GeneratedImage, SpellcheckResult, SynthesizedSpeech, Translation,
    WeatherReport,
};
use chat_protocol::{Attachment, MessageRecord, Timestamp, AUDIO_MEDIA_TYPE};

use super::backend::ChatBackend;

pub const SPELLCHECK_SENDER: &str = "spell-check";
pub const TRANSLATOR_SENDER: &str = "translator";
pub const WEATHER_SENDER: &str = "weather bot";
pub const SPEECH_SENDER: &str = "text-to-speech";
pub const IMAGE_SENDER: &str = "image generator";

/// A stateless tool call. The payload is the user's raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    Spellcheck(String),
    Translate(String),
    Weather(String),
    TextToSpeech(String),
    GenerateImage(String),
}

impl ToolRequest {
    pub fn input(&self) -> &str {
        match self {
            Self::Spellcheck(text)
            | Self::Translate(text)
            | Self::Weather(text)
            | Self::TextToSpeech(text)
            | Self::GenerateImage(text) => text,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Spellcheck(_) => "spellcheck",
            Self::Translate(_) => "translate",
            Self::Weather(_) => "weather",
            Self::TextToSpeech(_) => "text-to-speech",
            Self::GenerateImage(_) => "generate-image",
        }
    }

    /// Sender of the records this tool produces.
    pub fn sender(&self) -> &'static str {
        match self {
            Self::Spellcheck(_) => SPELLCHECK_SENDER,
            Self::Translate(_) => TRANSLATOR_SENDER,
            Self::Weather(_) => WEATHER_SENDER,
            Self::TextToSpeech(_) => SPEECH_SENDER,
            Self::GenerateImage(_) => IMAGE_SENDER,
        }
    }

    pub(crate) async fn run(&self, backend: &dyn ChatBackend) -> Result<ToolReply, ChatApiError> {
        match self {
            Self::Spellcheck(text) => backend.spellcheck(text).await.map(ToolReply::Spellcheck),
            Self::Translate(text) => backend.translate(text).await.map(ToolReply::Translation),
            Self::Weather(location) => backend.weather(location).await.map(ToolReply::Weather),
            Self::TextToSpeech(text) => backend
                .synthesize_speech(text)
                .await
                .map(ToolReply::Speech),
            Self::GenerateImage(prompt) => backend.generate_image(prompt).await.map(ToolReply::Image),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolReply {
    Spellcheck(SpellcheckResult),
    Translation(Translation),
    Weather(WeatherReport),
    Speech(SynthesizedSpeech),
    Image(GeneratedImage),
}

impl ToolReply {
    /// Timeline record for this reply, or `None` when the reply carries
    /// nothing to show.
    pub fn to_record(&self, created_at: Timestamp) -> Option<MessageRecord> {
        let record = match self {
            Self::Spellcheck(result) => MessageRecord::system(
                SPELLCHECK_SENDER,
                format!(
                    "Original: {}\nCorrected: {}",
                    result.original, result.corrected
                ),
                created_at,
            ),
            Self::Translation(translation) => MessageRecord::system(
                TRANSLATOR_SENDER,
                format!(
                    "Original: {}\nTranslated: {}",
                    translation.original, translation.translated
                ),
                created_at,
            ),
            Self::Weather(report) => MessageRecord::system(
                WEATHER_SENDER,
                format!(
                    "{}: {}, {}, humidity {}, wind {}",
                    report.location,
                    report.temperature,
                    report.condition,
                    report.humidity,
                    report.wind
                ),
                created_at,
            ),
            Self::Speech(speech) => {
                speech.audio.as_ref()?;
                MessageRecord::system(
                    SPEECH_SENDER,
                    format!("Speech synthesized: {}", speech.text),
                    created_at,
                )
            }
            Self::Image(image) => MessageRecord::image(
                IMAGE_SENDER,
                format!("Image generated: {}", image.prompt),
                created_at,
                Some(Attachment::png(image.data.clone())),
            ),
        };
        Some(record)
    }

    /// Presentation-side effect of this reply, if any.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Speech(SynthesizedSpeech {
                audio: Some(audio), ..
            }) => Some(Notice::PlaybackReady {
                audio: audio.clone(),
                media_type: AUDIO_MEDIA_TYPE.to_string(),
            }),
            _ => None,
        }
    }
}

/// Result of a tool call, delivered back to the event loop.
#[derive(Debug)]
pub struct ToolCompletion {
    pub request: ToolRequest,
    pub outcome: Result<ToolReply, ChatApiError>,
}

/// Side effects the presentation layer must act on outside the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Synthesized speech is ready to play.
    PlaybackReady { audio: Vec<u8>, media_type: String },
}

#[cfg(test)]
mod tests {
    use chat_api::{SpellcheckResult, SynthesizedSpeech, Translation};
    use chat_protocol::{MessageKind, Timestamp};

    use super::{Notice, ToolReply, ToolRequest};

    fn at() -> Timestamp {
        Timestamp::parse("2024-05-01T12:00:00.000Z").expect("timestamp")
    }

    #[test]
    fn spellcheck_reply_lists_original_and_correction() {
        let reply = ToolReply::Spellcheck(SpellcheckResult {
            original: "helo".to_string(),
            corrected: "hello".to_string(),
        });
        let record = reply.to_record(at()).expect("record");
        assert_eq!(record.kind(), &MessageKind::System);
        assert_eq!(record.sender(), "spell-check");
        assert_eq!(record.body(), "Original: helo\nCorrected: hello");
    }

    #[test]
    fn translation_reply_uses_translator_sender() {
        let reply = ToolReply::Translation(Translation {
            original: "bonjour".to_string(),
            translated: "hello".to_string(),
            target_language: None,
        });
        let record = reply.to_record(at()).expect("record");
        assert_eq!(record.sender(), "translator");
        assert_eq!(record.body(), "Original: bonjour\nTranslated: hello");
    }

    #[test]
    fn speech_without_audio_yields_nothing() {
        let reply = ToolReply::Speech(SynthesizedSpeech {
            text: "hi".to_string(),
            audio: None,
        });
        assert!(reply.to_record(at()).is_none());
        assert!(reply.notice().is_none());
    }

    #[test]
    fn speech_with_audio_yields_record_and_playback_notice() {
        let reply = ToolReply::Speech(SynthesizedSpeech {
            text: "hi".to_string(),
            audio: Some(vec![1, 2, 3]),
        });
        let record = reply.to_record(at()).expect("record");
        assert_eq!(record.body(), "Speech synthesized: hi");
        assert_eq!(
            reply.notice(),
            Some(Notice::PlaybackReady {
                audio: vec![1, 2, 3],
                media_type: "audio/mpeg".to_string(),
            })
        );
    }

    #[test]
    fn request_names_and_senders() {
        let request = ToolRequest::Weather("Seoul".to_string());
        assert_eq!(request.name(), "weather");
        assert_eq!(request.sender(), "weather bot");
        assert_eq!(request.input(), "Seoul");
    }
}
