use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct TextRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct LocationRequest<'a> {
    pub location: &'a str,
}

/// Reply of `POST /spellcheck`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellcheckResult {
    pub original: String,
    pub corrected: String,
}

/// Reply of `POST /translate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub original: String,
    pub translated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
}

/// Reply of `POST /weather`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: String,
    pub temperature: String,
    pub condition: String,
    pub humidity: String,
    pub wind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct SpeechReply {
    pub text: String,
    #[serde(default)]
    pub audio_base64: Option<String>,
}

/// Decoded reply of `POST /tts`. `audio` is `None` when the backend produced
/// no audio for the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedSpeech {
    pub text: String,
    pub audio: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ImageReply {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Decoded reply of `POST /generate-image`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub prompt: String,
    pub image_url: Option<String>,
    pub data: Vec<u8>,
}
