use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chat_protocol::WireMessage;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ChatApiConfig;
use crate::error::{parse_error_message, ChatApiError};
use crate::payload::{
    GeneratedImage, ImageReply, LocationRequest, SpeechReply, SpellcheckResult,
    SynthesizedSpeech, TextRequest, Translation, WeatherReport,
};
use crate::url::{endpoint_url, normalize_base_url, websocket_url};

pub const HISTORY_PATH: &str = "/messages";
pub const SPELLCHECK_PATH: &str = "/spellcheck";
pub const TRANSLATE_PATH: &str = "/translate";
pub const WEATHER_PATH: &str = "/weather";
pub const TTS_PATH: &str = "/tts";
pub const GENERATE_IMAGE_PATH: &str = "/generate-image";

#[derive(Debug, Clone)]
pub struct ChatApiClient {
    http: Client,
    config: ChatApiConfig,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = config.user_agent.as_deref() {
            let value = HeaderValue::from_str(user_agent)
                .map_err(|_| ChatApiError::InvalidHeader(format!("user-agent: {user_agent}")))?;
            let mut headers = HeaderMap::new();
            headers.insert(USER_AGENT, value);
            builder = builder.default_headers(headers);
        }
        let http = builder.build().map_err(ChatApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    pub fn base_url(&self) -> String {
        normalize_base_url(&self.config.base_url)
    }

    /// Realtime endpoint for `identity` on the configured backend.
    pub fn websocket_url(&self, identity: &str) -> Result<String, ChatApiError> {
        websocket_url(&self.config.base_url, identity)
    }

    /// `GET /messages`: the stored conversation, oldest first.
    pub async fn fetch_history(&self) -> Result<Vec<WireMessage>, ChatApiError> {
        let response = self
            .http
            .get(endpoint_url(&self.config.base_url, HISTORY_PATH))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn spellcheck(&self, text: &str) -> Result<SpellcheckResult, ChatApiError> {
        self.post_json(SPELLCHECK_PATH, &TextRequest { text }).await
    }

    pub async fn translate(&self, text: &str) -> Result<Translation, ChatApiError> {
        self.post_json(TRANSLATE_PATH, &TextRequest { text }).await
    }

    pub async fn weather(&self, location: &str) -> Result<WeatherReport, ChatApiError> {
        self.post_json(WEATHER_PATH, &LocationRequest { location })
            .await
    }

    pub async fn synthesize_speech(&self, text: &str) -> Result<SynthesizedSpeech, ChatApiError> {
        let reply: SpeechReply = self.post_json(TTS_PATH, &TextRequest { text }).await?;
        let audio = match reply.audio_base64.as_deref().map(str::trim) {
            Some(encoded) if !encoded.is_empty() => {
                Some(STANDARD.decode(encoded).map_err(ChatApiError::InvalidAudio)?)
            }
            _ => None,
        };

        Ok(SynthesizedSpeech {
            text: reply.text,
            audio,
        })
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ChatApiError> {
        let reply: ImageReply = self
            .post_json(GENERATE_IMAGE_PATH, &TextRequest { text: prompt })
            .await?;

        if let Some(error) = reply.error.filter(|error| !error.trim().is_empty()) {
            return Err(ChatApiError::Backend(error));
        }

        let encoded = reply
            .image_base64
            .filter(|encoded| !encoded.trim().is_empty())
            .ok_or_else(|| ChatApiError::Backend("image reply carried no image data".to_string()))?;
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(ChatApiError::InvalidImage)?;

        Ok(GeneratedImage {
            prompt: reply.prompt.unwrap_or_else(|| prompt.to_string()),
            image_url: reply.image_url,
            data,
        })
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ChatApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self
            .http
            .post(endpoint_url(&self.config.base_url, path))
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<Resp>(response: Response) -> Result<Resp, ChatApiError>
where
    Resp: DeserializeOwned,
{
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ChatApiError::Status(
            status,
            parse_error_message(status, &body),
        ));
    }

    serde_json::from_str(&body).map_err(ChatApiError::from)
}
