use async_trait::async_trait;
use chat_api::{
    ChatApiClient, ChatApiError, GeneratedImage, SpellcheckResult, SynthesizedSpeech,
    Translation, WeatherReport,
};
use chat_protocol::WireMessage;

/// Request/response side of the backend: history and stateless tools.
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    async fn fetch_history(&self) -> Result<Vec<WireMessage>, ChatApiError>;

    async fn spellcheck(&self, text: &str) -> Result<SpellcheckResult, ChatApiError>;

    async fn translate(&self, text: &str) -> Result<Translation, ChatApiError>;

    async fn weather(&self, location: &str) -> Result<WeatherReport, ChatApiError>;

    async fn synthesize_speech(&self, text: &str) -> Result<SynthesizedSpeech, ChatApiError>;

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ChatApiError>;
}

#[async_trait]
impl ChatBackend for ChatApiClient {
    async fn fetch_history(&self) -> Result<Vec<WireMessage>, ChatApiError> {
        ChatApiClient::fetch_history(self).await
    }

    async fn spellcheck(&self, text: &str) -> Result<SpellcheckResult, ChatApiError> {
        ChatApiClient::spellcheck(self, text).await
    }

    async fn translate(&self, text: &str) -> Result<Translation, ChatApiError> {
        ChatApiClient::translate(self, text).await
    }

    async fn weather(&self, location: &str) -> Result<WeatherReport, ChatApiError> {
        ChatApiClient::weather(self, location).await
    }

    async fn synthesize_speech(&self, text: &str) -> Result<SynthesizedSpeech, ChatApiError> {
        ChatApiClient::synthesize_speech(self, text).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ChatApiError> {
        ChatApiClient::generate_image(self, prompt).await
    }
}
