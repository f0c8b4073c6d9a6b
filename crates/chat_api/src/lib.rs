//! Transport-only client for the chat backend's REST surface.
//!
//! This crate owns request building and response parsing for the history
//! endpoint and the stateless tool endpoints. It keeps no state between calls,
//! never retries, and knows nothing about the timeline or the realtime
//! session.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod url;

pub use client::ChatApiClient;
pub use config::ChatApiConfig;
pub use error::ChatApiError;
pub use payload::{
    GeneratedImage, SpellcheckResult, SynthesizedSpeech, Translation, WeatherReport,
};
pub use crate::url::{normalize_base_url, websocket_url, DEFAULT_BASE_URL};
