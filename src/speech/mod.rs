//! Speech collaborators: synthesis (text -> audio) and transcription (audio -> text).

pub mod http;

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::VoiceConfig;
use crate::error::ServiceError;
use crate::scoring::ErrorRates;

pub use http::{HttpSynthesizer, HttpTranscriber};

/// Text-to-speech backend. The returned blob is opaque playable audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_descriptor: &str) -> Result<Bytes, ServiceError>;
}

/// Best-guess transcription, optionally scored against a supplied reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcription {
    pub text: String,
    pub error_rates: Option<ErrorRates>,
}

impl Transcription {
    /// True when the recognizer produced no usable words.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio: &[u8],
        language: &str,
        reference_text: Option<&str>,
    ) -> Result<Transcription, ServiceError>;
}

/// Static language -> voice descriptor table with a fallback descriptor.
#[derive(Debug, Clone)]
pub struct VoiceTable {
    default: String,
    by_language: HashMap<String, String>,
}

impl VoiceTable {
    pub fn new(default: impl Into<String>, by_language: HashMap<String, String>) -> Self {
        Self {
            default: default.into(),
            by_language,
        }
    }

    pub fn descriptor_for(&self, language: &str) -> &str {
        self.by_language
            .get(language)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

impl From<&VoiceConfig> for VoiceTable {
    fn from(config: &VoiceConfig) -> Self {
        Self::new(config.default.clone(), config.by_language.clone())
    }
}

pub struct UnconfiguredSynthesizer;

#[async_trait]
impl SpeechSynthesizer for UnconfiguredSynthesizer {
    async fn synthesize(&self, _text: &str, _voice: &str) -> Result<Bytes, ServiceError> {
        Err(ServiceError::SynthesisUnavailable(
            "no synthesis endpoint configured".into(),
        ))
    }
}

pub struct UnconfiguredTranscriber;

#[async_trait]
impl Transcriber for UnconfiguredTranscriber {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _language: &str,
        _reference_text: Option<&str>,
    ) -> Result<Transcription, ServiceError> {
        Err(ServiceError::TranscriptionUnavailable(
            "no transcription endpoint configured".into(),
        ))
    }
}
