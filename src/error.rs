//! Error taxonomy.
//! Collaborator and persistence failures are absorbed by the cache and the
//! checker; only `InputError` (and `CheckError`) reach request handlers.

use thiserror::Error;

/// A translator, synthesizer or transcriber call that did not produce a result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("translation unavailable: {0}")]
    TranslationUnavailable(String),

    #[error("translation timed out")]
    TranslationTimeout,

    #[error("speech synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    #[error("speech synthesis timed out")]
    SynthesisTimeout,

    #[error("transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    #[error("transcription timed out")]
    TranscriptionTimeout,
}

impl ServiceError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ServiceError::TranslationTimeout
                | ServiceError::SynthesisTimeout
                | ServiceError::TranscriptionTimeout
        )
    }
}

/// Durable store could not be read or written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cache file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("durable store disabled after an earlier write failure")]
    Disabled,
}

/// Malformed or unsupported input at the public boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Pronunciation check could not be scored at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("no reference translation available for '{source_text}' in {language}")]
    ReferenceUnavailable {
        source_text: String,
        language: String,
    },
}
