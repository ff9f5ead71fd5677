//! Translator collaborator: source text + target language -> translated text.

pub mod http;

use async_trait::async_trait;

use crate::error::ServiceError;

pub use http::HttpTranslator;

/// Translation backend. Fails with `TranslationUnavailable` or `TranslationTimeout`.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ServiceError>;
}

/// Stand-in used when no translation endpoint is configured.
pub struct UnconfiguredTranslator;

#[async_trait]
impl Translator for UnconfiguredTranslator {
    async fn translate(&self, _text: &str, _target_language: &str) -> Result<String, ServiceError> {
        Err(ServiceError::TranslationUnavailable(
            "no translation endpoint configured".into(),
        ))
    }
}
