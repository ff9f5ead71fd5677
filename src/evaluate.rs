//! Pronunciation checks: obtain a reference, transcribe the attempt, score it.
//! Transcriber failures and empty transcriptions become a zero-score result
//! with "could not hear you" feedback, never an error.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::ArtifactCache;
use crate::error::{CheckError, InputError, ServiceError};
use crate::metrics::{metric_names, MetricsRegistry};
use crate::scoring::{self, ErrorRates, ScoreResult};
use crate::speech::{Transcriber, Transcription};

pub struct PronunciationChecker {
    cache: Arc<ArtifactCache>,
    transcriber: Arc<dyn Transcriber>,
    call_timeout: Duration,
    metrics: Arc<MetricsRegistry>,
}

impl PronunciationChecker {
    pub fn new(
        cache: Arc<ArtifactCache>,
        transcriber: Arc<dyn Transcriber>,
        call_timeout: Duration,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            cache,
            transcriber,
            call_timeout,
            metrics,
        }
    }

    /// Score an attempt at a lesson phrase against its cached translation,
    /// weighting the transcriber's CER/WER. Missing statistics are measured
    /// locally against the reference.
    pub async fn check_against_phrase(
        &self,
        source_text: &str,
        target_language: &str,
        audio: &[u8],
    ) -> Result<ScoreResult, CheckError> {
        let entry = self.cache.get_or_populate(source_text, target_language).await?;
        let reference = entry
            .translated_text
            .ok_or_else(|| CheckError::ReferenceUnavailable {
                source_text: source_text.to_string(),
                language: target_language.to_string(),
            })?;

        let transcription = match self
            .transcribe(audio, target_language, Some(&reference))
            .await
        {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(scoring::unheard_error_rate_result(&reference)),
        };

        let rates = transcription
            .error_rates
            .unwrap_or_else(|| ErrorRates::measure(&transcription.text, &reference));
        Ok(scoring::score_with_error_rates(
            &transcription.text,
            &reference,
            rates,
        ))
    }

    /// Score an attempt at arbitrary target-language text with the local
    /// phoneme-weighted comparison. The language must pass the same policy
    /// as cached phrases.
    pub async fn check_against_text(
        &self,
        reference_text: &str,
        language: &str,
        audio: &[u8],
    ) -> Result<ScoreResult, CheckError> {
        if reference_text.trim().is_empty() {
            return Err(InputError::EmptyText.into());
        }
        self.cache.languages().check_language(language)?;

        match self.transcribe(audio, language, None).await {
            Some(t) if !t.is_empty() => Ok(scoring::score_with_phonemes(
                &t.text,
                reference_text,
                language,
            )),
            _ => Ok(scoring::unheard_phoneme_result(reference_text, language)),
        }
    }

    async fn transcribe(
        &self,
        audio: &[u8],
        language: &str,
        reference: Option<&str>,
    ) -> Option<Transcription> {
        let span = self.metrics.span(metric_names::TRANSCRIBE_CALL);
        let result = tokio::time::timeout(
            self.call_timeout,
            self.transcriber.transcribe(audio, language, reference),
        )
        .await
        .unwrap_or(Err(ServiceError::TranscriptionTimeout));
        span.finish();

        match result {
            Ok(t) => {
                debug!(language, chars = t.text.chars().count(), "transcription received");
                Some(t)
            }
            Err(e) => {
                warn!(language, error = %e, "transcription failed, scoring as unheard");
                None
            }
        }
    }
}
