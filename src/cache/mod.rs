//! Phrase artifact cache: (source text, target language) -> translated text + audio.
//!
//! Entries fill lazily in two ordered stages (translate, then synthesize) and
//! resume from wherever the previous attempt stopped. A complete entry is
//! served from memory with no I/O. Concurrent callers for the same key share
//! one fill sequence. Every transition to complete rewrites the durable file.

pub mod flight;
pub mod labels;
pub mod store;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{InputError, PersistenceError, ServiceError};
use crate::metrics::{metric_names, MetricsRegistry};
use crate::speech::{SpeechSynthesizer, VoiceTable};
use crate::translate::Translator;
use flight::KeyedLocks;
use store::CacheFile;

pub use labels::LabelCache;

/// Identity of a derived artifact. Compared literally, no normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    source_text: String,
    target_language: String,
}

impl CacheKey {
    pub fn new(source_text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_language: target_language.into(),
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEntry {
    pub translated_text: Option<String>,
    pub audio: Option<Bytes>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Complete,
    /// Text is usable, audio is not (yet).
    TextOnly,
    Missing,
}

impl CacheEntry {
    pub fn is_complete(&self) -> bool {
        self.translated_text.is_some() && self.audio.is_some()
    }

    pub fn status(&self) -> EntryStatus {
        match (&self.translated_text, &self.audio) {
            (Some(_), Some(_)) => EntryStatus::Complete,
            (Some(_), None) => EntryStatus::TextOnly,
            _ => EntryStatus::Missing,
        }
    }
}

/// Which target languages the public contract accepts.
#[derive(Debug, Clone, Default)]
pub struct LanguagePolicy {
    supported: Vec<String>,
}

impl LanguagePolicy {
    /// Accept any non-empty language code.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn only(supported: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            supported: supported.into_iter().map(Into::into).collect(),
        }
    }

    pub fn check_language(&self, language: &str) -> Result<(), InputError> {
        let accepted = if self.supported.is_empty() {
            !language.trim().is_empty()
        } else {
            self.supported.iter().any(|s| s == language)
        };
        if accepted {
            Ok(())
        } else {
            Err(InputError::UnsupportedLanguage(language.to_string()))
        }
    }

    /// Validate the request and build its key.
    pub fn key_for(&self, source_text: &str, language: &str) -> Result<CacheKey, InputError> {
        if source_text.trim().is_empty() {
            return Err(InputError::EmptyText);
        }
        self.check_language(language)?;
        Ok(CacheKey::new(source_text, language))
    }
}

/// Everything besides the file and the collaborators.
#[derive(Clone)]
pub struct CacheOptions {
    pub voices: VoiceTable,
    pub languages: LanguagePolicy,
    pub call_timeout: Duration,
    pub metrics: Arc<MetricsRegistry>,
}

impl CacheOptions {
    pub fn from_config(config: &AppConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            voices: VoiceTable::from(&config.voices),
            languages: LanguagePolicy::only(config.supported_languages.iter().cloned()),
            call_timeout: config.call_timeout(),
            metrics,
        }
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default(), Arc::new(MetricsRegistry::new()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrewarmReport {
    pub complete: usize,
    pub text_only: usize,
    pub missing: usize,
    pub rejected: usize,
    pub cancelled: bool,
}

pub struct ArtifactCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    flights: KeyedLocks<CacheKey>,
    file: Arc<CacheFile>,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    options: CacheOptions,
}

impl ArtifactCache {
    /// Load the durable file (best-effort) and wire the collaborators.
    pub fn open(
        path: impl Into<PathBuf>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        options: CacheOptions,
    ) -> Self {
        let file = CacheFile::new(path);
        let entries = file.load::<CacheEntry>();
        info!(path = %file.path().display(), entries = entries.len(), "artifact cache opened");
        Self {
            entries: Arc::new(RwLock::new(entries)),
            flights: KeyedLocks::new(),
            file: Arc::new(file),
            translator,
            synthesizer,
            options,
        }
    }

    /// Return the entry for (source_text, target_language), filling whatever
    /// is missing. Collaborator failures never surface here: the caller gets
    /// the entry as far as it could be filled.
    pub async fn get_or_populate(
        &self,
        source_text: &str,
        target_language: &str,
    ) -> Result<CacheEntry, InputError> {
        let key = self.options.languages.key_for(source_text, target_language)?;
        Ok(self.get_or_populate_key(&key).await)
    }

    pub async fn get_or_populate_key(&self, key: &CacheKey) -> CacheEntry {
        if let Some(entry) = self.complete_entry(key) {
            return entry;
        }

        let _flight = self.flights.acquire(key).await;
        // another caller may have finished the fill while we waited
        if let Some(entry) = self.complete_entry(key) {
            return entry;
        }
        self.fill(key).await
    }

    /// Current entry without any fill attempt.
    pub fn peek(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.read().get(key).cloned()
    }

    /// Drop an entry so the next access recomputes it from scratch.
    /// Waits for an in-flight fill of the same key to finish first.
    pub async fn invalidate(&self, key: &CacheKey) -> Option<CacheEntry> {
        let _flight = self.flights.acquire(key).await;
        let removed = self.entries.write().remove(key);
        if removed.is_some() {
            debug!(source = key.source_text(), language = key.target_language(), "entry invalidated");
            self.persist().await;
        }
        removed
    }

    pub fn languages(&self) -> &LanguagePolicy {
        &self.options.languages
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Fill every (phrase, language) pair in order until done or cancelled.
    pub async fn prewarm(
        &self,
        phrases: &[String],
        languages: &[String],
        cancel: &CancellationToken,
    ) -> PrewarmReport {
        let mut report = PrewarmReport::default();
        'outer: for language in languages {
            for phrase in phrases {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = self.get_or_populate(phrase, language) => Some(result),
                };
                let Some(entry) = outcome else {
                    report.cancelled = true;
                    break 'outer;
                };
                match entry.map(|e| e.status()) {
                    Ok(EntryStatus::Complete) => report.complete += 1,
                    Ok(EntryStatus::TextOnly) => report.text_only += 1,
                    Ok(EntryStatus::Missing) => report.missing += 1,
                    Err(e) => {
                        warn!(phrase = %phrase, language = %language, error = %e, "prewarm skipped");
                        report.rejected += 1;
                    }
                }
            }
        }
        info!(
            complete = report.complete,
            text_only = report.text_only,
            missing = report.missing,
            rejected = report.rejected,
            cancelled = report.cancelled,
            "artifact prewarm finished"
        );
        report
    }

    /// Final save, including partial entries.
    pub fn close(&self) -> Result<usize, PersistenceError> {
        let written = self.file.save(&*self.entries)?;
        info!(path = %self.file.path().display(), written, "artifact cache closed");
        Ok(written)
    }

    fn complete_entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        let entries = self.entries.read();
        let entry = entries.get(key).filter(|e| e.is_complete())?.clone();
        drop(entries);
        self.options.metrics.increment(metric_names::CACHE_HIT);
        debug!(source = key.source_text(), language = key.target_language(), "cache hit");
        Some(entry)
    }

    /// Caller must hold the key's flight lock.
    async fn fill(&self, key: &CacheKey) -> CacheEntry {
        let mut entry = self.peek(key).unwrap_or_default();

        let text = match entry.translated_text.clone() {
            Some(text) => text,
            None => match self.call_translator(key).await {
                Ok(text) => {
                    self.entries
                        .write()
                        .entry(key.clone())
                        .or_default()
                        .translated_text = Some(text.clone());
                    entry.translated_text = Some(text.clone());
                    text
                }
                Err(e) => {
                    self.options.metrics.increment(metric_names::FILL_FAILED);
                    warn!(
                        source = key.source_text(),
                        language = key.target_language(),
                        error = %e,
                        "translation failed, entry left unfilled"
                    );
                    return entry;
                }
            },
        };

        let voice = self.options.voices.descriptor_for(key.target_language());
        match self.call_synthesizer(&text, voice).await {
            Ok(audio) => {
                self.entries
                    .write()
                    .entry(key.clone())
                    .or_default()
                    .audio = Some(audio.clone());
                entry.audio = Some(audio);
                self.options.metrics.increment(metric_names::CACHE_FILL);
                self.persist().await;
            }
            Err(e) => {
                self.options.metrics.increment(metric_names::FILL_FAILED);
                warn!(
                    source = key.source_text(),
                    language = key.target_language(),
                    error = %e,
                    "synthesis failed, serving text only"
                );
            }
        }
        entry
    }

    async fn call_translator(&self, key: &CacheKey) -> Result<String, ServiceError> {
        let span = self.options.metrics.span(metric_names::TRANSLATE_CALL);
        let result = tokio::time::timeout(
            self.options.call_timeout,
            self.translator
                .translate(key.source_text(), key.target_language()),
        )
        .await
        .unwrap_or(Err(ServiceError::TranslationTimeout));
        span.finish();

        match result {
            Ok(text) if text.trim().is_empty() => Err(ServiceError::TranslationUnavailable(
                "empty translation".into(),
            )),
            other => other,
        }
    }

    async fn call_synthesizer(&self, text: &str, voice: &str) -> Result<Bytes, ServiceError> {
        let span = self.options.metrics.span(metric_names::SYNTHESIZE_CALL);
        let result = tokio::time::timeout(
            self.options.call_timeout,
            self.synthesizer.synthesize(text, voice),
        )
        .await
        .unwrap_or(Err(ServiceError::SynthesisTimeout));
        span.finish();

        match result {
            Ok(audio) if audio.is_empty() => {
                Err(ServiceError::SynthesisUnavailable("empty audio".into()))
            }
            other => other,
        }
    }

    /// Full-store save on the blocking pool; returns once the file is written.
    async fn persist(&self) {
        let span = self.options.metrics.span(metric_names::STORE_SAVE);
        let saved = {
            let file = Arc::clone(&self.file);
            let entries = Arc::clone(&self.entries);
            tokio::task::spawn_blocking(move || file.save(&*entries)).await
        };
        match saved {
            Ok(Ok(written)) => {
                span.finish();
                debug!(written, "artifact cache saved");
            }
            Ok(Err(PersistenceError::Disabled)) => {}
            Ok(Err(e)) => warn!(
                path = %self.file.path().display(),
                error = %e,
                "cache save failed, continuing in memory only"
            ),
            Err(e) => warn!(error = %e, "cache save task failed"),
        }
    }
}
