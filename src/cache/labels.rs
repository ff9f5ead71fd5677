//! Text-only translation cache for short UI labels (lesson category names).
//! Same keying, single-flight and durable format as the artifact cache, but
//! entries hold only translated text and there is no synthesis stage.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::flight::KeyedLocks;
use super::store::CacheFile;
use super::{CacheKey, LanguagePolicy};
use crate::error::{InputError, PersistenceError, ServiceError};
use crate::metrics::{metric_names, MetricsRegistry};
use crate::translate::Translator;

pub struct LabelCache {
    labels: Arc<RwLock<HashMap<CacheKey, String>>>,
    flights: KeyedLocks<CacheKey>,
    file: Arc<CacheFile>,
    translator: Arc<dyn Translator>,
    languages: LanguagePolicy,
    call_timeout: Duration,
    metrics: Arc<MetricsRegistry>,
}

impl LabelCache {
    pub fn open(
        path: impl Into<PathBuf>,
        translator: Arc<dyn Translator>,
        languages: LanguagePolicy,
        call_timeout: Duration,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let file = CacheFile::new(path);
        let labels = file.load::<String>();
        info!(path = %file.path().display(), labels = labels.len(), "label cache opened");
        Self {
            labels: Arc::new(RwLock::new(labels)),
            flights: KeyedLocks::new(),
            file: Arc::new(file),
            translator,
            languages,
            call_timeout,
            metrics,
        }
    }

    /// Translated label, or `None` when the translator could not provide one.
    /// The source text is never substituted for a missing translation.
    pub async fn translate_label(
        &self,
        label: &str,
        target_language: &str,
    ) -> Result<Option<String>, InputError> {
        let key = self.languages.key_for(label, target_language)?;
        if let Some(text) = self.cached(&key) {
            return Ok(Some(text));
        }

        let _flight = self.flights.acquire(&key).await;
        if let Some(text) = self.cached(&key) {
            return Ok(Some(text));
        }

        let span = self.metrics.span(metric_names::TRANSLATE_CALL);
        let result = tokio::time::timeout(
            self.call_timeout,
            self.translator.translate(label, target_language),
        )
        .await
        .unwrap_or(Err(ServiceError::TranslationTimeout));
        span.finish();

        match result {
            Ok(text) if !text.trim().is_empty() => {
                self.labels.write().insert(key, text.clone());
                self.persist().await;
                Ok(Some(text))
            }
            Ok(_) => {
                warn!(label, language = target_language, "empty label translation ignored");
                Ok(None)
            }
            Err(e) => {
                warn!(label, language = target_language, error = %e, "label translation failed");
                Ok(None)
            }
        }
    }

    /// Translate every label for every language; stops early on cancellation.
    /// Returns how many labels are now cached.
    pub async fn prewarm(
        &self,
        labels: &[String],
        languages: &[String],
        cancel: &CancellationToken,
    ) -> usize {
        'outer: for language in languages {
            for label in labels {
                let done = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    _ = self.translate_label(label, language) => true,
                };
                if !done {
                    break 'outer;
                }
            }
        }
        let cached = self.labels.read().len();
        info!(cached, "label prewarm finished");
        cached
    }

    pub fn close(&self) -> Result<usize, PersistenceError> {
        let written = self.file.save(&*self.labels)?;
        info!(path = %self.file.path().display(), written, "label cache closed");
        Ok(written)
    }

    fn cached(&self, key: &CacheKey) -> Option<String> {
        let text = self.labels.read().get(key).cloned()?;
        self.metrics.increment(metric_names::LABEL_HIT);
        debug!(label = key.source_text(), "label cache hit");
        Some(text)
    }

    async fn persist(&self) {
        let saved = {
            let file = Arc::clone(&self.file);
            let labels = Arc::clone(&self.labels);
            tokio::task::spawn_blocking(move || file.save(&*labels)).await
        };
        match saved {
            Ok(Ok(_)) | Ok(Err(PersistenceError::Disabled)) => {}
            Ok(Err(e)) => warn!(
                path = %self.file.path().display(),
                error = %e,
                "label cache save failed, continuing in memory only"
            ),
            Err(e) => warn!(error = %e, "label save task failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    #[async_trait]
    impl Translator for Echo {
        async fn translate(&self, text: &str, lang: &str) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                Err(ServiceError::TranslationUnavailable("down".into()))
            } else {
                Ok(format!("{lang}:{text}"))
            }
        }
    }

    fn open(path: PathBuf, fail: bool) -> (LabelCache, Arc<Echo>) {
        open_with_delay(path, fail, Duration::ZERO)
    }

    fn open_with_delay(path: PathBuf, fail: bool, delay: Duration) -> (LabelCache, Arc<Echo>) {
        let translator = Arc::new(Echo {
            calls: AtomicUsize::new(0),
            fail,
            delay,
        });
        let cache = LabelCache::open(
            path,
            translator.clone(),
            LanguagePolicy::only(["Hindi"]),
            Duration::from_secs(1),
            Arc::new(MetricsRegistry::new()),
        );
        (cache, translator)
    }

    #[tokio::test]
    async fn cached_after_first_translation_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");

        let (cache, translator) = open(path.clone(), false);
        assert_eq!(
            cache.translate_label("Travel", "Hindi").await.unwrap().as_deref(),
            Some("Hindi:Travel")
        );
        assert_eq!(
            cache.translate_label("Travel", "Hindi").await.unwrap().as_deref(),
            Some("Hindi:Travel")
        );
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);

        let (reopened, translator) = open(path, true);
        assert_eq!(
            reopened.translate_label("Travel", "Hindi").await.unwrap().as_deref(),
            Some("Hindi:Travel")
        );
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failure_is_none_not_the_source_text() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, translator) = open(dir.path().join("labels.json"), true);
        assert_eq!(cache.translate_label("Travel", "Hindi").await.unwrap(), None);
        assert_eq!(cache.translate_label("Travel", "Hindi").await.unwrap(), None);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unsupported_language_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, translator) = open(dir.path().join("labels.json"), false);
        assert_eq!(
            cache.translate_label("Travel", "Klingon").await,
            Err(InputError::UnsupportedLanguage("Klingon".into()))
        );
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn prewarm_fills_all_labels() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, _) = open(dir.path().join("labels.json"), false);
        let labels = vec!["Greetings".to_string(), "Travel".to_string()];
        let cached = cache
            .prewarm(&labels, &["Hindi".to_string()], &CancellationToken::new())
            .await;
        assert_eq!(cached, 2);
        assert_eq!(cache.close().unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_lookups_share_one_translation() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, translator) =
            open_with_delay(dir.path().join("labels.json"), false, Duration::from_millis(50));
        let cache = Arc::new(cache);

        let lookups = (0..8).map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.translate_label("Greetings", "Hindi").await })
        });
        let results = futures_util::future::join_all(lookups).await;

        for result in results {
            assert_eq!(result.unwrap().unwrap().as_deref(), Some("Hindi:Greetings"));
        }
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_prewarm_translates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, translator) = open(dir.path().join("labels.json"), false);
        let cancel = CancellationToken::new();
        cancel.cancel();
        for _ in 0..50 {
            let cached = cache
                .prewarm(&["Travel".to_string()], &["Hindi".to_string()], &cancel)
                .await;
            assert_eq!(cached, 0);
        }
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }
}
