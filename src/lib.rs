//! BhashaBuddy core: cached phrase translation + speech, and pronunciation scoring.
//! Main library: collaborator wiring, cache lifecycle, background prewarm.

pub mod cache;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod metrics;
pub mod scoring;
pub mod speech;
pub mod translate;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cache::{ArtifactCache, CacheOptions, LabelCache, LanguagePolicy};
use config::AppConfig;
use evaluate::PronunciationChecker;
use metrics::MetricsRegistry;
use speech::{
    HttpSynthesizer, HttpTranscriber, SpeechSynthesizer, Transcriber, UnconfiguredSynthesizer,
    UnconfiguredTranscriber,
};
use translate::{HttpTranslator, Translator, UnconfiguredTranslator};

/// Shared state handed to request handlers.
pub struct AppContext {
    pub config: AppConfig,
    pub artifacts: Arc<ArtifactCache>,
    pub labels: Arc<LabelCache>,
    pub checker: Arc<PronunciationChecker>,
    pub metrics: Arc<MetricsRegistry>,
}

impl AppContext {
    /// Build collaborators from config and open both caches.
    pub fn from_config(config: AppConfig) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let timeout = config.call_timeout();

        let translator: Arc<dyn Translator> = match &config.services.translator_url {
            Some(url) => match HttpTranslator::new(url.as_str(), timeout) {
                Ok(client) => {
                    info!(url = %url, "translator client initialized");
                    Arc::new(client)
                }
                Err(e) => {
                    warn!(error = %e, "translator client init failed, translation disabled");
                    Arc::new(UnconfiguredTranslator)
                }
            },
            None => {
                warn!("no translator endpoint configured, translation disabled");
                Arc::new(UnconfiguredTranslator)
            }
        };

        let synthesizer: Arc<dyn SpeechSynthesizer> = match &config.services.synthesizer_url {
            Some(url) => match HttpSynthesizer::new(url.as_str(), timeout) {
                Ok(client) => {
                    info!(url = %url, "synthesizer client initialized");
                    Arc::new(client)
                }
                Err(e) => {
                    warn!(error = %e, "synthesizer client init failed, audio disabled");
                    Arc::new(UnconfiguredSynthesizer)
                }
            },
            None => {
                warn!("no synthesizer endpoint configured, audio disabled");
                Arc::new(UnconfiguredSynthesizer)
            }
        };

        let transcriber: Arc<dyn Transcriber> = match &config.services.transcriber_url {
            Some(url) => match HttpTranscriber::new(url.as_str(), timeout) {
                Ok(client) => {
                    info!(url = %url, "transcriber client initialized");
                    Arc::new(client)
                }
                Err(e) => {
                    warn!(error = %e, "transcriber client init failed, checks will score as unheard");
                    Arc::new(UnconfiguredTranscriber)
                }
            },
            None => {
                warn!("no transcriber endpoint configured, checks will score as unheard");
                Arc::new(UnconfiguredTranscriber)
            }
        };

        let artifacts = Arc::new(ArtifactCache::open(
            config.cache_path.clone(),
            Arc::clone(&translator),
            synthesizer,
            CacheOptions::from_config(&config, Arc::clone(&metrics)),
        ));
        let labels = Arc::new(LabelCache::open(
            config.label_cache_path.clone(),
            translator,
            LanguagePolicy::only(config.supported_languages.iter().cloned()),
            timeout,
            Arc::clone(&metrics),
        ));
        let checker = Arc::new(PronunciationChecker::new(
            Arc::clone(&artifacts),
            transcriber,
            timeout,
            Arc::clone(&metrics),
        ));

        Self {
            config,
            artifacts,
            labels,
            checker,
            metrics,
        }
    }

    /// Warm both caches with the configured lesson content.
    pub async fn prewarm(&self, cancel: &CancellationToken) {
        let warm = &self.config.prewarm;
        self.artifacts
            .prewarm(&warm.phrases, &warm.languages, cancel)
            .await;
        self.labels
            .prewarm(&warm.labels, &warm.languages, cancel)
            .await;
    }

    /// Flush both caches to disk.
    pub fn close(&self) {
        if let Err(e) = self.artifacts.close() {
            warn!(error = %e, "artifact cache final save failed");
        }
        if let Err(e) = self.labels.close() {
            warn!(error = %e, "label cache final save failed");
        }
    }
}

/// Install the tracing subscriber (`RUST_LOG`, default `bhashabuddy=debug`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bhashabuddy=debug")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Open the caches, prewarm in the background, and flush on Ctrl-C.
pub async fn run() {
    init_tracing();
    info!("bhashabuddy starting");

    let ctx = Arc::new(AppContext::from_config(AppConfig::load()));
    let cancel = CancellationToken::new();

    let prewarm = {
        let ctx = Arc::clone(&ctx);
        let cancel = cancel.clone();
        tokio::spawn(async move { ctx.prewarm(&cancel).await })
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c listener failed, shutting down");
    }
    info!("shutdown requested");

    cancel.cancel();
    if let Err(e) = prewarm.await {
        warn!(error = %e, "prewarm task ended abnormally");
    }

    ctx.close();
    match serde_json::to_string(&ctx.metrics.summary()) {
        Ok(summary) => info!(%summary, "metrics at shutdown"),
        Err(e) => warn!(error = %e, "metrics summary encode failed"),
    }
    info!("bhashabuddy stopped");
}
