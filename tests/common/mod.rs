#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use bhashabuddy::error::ServiceError;
use bhashabuddy::scoring::ErrorRates;
use bhashabuddy::speech::{SpeechSynthesizer, Transcriber, Transcription};
use bhashabuddy::translate::Translator;

/// Scripted outcome for one collaborator call; the last one repeats.
#[derive(Clone)]
pub enum Outcome {
    Ok,
    Fail,
    Hang,
}

pub struct Script {
    outcomes: Mutex<VecDeque<Outcome>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl Script {
    fn new(outcomes: &[Outcome], delay: Duration) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.iter().cloned().collect()),
            calls: AtomicUsize::new(0),
            delay,
        }
    }

    async fn next(&self) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = {
            let mut outcomes = self.outcomes.lock();
            if outcomes.len() > 1 {
                outcomes.pop_front().unwrap_or(Outcome::Ok)
            } else {
                outcomes.front().cloned().unwrap_or(Outcome::Ok)
            }
        };
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Outcome::Hang = outcome {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        outcome
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub struct FakeTranslator(pub Script);

impl FakeTranslator {
    pub fn new(outcomes: &[Outcome]) -> Arc<Self> {
        Arc::new(Self(Script::new(outcomes, Duration::ZERO)))
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self(Script::new(&[Outcome::Ok], delay)))
    }

    pub fn calls(&self) -> usize {
        self.0.calls()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ServiceError> {
        match self.0.next().await {
            Outcome::Ok => Ok(format!("[{target_language}] {text}")),
            _ => Err(ServiceError::TranslationUnavailable("scripted failure".into())),
        }
    }
}

pub struct FakeSynthesizer {
    script: Script,
    pub voices: Mutex<Vec<String>>,
}

impl FakeSynthesizer {
    pub fn new(outcomes: &[Outcome]) -> Arc<Self> {
        Self::with_delay(outcomes, Duration::ZERO)
    }

    pub fn with_delay(outcomes: &[Outcome], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Script::new(outcomes, delay),
            voices: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }
}

/// Deterministic fake audio for a text.
pub fn audio_for(text: &str) -> Bytes {
    let mut blob = b"RIFF".to_vec();
    blob.extend_from_slice(text.as_bytes());
    Bytes::from(blob)
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str, voice_descriptor: &str) -> Result<Bytes, ServiceError> {
        assert!(!text.is_empty(), "synthesis invoked on empty text");
        self.voices.lock().push(voice_descriptor.to_string());
        match self.script.next().await {
            Outcome::Ok => Ok(audio_for(text)),
            _ => Err(ServiceError::SynthesisUnavailable("scripted failure".into())),
        }
    }
}

pub struct FakeTranscriber {
    pub result: Result<Transcription, ServiceError>,
    pub references: Mutex<Vec<Option<String>>>,
    pub delay: Duration,
}

impl FakeTranscriber {
    pub fn heard(text: &str, rates: Option<ErrorRates>) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(Transcription {
                text: text.to_string(),
                error_rates: rates,
            }),
            references: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            result: Err(ServiceError::TranscriptionUnavailable("asr offline".into())),
            references: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            result: Ok(Transcription::default()),
            references: Mutex::new(Vec::new()),
            delay: Duration::from_secs(3600),
        })
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _language: &str,
        reference_text: Option<&str>,
    ) -> Result<Transcription, ServiceError> {
        self.references
            .lock()
            .push(reference_text.map(str::to_string));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}
