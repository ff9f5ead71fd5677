//! HTTP speech clients: synthesis returns the raw audio body, transcription
//! sends base64 audio and receives text plus optional CER/WER.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{SpeechSynthesizer, Transcriber, Transcription};
use crate::error::ServiceError;
use crate::scoring::ErrorRates;

fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(timeout)
        .build()
}

fn excerpt(body: &str) -> String {
    body.chars().take(200).collect()
}

pub struct HttpSynthesizer {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct SynthesizeBody<'a> {
    text: &'a str,
    description: &'a str,
}

impl HttpSynthesizer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = build_client(timeout)
            .map_err(|e| ServiceError::SynthesisUnavailable(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, voice_descriptor: &str) -> Result<Bytes, ServiceError> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                ServiceError::SynthesisTimeout
            } else {
                ServiceError::SynthesisUnavailable(e.to_string())
            }
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&SynthesizeBody {
                text,
                description: voice_descriptor,
            })
            .send()
            .await
            .map_err(map_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "synthesizer returned error status");
            return Err(ServiceError::SynthesisUnavailable(format!(
                "unexpected status {}: {}",
                status,
                excerpt(&body)
            )));
        }

        let audio = response.bytes().await.map_err(map_err)?;
        if audio.is_empty() {
            return Err(ServiceError::SynthesisUnavailable("empty audio returned".into()));
        }
        Ok(audio)
    }
}

pub struct HttpTranscriber {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct TranscribeBody<'a> {
    audio_base64: String,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_text: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    transcription: Option<String>,
    #[serde(default)]
    cer: Option<f64>,
    #[serde(default)]
    wer: Option<f64>,
}

impl HttpTranscriber {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = build_client(timeout)
            .map_err(|e| ServiceError::TranscriptionUnavailable(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(
        &self,
        audio: &[u8],
        language: &str,
        reference_text: Option<&str>,
    ) -> Result<Transcription, ServiceError> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                ServiceError::TranscriptionTimeout
            } else {
                ServiceError::TranscriptionUnavailable(e.to_string())
            }
        };

        let body = TranscribeBody {
            audio_base64: base64::engine::general_purpose::STANDARD.encode(audio),
            language,
            reference_text,
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(map_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::TranscriptionUnavailable(format!(
                "unexpected status {}: {}",
                status,
                excerpt(&body)
            )));
        }

        let parsed: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::TranscriptionUnavailable(e.to_string()))?;

        let error_rates = match (parsed.cer, parsed.wer) {
            (Some(cer), Some(wer)) => Some(ErrorRates { cer, wer }),
            _ => None,
        };
        Ok(Transcription {
            text: parsed.transcription.unwrap_or_default(),
            error_rates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn synthesizer_returns_body_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "description": "Rohit speaks in a calm voice"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3, 4]))
            .mount(&server)
            .await;

        let synth = HttpSynthesizer::new(server.uri(), Duration::from_secs(5)).unwrap();
        let audio = synth
            .synthesize("नमस्ते", "Rohit speaks in a calm voice")
            .await
            .unwrap();
        assert_eq!(audio.as_ref(), &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn empty_audio_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let synth = HttpSynthesizer::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = synth.synthesize("नमस्ते", "voice").await.unwrap_err();
        assert!(matches!(err, ServiceError::SynthesisUnavailable(_)));
    }

    #[tokio::test]
    async fn transcriber_parses_rates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "language": "Hindi",
                "reference_text": "नमस्ते",
                "audio_base64": "AQID"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transcription": "नमस्ते",
                "cer": 0.1,
                "wer": 0.5
            })))
            .mount(&server)
            .await;

        let transcriber = HttpTranscriber::new(server.uri(), Duration::from_secs(5)).unwrap();
        let result = transcriber
            .transcribe(&[1, 2, 3], "Hindi", Some("नमस्ते"))
            .await
            .unwrap();
        assert_eq!(result.text, "नमस्ते");
        assert_eq!(result.error_rates, Some(ErrorRates { cer: 0.1, wer: 0.5 }));
    }

    #[tokio::test]
    async fn transcriber_tolerates_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let transcriber = HttpTranscriber::new(server.uri(), Duration::from_secs(5)).unwrap();
        let result = transcriber.transcribe(&[0], "Hindi", None).await.unwrap();
        assert!(result.is_empty());
        assert!(result.error_rates.is_none());
    }
}
