//! HTTP translation client.
//! Pooled reqwest client, simple min-interval rate limiting, single attempt
//! per call (a failed call is retried only on the next cache access).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Translator;
use crate::error::ServiceError;

pub struct HttpTranslator {
    http: reqwest::Client,
    endpoint: String,
    /// Earliest instant the next request may be sent.
    next_allowed: tokio::sync::Mutex<Instant>,
    min_interval: Duration,
}

#[derive(Serialize)]
struct TranslateBody<'a> {
    text: &'a str,
    target_lang: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

impl HttpTranslator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::TranslationUnavailable(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            next_allowed: tokio::sync::Mutex::new(Instant::now()),
            min_interval: Duration::from_millis(100),
        })
    }

    async fn rate_limit_wait(&self) {
        let mut next = self.next_allowed.lock().await;
        let now = Instant::now();
        if *next > now {
            tokio::time::sleep(*next - now).await;
        }
        *next = Instant::now() + self.min_interval;
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ServiceError> {
        self.rate_limit_wait().await;

        let response = self
            .http
            .post(&self.endpoint)
            .json(&TranslateBody {
                text,
                target_lang: target_language,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::TranslationTimeout
                } else {
                    ServiceError::TranslationUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "translator returned error status");
            return Err(ServiceError::TranslationUnavailable(format!(
                "unexpected status {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::TranslationUnavailable(e.to_string()))?;

        if parsed.translated_text.trim().is_empty() {
            return Err(ServiceError::TranslationUnavailable(
                "empty translation returned".into(),
            ));
        }
        Ok(parsed.translated_text)
    }
}
