//! Application configuration.
//! Loaded from a JSON file; a missing or broken file falls back to defaults.
//! A handful of environment variables override the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

pub const CONFIG_PATH_ENV: &str = "BHASHA_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/bhasha.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Durable file for the phrase artifact cache.
    pub cache_path: PathBuf,
    /// Durable file for translated category labels.
    pub label_cache_path: PathBuf,
    /// Upper bound on every translator/synthesizer/transcriber call.
    pub call_timeout_ms: u64,
    pub services: ServiceEndpoints,
    pub voices: VoiceConfig,
    /// Accepted target languages. Empty accepts any non-empty code.
    pub supported_languages: Vec<String>,
    pub prewarm: PrewarmConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceEndpoints {
    pub translator_url: Option<String>,
    pub synthesizer_url: Option<String>,
    pub transcriber_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub default: String,
    pub by_language: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrewarmConfig {
    pub languages: Vec<String>,
    pub phrases: Vec<String>,
    pub labels: Vec<String>,
}

const SPEAKER_PROMPTS: &[(&str, &str)] = &[
    ("Assamese", "Sita speaks in a calm voice"),
    ("Bengali", "Arjun speaks in a calm voice"),
    ("Bodo", "Maya speaks in a calm voice"),
    ("Chhattisgarhi", "Champa speaks in a calm voice"),
    ("Dogri", "Karan speaks in a calm voice"),
    ("Gujarati", "Yash speaks in a calm voice"),
    ("Hindi", "Rohit speaks in a calm voice"),
    ("Kannada", "Suresh speaks in a calm voice"),
    ("Malayalam", "Anjali speaks in a calm voice"),
    ("Manipuri", "Ranjit speaks in a calm voice"),
    ("Marathi", "Sunita speaks in a calm voice"),
    ("Nepali", "Amrita speaks in a calm voice"),
    ("Odia", "Manas speaks in a calm voice"),
    ("Punjabi", "Gurpreet speaks in a calm voice"),
    ("Sanskrit", "Aryan speaks in a calm voice"),
    ("Tamil", "Jaya speaks in a calm voice"),
    ("Telugu", "Lalitha speaks in a calm voice"),
];

const TARGET_LANGUAGES: &[&str] = &["Hindi", "Marathi", "Kannada", "Tamil", "Telugu"];

const LESSON_PHRASES: &[&str] = &[
    "Hello!",
    "Good morning!",
    "Good evening!",
    "Good night!",
    "Hi there!",
    "How are you?",
    "Please help me.",
    "Thank you.",
    "Excuse me.",
    "I don't understand.",
    "Where is the bus station?",
    "I need an auto.",
    "How much is the fare?",
    "I want to go to the airport.",
    "Can you show me the way?",
];

const LESSON_CATEGORIES: &[&str] = &["Greetings", "Common Phrases", "Travel"];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            default: "A calm voice speaks the text.".into(),
            by_language: SPEAKER_PROMPTS
                .iter()
                .map(|(lang, prompt)| (lang.to_string(), prompt.to_string()))
                .collect(),
        }
    }
}

impl Default for PrewarmConfig {
    fn default() -> Self {
        Self {
            languages: owned(TARGET_LANGUAGES),
            phrases: owned(LESSON_PHRASES),
            labels: owned(LESSON_CATEGORIES),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("translations_cache.json"),
            label_cache_path: PathBuf::from("categories.json"),
            call_timeout_ms: 30_000,
            services: ServiceEndpoints::default(),
            voices: VoiceConfig::default(),
            supported_languages: owned(TARGET_LANGUAGES),
            prewarm: PrewarmConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Resolve the config file from `BHASHA_CONFIG`, fall back to defaults on
    /// any failure, then apply environment overrides.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = match Self::load_from_file(&path) {
            Ok(config) => {
                info!(path = %path.display(), "config loaded");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config load failed, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("BHASHA_TRANSLATOR_URL") {
            self.services.translator_url = Some(url);
        }
        if let Some(url) = lookup("BHASHA_SYNTHESIZER_URL") {
            self.services.synthesizer_url = Some(url);
        }
        if let Some(url) = lookup("BHASHA_TRANSCRIBER_URL") {
            self.services.transcriber_url = Some(url);
        }
        if let Some(path) = lookup("BHASHA_CACHE_PATH") {
            self.cache_path = PathBuf::from(path);
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}
