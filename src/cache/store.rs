//! Durable JSON representation of a cache.
//! Flat object: `"<source>||<language>" -> {"text": ..., "audio": <base64>}`.
//! Loading is best-effort and skips malformed records one by one; saving
//! rewrites the whole file through a temp file under a single writer lock.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{CacheEntry, CacheKey};
use crate::error::PersistenceError;

pub const KEY_DELIMITER: &str = "||";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DurableRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

/// A value that can be written to and read back from a `DurableRecord`.
pub trait DurableValue: Sized {
    fn to_record(&self) -> Option<DurableRecord>;
    fn from_record(record: DurableRecord) -> Option<Self>;
}

impl DurableValue for CacheEntry {
    fn to_record(&self) -> Option<DurableRecord> {
        if self.translated_text.is_none() && self.audio.is_none() {
            return None;
        }
        Some(DurableRecord {
            text: self.translated_text.clone(),
            audio: self
                .audio
                .as_ref()
                .map(|audio| base64::engine::general_purpose::STANDARD.encode(audio)),
        })
    }

    fn from_record(record: DurableRecord) -> Option<Self> {
        let audio = match record.audio {
            Some(encoded) => Some(
                base64::engine::general_purpose::STANDARD
                    .decode(encoded)
                    .ok()?
                    .into(),
            ),
            None => None,
        };
        let entry = CacheEntry {
            translated_text: record.text,
            audio,
        };
        (entry.translated_text.is_some() || entry.audio.is_some()).then_some(entry)
    }
}

impl DurableValue for String {
    fn to_record(&self) -> Option<DurableRecord> {
        Some(DurableRecord {
            text: Some(self.clone()),
            audio: None,
        })
    }

    fn from_record(record: DurableRecord) -> Option<Self> {
        record.text
    }
}

pub fn join_key(key: &CacheKey) -> String {
    format!(
        "{}{}{}",
        key.source_text(),
        KEY_DELIMITER,
        key.target_language()
    )
}

pub fn split_key(joined: &str) -> Option<CacheKey> {
    let parts: Vec<&str> = joined.split(KEY_DELIMITER).collect();
    match parts.as_slice() {
        [source, language] => Some(CacheKey::new(*source, *language)),
        _ => None,
    }
}

pub struct CacheFile {
    path: PathBuf,
    write_lock: Mutex<()>,
    /// Set after a failed write; the run continues in memory only.
    disabled: AtomicBool,
}

impl CacheFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            disabled: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Read the file. Missing, unreadable or corrupt files yield an empty map.
    pub fn load<V: DurableValue>(&self) -> HashMap<CacheKey, V> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "cache file not found, starting empty");
                return HashMap::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cache file unreadable, starting empty");
                return HashMap::new();
            }
        };

        let raw: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(&content)
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cache file corrupt, starting empty");
                return HashMap::new();
            }
        };

        let total = raw.len();
        let mut entries = HashMap::with_capacity(total);
        for (joined, value) in raw {
            let Some(key) = split_key(&joined) else {
                warn!(key = %joined, "skipping cache record with malformed key");
                continue;
            };
            let value = serde_json::from_value::<DurableRecord>(value)
                .ok()
                .and_then(V::from_record);
            match value {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => warn!(key = %joined, "skipping malformed cache record"),
            }
        }

        info!(
            path = %self.path.display(),
            loaded = entries.len(),
            skipped = total - entries.len(),
            "cache file loaded"
        );
        entries
    }

    /// Serialize every entry and replace the file. Returns the number of
    /// records written. The first failure disables further writes.
    pub fn save<V: DurableValue>(
        &self,
        entries: &RwLock<HashMap<CacheKey, V>>,
    ) -> Result<usize, PersistenceError> {
        if self.is_disabled() {
            return Err(PersistenceError::Disabled);
        }
        let _writer = self.write_lock.lock();

        let (encoded, written) = {
            let entries = entries.read();
            let mut records = BTreeMap::new();
            for (key, value) in entries.iter() {
                let joined = join_key(key);
                if split_key(&joined).as_ref() != Some(key) {
                    warn!(key = %joined, "key collides with the durable delimiter, not saved");
                    continue;
                }
                if let Some(record) = value.to_record() {
                    records.insert(joined, record);
                }
            }
            let written = records.len();
            (serde_json::to_vec_pretty(&records)?, written)
        };

        if let Err(e) = self.write_atomically(&encoded) {
            self.disabled.store(true, Ordering::Release);
            return Err(e.into());
        }
        Ok(written)
    }

    fn write_atomically(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut tmp: OsString = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)
    }
}
