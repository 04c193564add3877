use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{CommunitySettings, SettingsStore};
use crate::error::SettingsResult;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    servers: BTreeMap<String, CommunitySettings>,
}

/// Settings kept in one JSON document holding every community:
/// `{ "servers": { "<community id>": { "<key>": <value> } } }`.
///
/// Every mutation re-reads the whole document, applies the change and writes
/// it back. Mutations are serialised within the process, and the write goes
/// through a temp file + rename so a failed write never truncates the
/// previous document.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens the store, creating an empty document if none exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };

        if !store.path.exists() {
            info!("Settings: creating empty document at {}", store.path.display());
            if let Err(e) = store.write_document(&SettingsDocument::default()) {
                error!(
                    "Settings: could not create {}: {}",
                    store.path.display(),
                    e
                );
            }
        }

        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_document(&self) -> SettingsResult<SettingsDocument> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SettingsDocument::default()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(SettingsDocument::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Reads the document, treating any failure as "no settings".
    fn read_document(&self) -> SettingsDocument {
        self.load_document().unwrap_or_else(|e| {
            warn!("Settings: failed to read {}: {}", self.path.display(), e);
            SettingsDocument::default()
        })
    }

    fn write_document(&self, document: &SettingsDocument) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Read-modify-write under the process lock. The closure returns whether
    /// the document changed; unchanged documents are not rewritten.
    ///
    /// An unreadable (as opposed to missing) document aborts the mutation so
    /// the existing file is left for inspection.
    fn mutate<F>(&self, apply: F) -> bool
    where
        F: FnOnce(&mut SettingsDocument) -> bool,
    {
        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut document = match self.load_document() {
            Ok(document) => document,
            Err(e) => {
                error!(
                    "Settings: refusing to overwrite unreadable {}: {}",
                    self.path.display(),
                    e
                );
                return false;
            }
        };

        if !apply(&mut document) {
            return false;
        }

        if let Err(e) = self.write_document(&document) {
            error!("Settings: failed to write {}: {}", self.path.display(), e);
        }
        true
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, community_id: &str, key: &str) -> Option<Value> {
        self.read_document()
            .servers
            .get(community_id)?
            .get(key)
            .cloned()
    }

    fn set(&self, community_id: &str, key: &str, value: Value) {
        debug!("Settings: set {}={} for community {}", key, value, community_id);
        self.mutate(|document| {
            document
                .servers
                .entry(community_id.to_string())
                .or_default()
                .insert(key.to_string(), value);
            true
        });
    }

    fn remove(&self, community_id: &str, key: &str) -> bool {
        debug!("Settings: remove {} for community {}", key, community_id);
        self.mutate(|document| {
            document
                .servers
                .get_mut(community_id)
                .and_then(|settings| settings.remove(key))
                .is_some()
        })
    }

    fn list(&self, community_id: &str) -> CommunitySettings {
        self.read_document()
            .servers
            .remove(community_id)
            .unwrap_or_default()
    }
}
