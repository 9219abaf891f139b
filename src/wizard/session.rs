// wizard/session.rs - Session-scoped storage of the enrolling rider's id

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::WizardError;
use crate::models::RiderId;

/// Where the wizard remembers which rider a session is enrolling
pub trait SessionStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<RiderId>, WizardError>;
    fn save(&self, key: &str, rider_id: RiderId) -> Result<(), WizardError>;
    fn clear(&self, key: &str) -> Result<(), WizardError>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, RiderId>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, RiderId>>, WizardError> {
        self.entries
            .lock()
            .map_err(|_| WizardError::Session("session map poisoned".to_string()))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, key: &str) -> Result<Option<RiderId>, WizardError> {
        Ok(self.entries()?.get(key).copied())
    }

    fn save(&self, key: &str, rider_id: RiderId) -> Result<(), WizardError> {
        self.entries()?.insert(key.to_string(), rider_id);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), WizardError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    rider_id: RiderId,
}

/// One `<key>.json` file per session under a directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys are form-urlencoded, so distinct keys never share a file and
    /// none can contain a path separator
    fn path_for(&self, key: &str) -> PathBuf {
        let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
        self.dir.join(format!("{}.json", encoded))
    }
}

fn session_error(err: impl std::fmt::Display) -> WizardError {
    WizardError::Session(err.to_string())
}

impl SessionStore for FileSessionStore {
    fn load(&self, key: &str) -> Result<Option<RiderId>, WizardError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(session_error)?;
        let file: SessionFile = serde_json::from_str(&content).map_err(session_error)?;
        Ok(Some(file.rider_id))
    }

    fn save(&self, key: &str, rider_id: RiderId) -> Result<(), WizardError> {
        fs::create_dir_all(&self.dir).map_err(session_error)?;
        let content = serde_json::to_string_pretty(&SessionFile { rider_id }).map_err(session_error)?;
        fs::write(self.path_for(key), content).map_err(session_error)
    }

    fn clear(&self, key: &str) -> Result<(), WizardError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(session_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_is_scoped_by_key() {
        let store = MemorySessionStore::new();
        let rider = RiderId::new();

        store.save("desk-1", rider).unwrap();
        assert_eq!(store.load("desk-1").unwrap(), Some(rider));
        assert_eq!(store.load("desk-2").unwrap(), None);

        store.clear("desk-1").unwrap();
        assert_eq!(store.load("desk-1").unwrap(), None);
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions"));
        let rider = RiderId::new();

        assert_eq!(store.load("default").unwrap(), None);
        store.save("default", rider).unwrap();

        let reopened = FileSessionStore::new(dir.path().join("sessions"));
        assert_eq!(reopened.load("default").unwrap(), Some(rider));

        reopened.clear("default").unwrap();
        reopened.clear("default").unwrap();
        assert_eq!(store.load("default").unwrap(), None);
    }

    #[test]
    fn file_store_keys_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions"));
        store.save("../outside", RiderId::new()).unwrap();

        assert!(dir.path().join("sessions").join("..%2Foutside.json").exists());
        assert!(!dir.path().join("outside.json").exists());
    }

    #[test]
    fn similar_keys_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        let rider = RiderId::new();

        store.save("desk 1", rider).unwrap();
        assert_eq!(store.load("desk_1").unwrap(), None);
        assert_eq!(store.load("desk+1").unwrap(), None);
        assert_eq!(store.load("desk 1").unwrap(), Some(rider));
    }
}
