use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::storage::SessionStorage;

/// A JSON object on disk, rewritten whole on every change.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens `path`, treating a missing file as empty. A file that is not a
    /// JSON string map is ignored with a warning and replaced on next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Ignoring unreadable state file {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(ClientError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        debug!("Opened state file {} ({} entries)", path.display(), entries.len());
        Ok(Self { path, entries: RefCell::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), ClientError> {
        let storage_err =
            |e: std::io::Error| ClientError::Storage(format!("Failed to write {}: {e}", self.path.display()));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(storage_err)?;
            }
        }

        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| ClientError::Storage(format!("Failed to encode state: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path).map_err(storage_err)?;
        file.write_all(&json).map_err(storage_err)?;
        file.sync_all().map_err(storage_err)?;
        fs::rename(&tmp_path, &self.path).map_err(storage_err)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut next = self.entries.borrow().clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *self.entries.borrow_mut() = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        if !self.entries.borrow().contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.borrow().clone();
        next.remove(key);
        self.persist(&next)?;
        *self.entries.borrow_mut() = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("nested").join("session.json");

        let storage = FileStorage::open(&path).expect("open");
        assert_eq!(storage.get("sessionId"), None);
        storage.set("sessionId", "tok").expect("set");
        storage.set("username", "ana").expect("set");

        let reopened = FileStorage::open(&path).expect("reopen");
        assert_eq!(reopened.get("sessionId").as_deref(), Some("tok"));
        assert_eq!(reopened.get("username").as_deref(), Some("ana"));

        reopened.remove("sessionId").expect("remove");
        reopened.remove("sessionId").expect("second remove is a no-op");
        let again = FileStorage::open(&path).expect("reopen");
        assert_eq!(again.get("sessionId"), None);
        assert_eq!(again.get("username").as_deref(), Some("ana"));
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").expect("write");

        let storage = FileStorage::open(&path).expect("open");
        assert_eq!(storage.get("sessionId"), None);
        storage.set("sessionId", "fresh").expect("set overwrites garbage");
        assert_eq!(FileStorage::open(&path).expect("reopen").get("sessionId").as_deref(), Some("fresh"));
    }
}
