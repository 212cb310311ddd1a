//! JSON file storage for the Topic Index.
//!
//! The file holds a plain JSON array of `{"id", "content"}` records so it
//! stays readable and hand-editable.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::IndexResult;
use crate::traits::store::IndexStore;
use crate::types::topic::TopicEntry;

/// Index stored as a JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl IndexStore for JsonFileStore {
    fn load(&self) -> Vec<TopicEntry> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No topic index yet");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Topic index unreadable, starting empty");
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Vec<TopicEntry>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Topic index corrupt, starting empty");
                Vec::new()
            }
        }
    }

    fn save(&self, entries: &[TopicEntry]) -> IndexResult<()> {
        let dir = self.parent_dir();
        std::fs::create_dir_all(&dir)?;

        // Same directory as the target so the rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        debug!(path = %self.path.display(), entries = entries.len(), "Topic index saved");
        Ok(())
    }

    fn clear(&self) -> IndexResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("local_memory.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_memory.json");
        std::fs::write(&path, "[{\"id\": \"0x1\", \"content\": ").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().is_empty());

        std::fs::write(&path, "{\"not\": \"a list\"}").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order_and_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/local_memory.json"));
        let entries = vec![
            TopicEntry::new("0x1", "比特幣 ETF 資金流出"),
            TopicEntry::new("0x2", "xAI joins SpaceX"),
        ];

        store.save(&entries).unwrap();
        assert_eq!(store.load(), entries);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("比特幣"));
    }

    #[test]
    fn test_save_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("local_memory.json"));

        store.save(&[TopicEntry::new("0x1", "a"), TopicEntry::new("0x2", "b")]).unwrap();
        store.save(&[TopicEntry::new("0x3", "c")]).unwrap();

        assert_eq!(store.load(), vec![TopicEntry::new("0x3", "c")]);
        // No temp files left behind
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("local_memory.json"));
        store.save(&[TopicEntry::new("0x1", "a")]).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().is_empty());
    }
}
