//! One JSON file per analysis, keyed by id.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::PersistenceError;
use crate::model::Analysis;

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Types that can be persisted in a [`JsonStore`].
pub trait Storable: Serialize + DeserializeOwned {
    fn id(&self) -> &str;
}

impl Storable for Analysis {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Generic JSON-file-per-record store.
pub struct JsonStore<T> {
    dir: PathBuf,
    _phantom: PhantomData<T>,
}

pub type AnalysisStore = JsonStore<Analysis>;

impl<T: Storable> JsonStore<T> {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            _phantom: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, id: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistenceError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// Save a record, replacing any previous version. Returns the id.
    pub fn save(&self, data: &T) -> Result<String, PersistenceError> {
        let path = self.file_path(data.id())?;
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&path, json)?;
        tracing::debug!(id = data.id(), path = %path.display(), "Saved record");
        Ok(data.id().to_string())
    }

    /// Load a record by id. Returns None if not found.
    pub fn load(&self, id: &str) -> Result<Option<T>, PersistenceError> {
        let path = self.file_path(id)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Load all records, skipping files that fail to parse.
    pub fn load_all(&self) -> Result<Vec<T>, PersistenceError> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }
        let mut items = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str::<T>(&contents) {
                    Ok(data) => items.push(data),
                    Err(e) => tracing::warn!("Skipping unreadable record {:?}: {}", path, e),
                },
                Err(e) => tracing::warn!("Failed to read file {:?}: {}", path, e),
            }
        }
        Ok(items)
    }

    /// Delete a record by id. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool, PersistenceError> {
        let path = self.file_path(id)?;
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        Ok(true)
    }
}

/// Listing row for stored analyses.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSummary {
    pub id: String,
    pub title: String,
    pub result: Option<String>,
    pub plies: usize,
    pub created_at: u64,
}

impl JsonStore<Analysis> {
    /// Stored analyses, newest first.
    pub fn list(&self) -> Result<Vec<AnalysisSummary>, PersistenceError> {
        let mut summaries: Vec<AnalysisSummary> = self
            .load_all()?
            .into_iter()
            .map(|a| AnalysisSummary {
                title: a.headers.title(),
                result: a.headers.result.clone(),
                plies: a.ply_count(),
                created_at: a.created_at,
                id: a.id,
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameHeaders, SearchSettings};

    fn analysis(id: &str, created_at: u64) -> Analysis {
        let mut a = Analysis::new(
            "1. e4 *".to_string(),
            GameHeaders {
                white: Some("Alice".to_string()),
                black: Some("Bob".to_string()),
                result: Some("*".to_string()),
                ..Default::default()
            },
            SearchSettings::default(),
            vec![],
        );
        a.id = id.to_string();
        a.created_at = created_at;
        a
    }

    #[test]
    fn test_save_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(dir.path().join("analyses"));

        assert!(store.load("missing").unwrap().is_none());

        let original = analysis("abc-123", 10);
        assert_eq!(store.save(&original).unwrap(), "abc-123");
        assert_eq!(store.load("abc-123").unwrap(), Some(original));

        assert!(store.delete("abc-123").unwrap());
        assert!(!store.delete("abc-123").unwrap());
        assert!(store.load("abc-123").unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(dir.path().to_path_buf());
        store.save(&analysis("old", 1)).unwrap();
        store.save(&analysis("new", 2)).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let list = store.list().unwrap();
        let ids: Vec<&str> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["new", "old"]);
        assert_eq!(list[0].title, "Alice vs Bob");
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(dir.path().to_path_buf());
        assert!(matches!(
            store.load("../etc/passwd"),
            Err(PersistenceError::InvalidId(_))
        ));
        assert!(matches!(store.delete(""), Err(PersistenceError::InvalidId(_))));
    }

    #[test]
    fn test_missing_dir_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(dir.path().join("nothing-here"));
        assert!(store.list().unwrap().is_empty());
    }
}
