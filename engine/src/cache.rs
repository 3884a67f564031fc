//! Directory-backed store of engine binaries, keyed by download URL.
//!
//! Fetching the bytes is the caller's concern; the cache only names, writes
//! and launches them.

use std::path::{Path, PathBuf};

use crate::process::spawn_engine_process;
use crate::session::SessionError;
use crate::EngineHandle;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Engine not cached: {0}")]
    NotCached(String),
    #[error("Empty engine binary for {0}")]
    Empty(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// One cached binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub path: PathBuf,
    pub size: u64,
}

pub struct EngineCache {
    dir: PathBuf,
}

impl EngineCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a URL: anything outside `[A-Za-z0-9._-]` becomes `_`.
    pub fn key_for(url: &str) -> String {
        url.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(Self::key_for(url))
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.path_for(url).is_file()
    }

    pub fn locate(&self, url: &str) -> Option<PathBuf> {
        let path = self.path_for(url);
        path.is_file().then_some(path)
    }

    /// Store a binary for `url`, replacing any previous copy.
    pub fn insert(&self, url: &str, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        if bytes.is_empty() {
            return Err(CacheError::Empty(url.to_string()));
        }
        std::fs::create_dir_all(&self.dir)?;

        let key = Self::key_for(url);
        let path = self.dir.join(&key);
        let tmp = self.dir.join(format!("{}.partial", key));
        std::fs::write(&tmp, bytes)?;
        mark_executable(&tmp)?;
        std::fs::rename(&tmp, &path)?;

        tracing::info!(url, path = %path.display(), size = bytes.len(), "Cached engine binary");
        Ok(path)
    }

    pub fn remove(&self, url: &str) -> Result<bool, CacheError> {
        let path = self.path_for(url);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        Ok(true)
    }

    /// All cached binaries, sorted by key.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let metadata = entry.metadata()?;
            if !metadata.is_file() || path.extension().is_some_and(|e| e == "partial") {
                continue;
            }
            entries.push(CacheEntry {
                key: entry.file_name().to_string_lossy().into_owned(),
                path,
                size: metadata.len(),
            });
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    /// Launch the cached binary for `url`.
    pub fn spawn(&self, url: &str) -> Result<EngineHandle, CacheError> {
        let path = self
            .locate(url)
            .ok_or_else(|| CacheError::NotCached(url.to_string()))?;
        Ok(spawn_engine_process(&path)?)
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
