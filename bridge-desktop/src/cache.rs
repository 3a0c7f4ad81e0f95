//! On-disk cache of acquired bytes.
//!
//! Each source gets one file under the cache directory, named by the SHA-256
//! of its URL. Files are written at absolute offsets as bytes arrive and
//! synced when the transfer finishes.

use bridge_traits::{
    error::{BridgeError, Result},
    AudioSource, CacheStore, CacheWriter,
};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cache file for one source.
#[derive(Debug)]
pub struct CacheFileWriter {
    file: File,
    path: PathBuf,
}

impl CacheFileWriter {
    /// Create (or truncate) the cache file at `path`.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        debug!(path = ?path, "Opened cache file");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheWriter for CacheFileWriter {
    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        debug!(path = ?self.path, "Synced cache file");
        Ok(())
    }
}

/// [`CacheStore`] keeping one file per source URL in a directory.
#[derive(Debug, Clone)]
pub struct CacheDirectory {
    root: PathBuf,
}

impl CacheDirectory {
    /// Cache under the platform cache directory.
    pub fn new() -> Self {
        let root = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("audio-streamer");
        Self { root }
    }

    /// Cache under a custom directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the cache file for `source`.
    pub fn path_for(&self, source: &AudioSource) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(source.url().as_bytes());
        let mut name = format!("{:x}", hasher.finalize());
        if let Some(ext) = source.file_extension() {
            name.push('.');
            name.push_str(&ext);
        }
        self.root.join(name)
    }

    /// Delete every cached file.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}

impl Default for CacheDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for CacheDirectory {
    fn open(&self, source: &AudioSource) -> Result<Box<dyn CacheWriter>> {
        Ok(Box::new(CacheFileWriter::create(self.path_for(source))?))
    }
}
