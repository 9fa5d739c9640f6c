//! Loading and saving the dashboard configuration file.
//!
//! Two processes share the file.  The display service only reads it, once per
//! refresh cycle, through [`read_config`].  The web panel reads *and* writes
//! it through a [`ConfigStore`], whose [`ConfigStore::update`] holds a
//! `tokio::sync::Mutex` for the whole read-modify-write so concurrent requests
//! inside the panel are applied one after another.
//!
//! Writes go to a sibling temp file that is then renamed over the original.
//! A rename within one directory is atomic on Linux, so a reader sees either
//! the old document or the new one, never a truncated file.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::config::{ConfigError, DashboardConfig};

/// Errors returned by configuration storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML content could not be parsed.
    #[error("failed to parse config YAML at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config could not be serialized to YAML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// The requested change failed validation; nothing was written.
    #[error(transparent)]
    Rejected(#[from] ConfigError),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Turns the result of reading `path` into a document.
fn parse_read(path: &Path, read: std::io::Result<String>) -> Result<DashboardConfig, StoreError> {
    match read {
        Ok(content) if content.trim().is_empty() => Ok(DashboardConfig::default()),
        Ok(content) => serde_yaml::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, using defaults");
            Ok(DashboardConfig::default())
        }
        Err(source) => Err(io_error(path)(source)),
    }
}

/// Sibling file a save is written to before being renamed over `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    path.with_file_name(tmp_name)
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|d| !d.as_os_str().is_empty())
}

/// Reads the configuration at `path`.
///
/// A missing or empty file yields [`DashboardConfig::default()`].  This is
/// the blocking variant for tools and tests; async code uses [`read_config`].
///
/// # Errors
///
/// Returns [`StoreError::Io`] for unreadable files or [`StoreError::Parse`]
/// for malformed YAML.
pub fn load_config(path: &Path) -> Result<DashboardConfig, StoreError> {
    parse_read(path, std::fs::read_to_string(path))
}

/// Async counterpart of [`load_config`].
///
/// # Errors
///
/// See [`load_config`].
pub async fn read_config(path: &Path) -> Result<DashboardConfig, StoreError> {
    parse_read(path, tokio::fs::read_to_string(path).await)
}

/// Persists `config` to `path` atomically.
///
/// Creates the parent directory if it does not exist.  Blocking; async code
/// uses [`write_config`].
///
/// # Errors
///
/// Returns [`StoreError::Io`] for file-system failures or
/// [`StoreError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &DashboardConfig) -> Result<(), StoreError> {
    if let Some(dir) = parent_dir(path) {
        std::fs::create_dir_all(dir).map_err(io_error(dir))?;
    }
    let content = serde_yaml::to_string(config).map_err(StoreError::Serialize)?;
    let tmp = staging_path(path);
    std::fs::write(&tmp, content).map_err(io_error(&tmp))?;
    std::fs::rename(&tmp, path).map_err(io_error(path))
}

/// Async counterpart of [`save_config`].
///
/// # Errors
///
/// See [`save_config`].
pub async fn write_config(path: &Path, config: &DashboardConfig) -> Result<(), StoreError> {
    if let Some(dir) = parent_dir(path) {
        tokio::fs::create_dir_all(dir).await.map_err(io_error(dir))?;
    }
    let content = serde_yaml::to_string(config).map_err(StoreError::Serialize)?;
    let tmp = staging_path(path);
    tokio::fs::write(&tmp, content).await.map_err(io_error(&tmp))?;
    tokio::fs::rename(&tmp, path).await.map_err(io_error(path))
}

/// Serialized access to one configuration file.
pub struct ConfigStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current document.
    ///
    /// # Errors
    ///
    /// See [`load_config`].
    pub async fn load(&self) -> Result<DashboardConfig, StoreError> {
        let _guard = self.lock.lock().await;
        read_config(&self.path).await
    }

    /// Replaces the document on disk.
    ///
    /// # Errors
    ///
    /// See [`save_config`].
    pub async fn save(&self, config: &DashboardConfig) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        write_config(&self.path, config).await
    }

    /// Runs one read-modify-write cycle under the store lock.
    ///
    /// `mutate` receives the freshly loaded document.  If it returns an
    /// error the document is discarded and nothing is written.  If it
    /// succeeds, the document is saved only when it actually changed.
    ///
    /// Returns the value produced by `mutate` together with the resulting
    /// document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Rejected`] when `mutate` fails validation, or
    /// any load/save error.
    pub async fn update<T, F>(&self, mutate: F) -> Result<(T, DashboardConfig), StoreError>
    where
        F: FnOnce(&mut DashboardConfig) -> Result<T, ConfigError>,
    {
        let _guard = self.lock.lock().await;
        let original = read_config(&self.path).await?;
        let mut config = original.clone();
        let out = mutate(&mut config)?;

        if config != original {
            write_config(&self.path, &config).await?;
            info!(path = %self.path.display(), "configuration saved");
        }
        Ok((out, config))
    }
}
