//! Local persistence for client state.
//!
//! The engine and the wishlist only see [`LocalStore`]; tests use
//! [`MemoryStore`], the CLI uses [`JsonFileStore`].

use std::{
    fmt,
    fs,
    io::{self, Write},
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Why a document could not be loaded or saved.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file could not be read, written or replaced.
    #[error("failed to access {path}")]
    Io {
        /// The document's path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The file exists but does not decode.
    #[error("stored document at {path} is corrupt")]
    Corrupt {
        /// The document's path.
        path: PathBuf,
        /// The decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// The value could not be encoded.
    #[error("failed to encode document")]
    Encode(#[source] serde_json::Error),
}

/// A single persisted document.
pub trait LocalStore<T> {
    /// Read the stored document. `Ok(None)` means nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the document exists but cannot be read or
    /// decoded.
    fn load(&self) -> Result<Option<T>, StoreError>;

    /// Replace the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the document cannot be encoded or written.
    fn save(&mut self, value: &T) -> Result<(), StoreError>;
}

/// Pretty-printed JSON in one file, replaced atomically on every save.
pub struct JsonFileStore<T> {
    path: PathBuf,
    marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    /// A store for the document at `path`. Nothing is touched until the
    /// first load or save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            marker: PhantomData,
        }
    }

    /// Where the document lives.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T> fmt::Debug for JsonFileStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned> LocalStore<T> for JsonFileStore<T> {
    fn load(&self) -> Result<Option<T>, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(self.io_error(error)),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&mut self, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(value).map_err(StoreError::Encode)?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        fs::create_dir_all(&dir).map_err(|error| self.io_error(error))?;

        let mut file = NamedTempFile::new_in(&dir).map_err(|error| self.io_error(error))?;

        file.write_all(&encoded)
            .and_then(|()| file.as_file().sync_all())
            .map_err(|error| self.io_error(error))?;

        file.persist(&self.path)
            .map_err(|error| self.io_error(error.error))?;

        Ok(())
    }
}

/// In-process store.
#[derive(Debug, Clone)]
pub struct MemoryStore<T> {
    value: Option<T>,
    saves: usize,
}

impl<T> MemoryStore<T> {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: None,
            saves: 0,
        }
    }

    /// A store already holding `value`, as if saved by an earlier run.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self {
            value: Some(value),
            saves: 0,
        }
    }

    /// The last saved document.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> LocalStore<T> for MemoryStore<T> {
    fn load(&self) -> Result<Option<T>, StoreError> {
        Ok(self.value.clone())
    }

    fn save(&mut self, value: &T) -> Result<(), StoreError> {
        self.value = Some(value.clone());
        self.saves += 1;

        Ok(())
    }
}
