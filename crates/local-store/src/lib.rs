//! Display-name hint kept between runs.
//!
//! The hint only decides what name the dashboard greets with after a
//! successful session probe. It is never used to decide whether the user is
//! logged in.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LocalStoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Path(#[from] vigil_paths::PathError),
}

/// Storage for the cached display name.
pub trait DisplayNameStore: Send {
    fn load(&self) -> Result<Option<String>, LocalStoreError>;
    fn save(&self, name: &str) -> Result<(), LocalStoreError>;
    fn clear(&self) -> Result<(), LocalStoreError>;
}

impl<T: DisplayNameStore + ?Sized> DisplayNameStore for Box<T> {
    fn load(&self) -> Result<Option<String>, LocalStoreError> {
        (**self).load()
    }

    fn save(&self, name: &str) -> Result<(), LocalStoreError> {
        (**self).save(name)
    }

    fn clear(&self) -> Result<(), LocalStoreError> {
        (**self).clear()
    }
}

/// The file store at its default location, or an in-memory one when no
/// home directory can be resolved.
pub fn default_store() -> Box<dyn DisplayNameStore> {
    match FileDisplayNameStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!("display name will not persist: {e}");
            Box::new(MemoryDisplayNameStore::default())
        }
    }
}

/// Hint stored in a single text file.
#[derive(Debug, Clone)]
pub struct FileDisplayNameStore {
    path: PathBuf,
}

impl FileDisplayNameStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under the state directory.
    pub fn open_default() -> Result<Self, LocalStoreError> {
        Ok(Self::new(vigil_paths::display_name_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> LocalStoreError {
        LocalStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl DisplayNameStore for FileDisplayNameStore {
    fn load(&self) -> Result<Option<String>, LocalStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let name = content.trim();
                Ok((!name.is_empty()).then(|| name.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn save(&self, name: &str) -> Result<(), LocalStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        std::fs::write(&self.path, name.trim()).map_err(|e| self.io_err(e))
    }

    fn clear(&self) -> Result<(), LocalStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// In-process hint, for scripted CLI runs and tests.
#[derive(Debug, Default)]
pub struct MemoryDisplayNameStore {
    name: Mutex<Option<String>>,
}

impl MemoryDisplayNameStore {
    pub fn with_name(name: &str) -> Self {
        Self {
            name: Mutex::new(Some(name.to_string())),
        }
    }
}

impl DisplayNameStore for MemoryDisplayNameStore {
    fn load(&self) -> Result<Option<String>, LocalStoreError> {
        Ok(self.name.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn save(&self, name: &str) -> Result<(), LocalStoreError> {
        *self.name.lock().unwrap_or_else(|p| p.into_inner()) = Some(name.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), LocalStoreError> {
        *self.name.lock().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }
}
