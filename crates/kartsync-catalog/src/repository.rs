//! The single read/write path to the catalog file.
//!
//! Every write replaces the whole file: the new document is written to a
//! sibling temp file, synced, then renamed over the target, so readers see
//! either the old catalog or the new one. Runs that modify the catalog hold a
//! create-new lock file (`<catalog>.lock`) for their duration.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use kartsync_core::Catalog;

use crate::error::CatalogError;

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    path: PathBuf,
}

/// Held while a run owns the catalog; removes the lock file on drop.
#[derive(Debug)]
pub struct CatalogLock {
    path: PathBuf,
}

impl Drop for CatalogLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove catalog lock");
        }
    }
}

impl CatalogRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    fn temp_path(&self) -> PathBuf {
        sibling(&self.path, ".tmp")
    }

    /// Reads the catalog. A missing file is an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file exists but cannot be read,
    /// or [`CatalogError::Parse`] if it is not a valid catalog document.
    pub fn load(&self) -> Result<Catalog, CatalogError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "catalog file not found; starting empty");
                return Ok(Catalog::default());
            }
            Err(e) => return Err(CatalogError::io(&self.path, e)),
        };

        let catalog: Catalog =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: self.path.display().to_string(),
                source,
            })?;
        tracing::debug!(path = %self.path.display(), products = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Writes `catalog` as pretty-printed JSON, atomically replacing the file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Serialize`] or [`CatalogError::Io`]. On error
    /// the previous file content is left in place.
    pub fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let mut json = serde_json::to_string_pretty(catalog).map_err(CatalogError::Serialize)?;
        json.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
        }

        let tmp = self.temp_path();
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(CatalogError::io(&tmp, e));
        }
        fs::rename(&tmp, &self.path).map_err(|e| CatalogError::io(&self.path, e))?;

        tracing::info!(path = %self.path.display(), products = catalog.len(), "catalog saved");
        Ok(())
    }

    /// Takes the exclusive catalog lock.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Locked`] if another run holds the lock, or
    /// [`CatalogError::Io`] if the lock file cannot be created.
    pub fn lock(&self) -> Result<CatalogLock, CatalogError> {
        let path = self.lock_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Informational only; the file's existence is the lock.
                let _ = writeln!(file, "{}", std::process::id());
                Ok(CatalogLock { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(CatalogError::Locked {
                path: path.display().to_string(),
            }),
            Err(e) => Err(CatalogError::io(&path, e)),
        }
    }

    /// Lock, load, apply `f`, save. Nothing is written if `f` fails.
    ///
    /// # Errors
    ///
    /// Returns any lock, load or save error, or the error returned by `f`.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut Catalog) -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        let _lock = self.lock()?;
        let mut catalog = self.load()?;
        let out = f(&mut catalog)?;
        self.save(&catalog)?;
        Ok(out)
    }
}

/// `data/products.json` + `.lock` → `data/products.json.lock`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
#[path = "repository_test.rs"]
mod tests;
