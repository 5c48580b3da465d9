// ============================================================================
// PROJECT STORE — opaque persistence for project metadata
// ============================================================================
//
// The core only requires `load` and `save` over the whole collection and
// treats the store as crash-consistent key-value storage under a fixed
// namespace. `JsonFileStore` is the default implementation: one JSON
// document per namespace, written to a temp file and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::project::Project;

/// Fixed namespace for the on-disk document.
pub const STORE_NAMESPACE: &str = "lumen_studio_v1";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Persistence interface consumed by the editing surface.
pub trait ProjectStore {
    fn load(&self) -> Result<Vec<Project>, StoreError>;
    fn save(&self, projects: &[Project]) -> Result<(), StoreError>;
}

/// File-backed store holding the whole collection as one JSON document.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<dir>/<namespace>.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{STORE_NAMESPACE}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectStore for JsonFileStore {
    /// A missing document is an empty collection, not an error.
    fn load(&self) -> Result<Vec<Project>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, projects: &[Project]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(projects)?;
        // Write-then-rename keeps the previous document intact if the
        // process dies mid-write.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        log::debug!("saved {} project(s) to {}", projects.len(), self.path.display());
        Ok(())
    }
}

/// In-memory store for tests and embedding without a filesystem.
#[derive(Default)]
pub struct MemoryStore {
    projects: std::cell::RefCell<Vec<Project>>,
}

impl ProjectStore for MemoryStore {
    fn load(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.projects.borrow().clone())
    }

    fn save(&self, projects: &[Project]) -> Result<(), StoreError> {
        *self.projects.borrow_mut() = projects.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::MediaKind;
    use crate::settings::Layer;

    fn temp_store() -> JsonFileStore {
        let dir = std::env::temp_dir().join(format!("lumen-store-{}", uuid::Uuid::new_v4()));
        JsonFileStore::in_dir(&dir)
    }

    #[test]
    fn missing_document_loads_as_empty() {
        let store = temp_store();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = temp_store();
        let mut p = Project::new("Alps", "alps.png", MediaKind::Photo);
        p.settings.vignette = 22.0;
        p.settings.layers.push(Layer::text("Caption", "ALPS"));

        store.save(std::slice::from_ref(&p)).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![p]);

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn save_overwrites_previous_document() {
        let store = temp_store();
        let a = Project::new("A", "a", MediaKind::Photo);
        let b = Project::new("B", "b", MediaKind::Video);
        store.save(&[a.clone(), b.clone()]).unwrap();
        store.save(std::slice::from_ref(&b)).unwrap();
        assert_eq!(store.load().unwrap(), vec![b]);

        let _ = fs::remove_file(store.path());
    }
}
