//! Scene persistence.
//!
//! The scene is stored as a flat JSON array of object records under a
//! well-known key. The `Storage` trait abstracts over where that string
//! lives: an in-memory map for tests and previews, a directory of files
//! for native builds, or the host's key-value store behind the same
//! interface.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::scene::SceneState;
use thiserror::Error;

/// Key the object layer persists under.
pub const SCENE_STORAGE_KEY: &str = "scene.objects";

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("entry not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Other(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A synchronous string key-value store.
pub trait Storage {
    /// Save a value under a key, overwriting any previous value.
    fn save(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Load the value for a key. `NotFound` if absent.
    fn load(&self, key: &str) -> StorageResult<String>;

    /// Delete the value for a key. Deleting a missing key is fine.
    fn delete(&self, key: &str) -> StorageResult<()>;

    fn exists(&self, key: &str) -> StorageResult<bool>;

    /// All stored keys, in no particular order.
    fn list_keys(&self) -> StorageResult<Vec<String>>;
}

/// Persist the scene's objects under [`SCENE_STORAGE_KEY`].
pub fn save_scene(storage: &dyn Storage, scene: &SceneState) -> StorageResult<()> {
    let json = scene.to_json()?;
    storage.save(SCENE_STORAGE_KEY, &json)
}

/// Load the persisted scene into `scene`. A missing entry loads an empty
/// scene; a corrupt entry does too (the scene logs and resets).
pub fn load_scene(storage: &dyn Storage, scene: &mut SceneState) -> StorageResult<()> {
    match storage.load(SCENE_STORAGE_KEY) {
        Ok(json) => {
            scene.load_json(&json);
            Ok(())
        }
        Err(StorageError::NotFound(_)) => {
            scene.load_records(Vec::new());
            Ok(())
        }
        Err(err) => Err(err),
    }
}
