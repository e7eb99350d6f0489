//! Replay file storage.
//!
//! Reads and writes are treated as atomic calls that succeed or fail
//! immediately; there is no async contract. `DiskStore` is the production
//! backend; `MemoryStore` backs tests and headless hosts.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use bevy::prelude::*;

/// Storage backend for replay files.
pub trait ReplayStore: Send + Sync {
    /// Write `text` to `name`, returning whether the write succeeded.
    fn write(&mut self, name: &str, text: &str) -> bool;

    /// Read the contents of `name`, or `None` if it cannot be read.
    fn read(&self, name: &str) -> Option<String>;
}

/// Filesystem-backed store rooted at a directory.
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl ReplayStore for DiskStore {
    fn write(&mut self, name: &str, text: &str) -> bool {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && fs::create_dir_all(parent).is_err() {
                warn!("DiskStore: could not create directory {:?}", parent);
                return false;
            }
        }
        match fs::write(&path, text) {
            Ok(()) => true,
            Err(e) => {
                warn!("DiskStore: failed to write {:?}: {}", path, e);
                false
            }
        }
    }

    fn read(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.path(name)).ok()
    }
}

/// In-memory store for tests and headless hosts.
#[derive(Default)]
pub struct MemoryStore {
    files: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write report failure.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Pre-seed a file, e.g. a hand-built replay for a test.
    pub fn insert(&mut self, name: &str, text: &str) {
        self.files.insert(name.to_string(), text.to_string());
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ReplayStore for MemoryStore {
    fn write(&mut self, name: &str, text: &str) -> bool {
        if self.fail_writes {
            return false;
        }
        self.files.insert(name.to_string(), text.to_string());
        true
    }

    fn read(&self, name: &str) -> Option<String> {
        self.files.get(name).cloned()
    }
}

/// Resource wrapper holding the active store backend.
///
/// Defaults to a [`DiskStore`] rooted at `replays/`; hosts swap in their
/// own backend by inserting this resource before the plugin initializes.
#[derive(Resource)]
pub struct ReplayStorage(pub Box<dyn ReplayStore>);

impl Default for ReplayStorage {
    fn default() -> Self {
        Self(Box::new(DiskStore::new("replays")))
    }
}
