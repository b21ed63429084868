//! Concurrent registry of file ids and their sketches.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::sketch::Sketch;

/// Identifier assigned to an input file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(usize);

impl FileId {
    /// Gets the raw id.
    pub const fn get(self) -> usize {
        self.0
    }
}

/// Assigns monotonically increasing ids to paths.
#[derive(Default)]
pub struct PathInterner {
    next: AtomicUsize,
    ids: RwLock<HashMap<PathBuf, FileId>>,
}

impl PathInterner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the id of `path`, assigning a fresh one on first sight.
    pub fn intern<P>(&self, path: P) -> FileId
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if let Some(&id) = self.ids.read().get(path) {
            return id;
        }
        *self
            .ids
            .write()
            .entry(path.to_path_buf())
            .or_insert_with(|| FileId(self.next.fetch_add(1, Ordering::Relaxed)))
    }

    /// Gets the id of `path` if it has been interned.
    pub fn get<P>(&self, path: P) -> Option<FileId>
    where
        P: AsRef<Path>,
    {
        self.ids.read().get(path.as_ref()).copied()
    }

    /// Gets the number of interned paths.
    pub fn len(&self) -> usize {
        self.ids.read().len()
    }

    /// Checks if no path has been interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sketches keyed by file id, where the first stored sketch wins.
#[derive(Default)]
pub struct SketchCache {
    sketches: RwLock<HashMap<FileId, Sketch>>,
}

impl SketchCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the sketch of `id`.
    pub fn get(&self, id: FileId) -> Option<Sketch> {
        self.sketches.read().get(&id).cloned()
    }

    /// Stores `sketch` unless `id` already has one, and returns the stored sketch.
    pub fn put_if_absent(&self, id: FileId, sketch: Sketch) -> Sketch {
        self.sketches.write().entry(id).or_insert(sketch).clone()
    }

    /// Gets the number of cached sketches.
    pub fn len(&self) -> usize {
        self.sketches.read().len()
    }

    /// Checks if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
