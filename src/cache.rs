//! ### Cache
//! Memoized loading. Each entry is keyed by the identity of its input, a
//! path or a hash of uploaded bytes, so two uploads never observe each
//! other's data. The cache is an ordinary value owned by the caller.

use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::debug;

use crate::error::Result;
use crate::load::{self, Loaded};
use crate::record::DatasetKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Path(PathBuf, DatasetKind),
    Content(u64, DatasetKind),
}

impl SourceKey {
    pub fn for_path(path: &Path, kind: DatasetKind) -> Self {
        SourceKey::Path(path.to_path_buf(), kind)
    }

    pub fn for_bytes(bytes: &[u8], kind: DatasetKind) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        SourceKey::Content(hasher.finish(), kind)
    }
}

#[derive(Debug, Default)]
pub struct LoadCache {
    entries: HashMap<SourceKey, Arc<Loaded>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load_path(&mut self, path: &Path, kind: DatasetKind) -> Result<Arc<Loaded>> {
        let key = SourceKey::for_path(path, kind);
        self.get_or_insert_with(key, || load::load_path(path, kind))
    }

    pub fn get_or_load_bytes(&mut self, bytes: &[u8], kind: DatasetKind) -> Result<Arc<Loaded>> {
        let key = SourceKey::for_bytes(bytes, kind);
        self.get_or_insert_with(key, || load::load_bytes(bytes, kind))
    }

    fn get_or_insert_with(
        &mut self,
        key: SourceKey,
        load: impl FnOnce() -> Result<Loaded>,
    ) -> Result<Arc<Loaded>> {
        if let Some(hit) = self.entries.get(&key) {
            debug!("Load cache hit: {key:?}");
            return Ok(Arc::clone(hit));
        }
        debug!("Load cache miss: {key:?}");
        // Failed loads are not cached; the next call retries.
        let loaded = Arc::new(load()?);
        self.entries.insert(key, Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Drops one entry, e.g. after the file behind a path changed.
    pub fn invalidate(&mut self, key: &SourceKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
