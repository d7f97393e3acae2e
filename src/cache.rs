//! Parsed snapshots of tracked files and their bundled references.
//!
//! The cache holds parsed documents, not file handles. Anything that changes
//! a tracked file on disk (hooks, the version rewrite stage) leaves the cache
//! stale until [`DocumentCache::cache_files`] or [`DocumentCache::reload`]
//! runs again.

use std::collections::HashMap;

use log::{debug, warn};

use crate::document::Document;
use crate::error::UpdateError;
use crate::storage::Storage;

/// Disk and reference documents keyed by resolved file name.
#[derive(Debug)]
pub struct DocumentCache<D> {
    disk: HashMap<String, D>,
    reference: HashMap<String, D>,
}

impl<D> Default for DocumentCache<D> {
    fn default() -> Self {
        Self {
            disk: HashMap::new(),
            reference: HashMap::new(),
        }
    }
}

impl<D: Document> DocumentCache<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything and load `names` afresh.
    ///
    /// Names without an on-disk file are left out. Returns how many disk
    /// documents were cached.
    pub fn cache_files(
        &mut self,
        storage: &dyn Storage,
        names: &[String],
    ) -> Result<usize, UpdateError> {
        self.clear();
        for name in names {
            self.reload(storage, name)?;
        }
        debug!(
            "Cached {} of {} tracked files",
            self.disk.len(),
            names.len()
        );
        Ok(self.disk.len())
    }

    /// Replace the entry for `name` with fresh copies from storage.
    ///
    /// Returns `false` (and leaves no entry) when `name` has no on-disk file.
    /// A missing bundled reference still caches the disk document, but the
    /// file will not be merged.
    pub fn reload(&mut self, storage: &dyn Storage, name: &str) -> Result<bool, UpdateError> {
        self.disk.remove(name);
        self.reference.remove(name);

        let Some(text) = storage.read(name)? else {
            return Ok(false);
        };
        let disk = parse_document(name, &text)?;

        match storage.bundled(name)? {
            Some(bundled) => {
                let reference = parse_document(&format!("bundled {name}"), &bundled)?;
                self.reference.insert(name.to_string(), reference);
            }
            None => warn!("No bundled reference for {name}; it will not be merged"),
        }

        self.disk.insert(name.to_string(), disk);
        Ok(true)
    }

    pub fn disk(&self, name: &str) -> Option<&D> {
        self.disk.get(name)
    }

    pub fn disk_mut(&mut self, name: &str) -> Option<&mut D> {
        self.disk.get_mut(name)
    }

    pub fn reference(&self, name: &str) -> Option<&D> {
        self.reference.get(name)
    }

    /// The disk document for `name` alongside its reference, if both exist.
    pub fn pair_mut(&mut self, name: &str) -> Option<(&mut D, &D)> {
        let disk = self.disk.get_mut(name)?;
        let reference = self.reference.get(name)?;
        Some((disk, reference))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.disk.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.disk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disk.is_empty()
    }

    pub fn clear(&mut self) {
        self.disk.clear();
        self.reference.clear();
    }
}

/// Parse `text` as a `D`, naming `name` in the error.
pub(crate) fn parse_document<D: Document>(name: &str, text: &str) -> Result<D, UpdateError> {
    D::parse(text).map_err(|e| UpdateError::ParseError {
        name: name.to_string(),
        source: Box::new(e),
    })
}
