//! File access by logical name.
//!
//! The pipeline never touches paths directly. It reads, writes and copies
//! tracked files through a [`Storage`], addressing them by their resolved
//! logical name (`"messages_en.toml"`, `"backup-1700000000000/config.toml"`).
//! Bundled references (the shipped defaults of each tracked file) come from
//! the same trait so hosts can serve them from disk or from memory.
//!
//! Missing files are not errors: `read` and `bundled` return `None`. Only
//! actual I/O failures (permissions, invalid UTF-8, full disks) are
//! propagated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::UpdateError;

/// Access to on-disk tracked files and their bundled references.
pub trait Storage {
    /// Whether an on-disk file exists for `name`.
    fn exists(&self, name: &str) -> bool;

    /// On-disk contents of `name`, or `None` if there is no such file.
    fn read(&self, name: &str) -> Result<Option<String>, UpdateError>;

    /// Replace the on-disk contents of `name`, creating parent directories.
    fn write(&self, name: &str, contents: &str) -> Result<(), UpdateError>;

    /// Copy the on-disk file `from` to `to`, creating parent directories and
    /// overwriting any existing destination.
    fn copy(&self, from: &str, to: &str) -> Result<(), UpdateError>;

    /// The bundled reference for `name`, or `None` if none is shipped.
    fn bundled(&self, name: &str) -> Result<Option<String>, UpdateError>;
}

/// Where bundled reference documents come from.
#[derive(Debug, Clone)]
pub enum BundledResources {
    /// A directory laid out like the data directory.
    Dir(PathBuf),
    /// Contents keyed by resolved logical name, e.g. from `include_str!`.
    Embedded(HashMap<String, String>),
}

impl BundledResources {
    pub fn embedded<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        BundledResources::Embedded(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// [`Storage`] over a data directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
    resources: BundledResources,
}

impl FsStorage {
    /// Storage rooted at `root` with no bundled references yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            resources: BundledResources::Embedded(HashMap::new()),
        }
    }

    pub fn with_resources(mut self, resources: BundledResources) -> Self {
        self.resources = resources;
        self
    }

    /// Absolute path of the on-disk file for `name`.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Storage for FsStorage {
    fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    fn read(&self, name: &str) -> Result<Option<String>, UpdateError> {
        read_optional(&self.path_of(name))
    }

    fn write(&self, name: &str, contents: &str) -> Result<(), UpdateError> {
        let path = self.path_of(name);
        create_parent(&path)?;
        std::fs::write(&path, contents).map_err(|e| UpdateError::IoError { path, source: e })
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), UpdateError> {
        let source = self.path_of(from);
        let dest = self.path_of(to);
        create_parent(&dest)?;
        std::fs::copy(&source, &dest).map_err(|e| UpdateError::IoError {
            path: source,
            source: e,
        })?;
        Ok(())
    }

    fn bundled(&self, name: &str) -> Result<Option<String>, UpdateError> {
        match &self.resources {
            BundledResources::Dir(dir) => read_optional(&dir.join(name)),
            BundledResources::Embedded(map) => Ok(map.get(name).cloned()),
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, UpdateError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(UpdateError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn create_parent(path: &Path) -> Result<(), UpdateError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| UpdateError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}
