//! Package filesystems.
//!
//! The engine never parses raw files. A filesystem hands back keyvalue trees
//! that were already parsed by whatever owns the underlying zip or folder.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use stylepak_types::Keyvalues;
use thiserror::Error;

/// Shared handle to a package filesystem.
pub type FsHandle = Arc<dyn FileSystem>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FsError {
    #[error("file not found: {fsys}:{path}")]
    NotFound { fsys: String, path: String },

    #[error("failed to read {fsys}:{path}: {message}")]
    Read {
        fsys: String,
        path: String,
        message: String,
    },
}

impl FsError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Source of parsed package files.
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// Location of the package, for messages.
    fn path(&self) -> &str;

    /// Reads and returns the parsed tree stored at `path`.
    fn read_tree(&self, path: &str) -> Result<Keyvalues, FsError>;

    /// Unpacked development folders get extra warnings and are always
    /// treated as stale.
    fn is_dev(&self) -> bool {
        false
    }

    fn contains(&self, path: &str) -> bool {
        self.read_tree(path).is_ok()
    }
}

/// Reads a tree, treating a missing file as `None`.
pub(crate) fn read_optional(
    fsys: &dyn FileSystem,
    path: &str,
) -> Result<Option<Keyvalues>, FsError> {
    match fsys.read_tree(path) {
        Ok(tree) => Ok(Some(tree)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// In-process filesystem holding pre-parsed trees.
///
/// Paths use `/` separators and are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    path: String,
    files: BTreeMap<String, Keyvalues>,
    dev: bool,
}

impl MemoryFileSystem {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            files: BTreeMap::new(),
            dev: false,
        }
    }

    /// Builds a filesystem from a JSON object mapping paths to trees, the
    /// form package bundles are cached in.
    pub fn from_json(path: impl Into<String>, json: &str) -> Result<Self, FsError> {
        let path = path.into();
        let files: BTreeMap<String, Keyvalues> =
            serde_json::from_str(json).map_err(|e| FsError::Read {
                fsys: path.clone(),
                path: "<bundle>".to_string(),
                message: e.to_string(),
            })?;
        let mut fsys = Self::new(path);
        for (file, tree) in files {
            fsys.insert(&file, tree);
        }
        Ok(fsys)
    }

    /// Builder form of [`MemoryFileSystem::insert`].
    #[must_use]
    pub fn with_file(mut self, path: &str, tree: Keyvalues) -> Self {
        self.insert(path, tree);
        self
    }

    /// Marks this filesystem as an unpacked development folder.
    #[must_use]
    pub fn dev(mut self) -> Self {
        self.dev = true;
        self
    }

    pub fn insert(&mut self, path: &str, tree: Keyvalues) {
        self.files.insert(normalize(path), tree);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Converts into a shared handle.
    #[must_use]
    pub fn into_handle(self) -> FsHandle {
        Arc::new(self)
    }
}

impl FileSystem for MemoryFileSystem {
    fn path(&self) -> &str {
        &self.path
    }

    fn read_tree(&self, path: &str) -> Result<Keyvalues, FsError> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| FsError::NotFound {
                fsys: self.path.clone(),
                path: path.to_string(),
            })
    }

    fn is_dev(&self) -> bool {
        self.dev
    }

    fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize(path))
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_lowercase()
}
