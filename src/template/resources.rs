//! Lazily populated resource caches for chunks and snippets.
//!
//! A [`ResourceCache`] maps names to resources. A miss walks the search
//! directories, most recently added first, and asks its [`Loader`] to probe
//! each one. The first hit wins. The outcome, including "not found", is
//! memoized for the life of the cache, so each name touches the filesystem
//! at most once and later changes on disk are not seen.
//!
//! Caches are shared between forked engines. Both the entry map and the
//! search list sit behind `RwLock`s; when two threads miss on the same name
//! at once, both may probe, and the first one to store its result wins.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use super::snippet::{ScriptSnippet, Snippet};

/// Finds a named resource inside one search directory.
pub trait Loader: Send + Sync {
    type Resource: Clone + Send + Sync;

    /// Look for `name` in `dir`. `Ok(None)` means not there; errors are
    /// logged by the cache and the next directory is tried.
    fn probe(&self, dir: &Path, name: &str) -> io::Result<Option<Self::Resource>>;
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    type Resource = L::Resource;

    fn probe(&self, dir: &Path, name: &str) -> io::Result<Option<Self::Resource>> {
        (**self).probe(dir, name)
    }
}

/// Chunk text by name.
pub type ChunkCache = ResourceCache<Box<dyn Loader<Resource = Arc<str>>>>;

/// Snippet units by name.
pub type SnippetRegistry = ResourceCache<Box<dyn Loader<Resource = Arc<dyn Snippet>>>>;

/// Chunk text read from `<dir>/<name>.<extension>`.
#[derive(Debug, Clone)]
pub struct ChunkFiles {
    extension: String,
}

impl ChunkFiles {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Default for ChunkFiles {
    fn default() -> Self {
        Self::new("html")
    }
}

impl Loader for ChunkFiles {
    type Resource = Arc<str>;

    fn probe(&self, dir: &Path, name: &str) -> io::Result<Option<Arc<str>>> {
        let path = dir.join(format!("{name}.{}", self.extension));
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(Arc::from(text))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Executable snippets found as `<dir>/<name>.<extension>`.
///
/// The file is not read here; it becomes a [`ScriptSnippet`] that runs the
/// file when the snippet is invoked.
#[derive(Debug, Clone)]
pub struct SnippetScripts {
    extension: String,
}

impl SnippetScripts {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Default for SnippetScripts {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl Loader for SnippetScripts {
    type Resource = Arc<dyn Snippet>;

    fn probe(&self, dir: &Path, name: &str) -> io::Result<Option<Arc<dyn Snippet>>> {
        let path = dir.join(format!("{name}.{}", self.extension));
        if path.is_file() {
            Ok(Some(Arc::new(ScriptSnippet::new(path))))
        } else {
            Ok(None)
        }
    }
}

/// Name → resource memo with ordered-directory fallback.
pub struct ResourceCache<L: Loader> {
    loader: L,
    search_paths: RwLock<Vec<PathBuf>>,
    entries: RwLock<HashMap<String, Option<L::Resource>>>,
}

impl<L: Loader> ResourceCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            search_paths: RwLock::new(Vec::new()),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Add a directory ahead of all existing ones.
    pub fn add_search_path(&self, path: impl Into<PathBuf>) {
        self.search_paths
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, path.into());
    }

    /// Search directories in lookup order.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.search_paths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store `resource` under `name`, replacing whatever was cached.
    pub fn register(&self, name: impl Into<String>, resource: L::Resource) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), Some(resource));
    }

    /// Get-or-load. `None` means no directory has it.
    pub fn get(&self, name: &str) -> Option<L::Resource> {
        if let Some(cached) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return cached.clone();
        }

        let loaded = self.load(name);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_owned())
            .or_insert(loaded)
            .clone()
    }

    fn load(&self, name: &str) -> Option<L::Resource> {
        for dir in self.search_paths() {
            match self.loader.probe(&dir, name) {
                Ok(Some(resource)) => {
                    debug!(name, dir = %dir.display(), "loaded resource");
                    return Some(resource);
                }
                Ok(None) => {}
                Err(e) => warn!(name, dir = %dir.display(), error = %e, "unreadable resource"),
            }
        }
        debug!(name, "resource not found");
        None
    }
}

impl<L: Loader> std::fmt::Debug for ResourceCache<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ResourceCache")
            .field("search_paths", &self.search_paths())
            .field("entries", &entries.len())
            .finish()
    }
}
