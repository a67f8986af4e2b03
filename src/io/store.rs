use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Error type for document store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("no such document: {0}")]
    NotFound(PathBuf),
    #[error("could not list vault: {0}")]
    WalkError(#[from] walkdir::Error),
}

/// Read/write access to the documents of a vault.
///
/// All paths are vault-relative.
pub trait DocumentStore {
    fn read(&self, path: &Path) -> Result<String, StoreError>;
    fn write(&self, path: &Path, text: &str) -> Result<(), StoreError>;
    fn exists(&self, path: &Path) -> bool;
    /// All markdown documents, sorted by path
    fn list(&self) -> Result<Vec<PathBuf>, StoreError>;
}

// ---------------------------------------------------------------------------
// File system store
// ---------------------------------------------------------------------------

/// A vault directory on disk.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert an absolute path under the vault into a vault-relative one
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.root).ok().map(Path::to_path_buf)
    }
}

impl DocumentStore for FsStore {
    fn read(&self, path: &Path) -> Result<String, StoreError> {
        let full = self.root.join(path);
        fs::read_to_string(&full).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
            _ => StoreError::ReadError {
                path: path.to_path_buf(),
                source: e,
            },
        })
    }

    fn write(&self, path: &Path, text: &str) -> Result<(), StoreError> {
        atomic_write(&self.root.join(path), text.as_bytes()).map_err(|e| {
            StoreError::WriteError {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).is_file()
    }

    fn list(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut docs = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name().to_str()));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_markdown(entry.path()) {
                continue;
            }
            if let Some(rel) = self.relative(entry.path()) {
                docs.push(rel);
            }
        }
        docs.sort();
        Ok(docs)
    }
}

fn is_hidden(name: Option<&str>) -> bool {
    name.is_some_and(|n| n.starts_with('.'))
}

/// Whether a path names a markdown document
pub fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("md")
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    docs: BTreeMap<PathBuf, String>,
    writes: Vec<PathBuf>,
    failing: HashSet<PathBuf>,
}

/// An in-memory vault. Clones share the same documents, so a caller can keep a
/// handle to inspect and edit documents owned by an orchestrator.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a document without recording it as a write
    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.inner
            .borrow_mut()
            .docs
            .insert(path.into(), text.into());
    }

    /// Delete a document without recording it as a write
    pub fn remove(&self, path: impl AsRef<Path>) {
        self.inner.borrow_mut().docs.remove(path.as_ref());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.inner.borrow().docs.get(path.as_ref()).cloned()
    }

    /// Paths written through `DocumentStore::write`, in order
    pub fn writes(&self) -> Vec<PathBuf> {
        self.inner.borrow().writes.clone()
    }

    /// Make every subsequent write to `path` fail
    pub fn fail_writes_to(&self, path: impl Into<PathBuf>) {
        self.inner.borrow_mut().failing.insert(path.into());
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, path: &Path) -> Result<String, StoreError> {
        self.get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, text: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        if inner.failing.contains(path) {
            return Err(StoreError::WriteError {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "write refused"),
            });
        }
        inner.docs.insert(path.to_path_buf(), text.to_string());
        inner.writes.push(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.borrow().docs.contains_key(path)
    }

    fn list(&self) -> Result<Vec<PathBuf>, StoreError> {
        Ok(self
            .inner
            .borrow()
            .docs
            .keys()
            .filter(|p| is_markdown(p))
            .cloned()
            .collect())
    }
}
