//! Output surfaces a stream is rendered into.
//!
//! The caller resolves the surface and passes the handle in; the renderer
//! never looks anything up by name.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub trait RenderTarget: Send {
    /// Replace the whole rendered content.
    fn replace(&mut self, markup: &str) -> io::Result<()>;

    /// Current rendered content, as the surface holds it.
    fn content(&self) -> io::Result<String>;
}

/// In-memory surface. Clones share the same content, and concurrent writers
/// on clones simply overwrite each other.
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    content: String,
    writes: usize,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        let target = Self::new();
        if let Ok(mut inner) = target.inner.lock() {
            inner.content = content.into();
        }
        target
    }

    /// Number of `replace` calls so far.
    pub fn writes(&self) -> usize {
        self.inner.lock().map(|inner| inner.writes).unwrap_or(0)
    }
}

impl RenderTarget for MemoryTarget {
    fn replace(&mut self, markup: &str) -> io::Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory target lock poisoned"))?;
        inner.content.clear();
        inner.content.push_str(markup);
        inner.writes += 1;
        Ok(())
    }

    fn content(&self) -> io::Result<String> {
        self.inner
            .lock()
            .map(|inner| inner.content.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory target lock poisoned"))
    }
}

/// Rewrites a file on every update, e.g. for a browser with live reload.
#[derive(Debug, Clone)]
pub struct FileTarget {
    path: PathBuf,
}

impl FileTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenderTarget for FileTarget {
    fn replace(&mut self, markup: &str) -> io::Result<()> {
        fs::write(&self.path, markup)
    }

    fn content(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}
