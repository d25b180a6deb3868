//! Handler resolution for route files
//!
//! A route file names *where* a handler is mounted; a [`HandlerSource`]
//! decides *what* that handler is. Sources can read the file itself, look
//! the path up in a table generated at compile time, or anything else that
//! can produce a [`HandlerExport`] for a path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

/// A discovered route file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFile {
    /// Path as found by the walker (root joined with `relative`)
    pub path: PathBuf,
    /// Path relative to the scan root
    pub relative: PathBuf,
}

impl RouteFile {
    pub fn new(root: &Path, path: PathBuf) -> Self {
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        Self { path, relative }
    }

    /// Relative path with `/` separators on every platform
    pub fn key(&self) -> String {
        self.relative.to_string_lossy().replace('\\', "/")
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|ext| ext.to_str())
    }
}

/// What loading a route file produced
#[derive(Debug, Clone)]
pub enum HandlerExport<H, R> {
    /// Invoked for the file's own method only
    Handler(H),
    /// Mounted at the file's pattern for every method (`use`)
    Router(R),
    /// The file loaded but exposes nothing routable
    Missing,
}

impl<H, R> HandlerExport<H, R> {
    pub fn is_missing(&self) -> bool {
        matches!(self, HandlerExport::Missing)
    }
}

/// Produces the handler behind a route file
///
/// Returning `Err` means the file could not be loaded at all; returning
/// [`HandlerExport::Missing`] means it loaded but is not a handler.
#[async_trait]
pub trait HandlerSource: Send + Sync {
    type Handler: Send;
    type Router: Send;

    async fn load(&self, file: &RouteFile) -> Result<HandlerExport<Self::Handler, Self::Router>>;
}

/// Handlers compiled into the binary, keyed by path relative to the root
///
/// # Examples
///
/// ```
/// use fsroute::{HandlerExport, StaticHandlers};
///
/// let handlers: StaticHandlers<&str, ()> = StaticHandlers::new()
///     .with_handler("users/GET.[id].rs", "show_user")
///     .with_router("admin/GET.index.rs", ());
/// assert_eq!(handlers.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct StaticHandlers<H, R> {
    exports: HashMap<String, HandlerExport<H, R>>,
}

impl<H, R> Default for StaticHandlers<H, R> {
    fn default() -> Self {
        Self {
            exports: HashMap::new(),
        }
    }
}

impl<H, R> StaticHandlers<H, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_export(mut self, relative: impl Into<String>, export: HandlerExport<H, R>) -> Self {
        self.exports.insert(relative.into().replace('\\', "/"), export);
        self
    }

    pub fn with_handler(self, relative: impl Into<String>, handler: H) -> Self {
        self.with_export(relative, HandlerExport::Handler(handler))
    }

    pub fn with_router(self, relative: impl Into<String>, router: R) -> Self {
        self.with_export(relative, HandlerExport::Router(router))
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }
}

#[async_trait]
impl<H, R> HandlerSource for StaticHandlers<H, R>
where
    H: Clone + Send + Sync,
    R: Clone + Send + Sync,
{
    type Handler = H;
    type Router = R;

    async fn load(&self, file: &RouteFile) -> Result<HandlerExport<H, R>> {
        self.exports
            .get(&file.key())
            .cloned()
            .ok_or_else(|| anyhow!("no handler compiled in for {}", file.key()))
    }
}
