use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::HttpMethod;

/// A file path that cannot be compiled into a route
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("unsupported method `{method}` in file: {}", file.display())]
    UnsupportedMethod { method: String, file: PathBuf },
    #[error("cannot compile {}: {reason}", file.display())]
    InvalidPath { file: PathBuf, reason: &'static str },
}

/// The hosting framework refused a registration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("pattern `{pattern}` is not supported by this router: {reason}")]
    Unsupported { pattern: String, reason: String },
    #[error("`{method} {pattern}` overlaps already registered `{existing}`")]
    Conflict {
        method: String,
        pattern: String,
        existing: String,
    },
}

/// Why a single file did not become a route
///
/// None of these abort a load; they are logged and collected into the
/// [`crate::LoadSummary`].
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("unable to read directory {}: {reason}", path.display())]
    DirectoryUnreadable { path: PathBuf, reason: String },
    #[error("failed to load handler: {reason}")]
    ModuleLoad { reason: String },
    #[error("no usable handler export")]
    InvalidExport,
    #[error("handler load timed out after {after:?}")]
    TimedOut { after: Duration },
    #[error(transparent)]
    Rejected(#[from] RegisterError),
    #[error("`{method} {pattern}` is already provided by {}", first.display())]
    Duplicate {
        method: HttpMethod,
        pattern: String,
        first: PathBuf,
    },
}

/// Coarse classification of a [`RouteError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    UnsupportedMethod,
    InvalidPath,
    DirectoryUnreadable,
    ModuleLoadFailure,
    InvalidHandlerExport,
    TimedOut,
    RegistrationRejected,
    DuplicateRoute,
}

impl RouteError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RouteError::Compile(CompileError::UnsupportedMethod { .. }) => FailureKind::UnsupportedMethod,
            RouteError::Compile(CompileError::InvalidPath { .. }) => FailureKind::InvalidPath,
            RouteError::DirectoryUnreadable { .. } => FailureKind::DirectoryUnreadable,
            RouteError::ModuleLoad { .. } => FailureKind::ModuleLoadFailure,
            RouteError::InvalidExport => FailureKind::InvalidHandlerExport,
            RouteError::TimedOut { .. } => FailureKind::TimedOut,
            RouteError::Rejected(_) => FailureKind::RegistrationRejected,
            RouteError::Duplicate { .. } => FailureKind::DuplicateRoute,
        }
    }
}

/// A load that could not run at all
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read route directory {}", root.display())]
    RootUnreadable {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "`{method} {pattern}` is defined by both {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateRoute {
        method: HttpMethod,
        pattern: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("route directory scan aborted: {0}")]
    ScanAborted(String),
}

pub type LoadResult<T> = Result<T, LoadError>;
