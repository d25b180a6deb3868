// File: src/loader.rs
// Purpose: Scans a route directory and registers every route file it finds

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::{ConflictPolicy, RoutingConfig};
use crate::error::{FailureKind, LoadError, LoadResult, RouteError};
use crate::handler::{HandlerSource, RouteFile};
use crate::registrar::{register, Registration, RouteRegistrar};
use crate::route::{compile_route, CompiledRoute, PatternToken};
use crate::walker::scan_files;
use crate::HttpMethod;

/// A file that did not become a route
#[derive(Debug)]
pub struct LoadFailure {
    pub file: PathBuf,
    pub error: RouteError,
}

impl LoadFailure {
    pub fn kind(&self) -> FailureKind {
        self.error.kind()
    }
}

/// Outcome of a load pass
#[derive(Debug, Default)]
pub struct LoadSummary {
    /// Registered routes, in registration order
    pub registered: Vec<CompiledRoute>,
    pub failures: Vec<LoadFailure>,
    /// Files skipped because of their extension
    pub ignored: Vec<PathBuf>,
}

impl LoadSummary {
    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn failures_of(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind() == kind).count()
    }

    /// True when every route file registered
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Loads route files from a directory into a [`RouteRegistrar`]
///
/// One load pass: scan the root (sorted), compile every file, reject
/// duplicate routes, then load each handler through the [`HandlerSource`]
/// and register it. Per-file problems are logged and collected in the
/// returned [`LoadSummary`]; they never stop the pass.
///
/// # Examples
///
/// ```no_run
/// use fsroute::{RecordingRegistrar, RouteLoader, StaticHandlers};
///
/// # async fn run() -> fsroute::LoadResult<()> {
/// let handlers: StaticHandlers<&str, ()> = StaticHandlers::new()
///     .with_handler("users/GET.[id].rs", "show_user");
/// let mut registrar = RecordingRegistrar::new();
///
/// let summary = RouteLoader::new(handlers).load(&mut registrar, "routes").await?;
/// println!("{} routes", summary.registered_count());
/// # Ok(())
/// # }
/// ```
pub struct RouteLoader<S> {
    source: S,
    config: RoutingConfig,
}

impl<S: HandlerSource> RouteLoader<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, RoutingConfig::default())
    }

    pub fn with_config(source: S, config: RoutingConfig) -> Self {
        Self { source, config }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.config.base_path = base_path.into();
        self
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Runs one load pass over `root`
    ///
    /// Fails only when the root itself cannot be read, when the scan task
    /// dies, or (with [`ConflictPolicy::Fail`]) when two files compile to
    /// the same route. Nothing is registered in the last case.
    pub async fn load<G>(&self, registrar: &mut G, root: impl AsRef<Path>) -> LoadResult<LoadSummary>
    where
        G: RouteRegistrar<Handler = S::Handler, Router = S::Router>,
    {
        let root = root.as_ref().to_path_buf();
        info!(root = %root.display(), base_path = %self.config.base_path, "[ROUTES] Loading routes");

        let scan_root = root.clone();
        let max_depth = self.config.max_depth;
        let outcome = tokio::task::spawn_blocking(move || scan_files(&scan_root, max_depth))
            .await
            .map_err(|err| LoadError::ScanAborted(err.to_string()))??;

        let mut summary = LoadSummary::default();

        // Already logged by the walker
        for dir in outcome.unreadable {
            summary.failures.push(LoadFailure {
                error: RouteError::DirectoryUnreadable {
                    path: dir.path.clone(),
                    reason: dir.reason,
                },
                file: dir.path,
            });
        }

        let mut compiled = Vec::new();
        for path in outcome.files {
            let file = RouteFile::new(&root, path);

            if !self.config.accepts_extension(file.extension()) {
                debug!("[DEBUG] Skipping unsupported file extension: {}", file.path.display());
                summary.ignored.push(file.path);
                continue;
            }

            match compile_route(&file.path, &root, &self.config.base_path) {
                Ok(route) => compiled.push((file, route)),
                Err(err) => record_failure(&mut summary, file.path, err.into()),
            }
        }

        let compiled = self.resolve_conflicts(compiled, &mut summary)?;

        for (file, route) in compiled {
            debug!("[DEBUG] Processing file: {}", file.path.display());
            match self.load_and_register(registrar, &file, &route).await {
                Ok(_) => summary.registered.push(route),
                Err(err) => record_failure(&mut summary, file.path, err),
            }
        }

        info!(
            registered = summary.registered_count(),
            failed = summary.failure_count(),
            ignored = summary.ignored.len(),
            "[ROUTES] Route loading complete: {} registered, {} failed",
            summary.registered_count(),
            summary.failure_count()
        );

        Ok(summary)
    }

    /// Applies the conflict policy to routes with the same method and shape
    fn resolve_conflicts(
        &self,
        compiled: Vec<(RouteFile, CompiledRoute)>,
        summary: &mut LoadSummary,
    ) -> LoadResult<Vec<(RouteFile, CompiledRoute)>> {
        let mut seen: HashMap<(HttpMethod, Vec<PatternToken>), PathBuf> = HashMap::new();
        let mut kept = Vec::with_capacity(compiled.len());

        for (file, route) in compiled {
            let key = (route.method, route.shape());
            let Some(first) = seen.get(&key) else {
                seen.insert(key, route.source_file.clone());
                kept.push((file, route));
                continue;
            };

            match self.config.on_conflict {
                ConflictPolicy::Fail => {
                    let err = LoadError::DuplicateRoute {
                        method: route.method,
                        pattern: route.pattern,
                        first: first.clone(),
                        second: file.path,
                    };
                    error!("[ERROR] {}", err);
                    return Err(err);
                }
                ConflictPolicy::FirstWins => {
                    let err = RouteError::Duplicate {
                        method: route.method,
                        pattern: route.pattern,
                        first: first.clone(),
                    };
                    record_failure(summary, file.path, err);
                }
            }
        }

        Ok(kept)
    }

    async fn load_and_register<G>(
        &self,
        registrar: &mut G,
        file: &RouteFile,
        route: &CompiledRoute,
    ) -> Result<Registration, RouteError>
    where
        G: RouteRegistrar<Handler = S::Handler, Router = S::Router>,
    {
        let limit = self.config.file_timeout();
        let export = match timeout(limit, self.source.load(file)).await {
            Err(_) => return Err(RouteError::TimedOut { after: limit }),
            Ok(Err(err)) => {
                return Err(RouteError::ModuleLoad {
                    reason: format!("{:#}", err),
                })
            }
            Ok(Ok(export)) => export,
        };

        register(registrar, route, export)
    }
}

/// Loads `root` with the default configuration and the given base path
///
/// `base_path` falls back to `/api`.
pub async fn load_routes<S, G>(
    registrar: &mut G,
    source: S,
    root: impl AsRef<Path>,
    base_path: Option<&str>,
) -> LoadResult<LoadSummary>
where
    S: HandlerSource,
    G: RouteRegistrar<Handler = S::Handler, Router = S::Router>,
{
    let mut loader = RouteLoader::new(source);
    if let Some(base_path) = base_path {
        loader = loader.with_base_path(base_path);
    }
    loader.load(registrar, root).await
}

/// Logs a per-file failure and adds it to the summary
fn record_failure(summary: &mut LoadSummary, file: PathBuf, error: RouteError) {
    match error.kind() {
        FailureKind::InvalidHandlerExport => {
            warn!(file = %file.display(), "[WARN] Skipping non-route export: {}", file.display());
        }
        FailureKind::DuplicateRoute => {
            warn!(file = %file.display(), "[WARN] Skipping {}: {}", file.display(), error);
        }
        FailureKind::UnsupportedMethod => {
            error!(file = %file.display(), "[ERROR] Unsupported method in file: {}", file.display());
        }
        _ => {
            error!(
                file = %file.display(),
                "[ERROR] Failed to load route from {}: {}",
                file.display(),
                error
            );
        }
    }
    summary.failures.push(LoadFailure { file, error });
}
