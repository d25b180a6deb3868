//! Registration of compiled routes with a hosting framework

use std::fmt;
use std::path::PathBuf;

use tracing::info;

use crate::error::{RegisterError, RouteError};
use crate::{CompiledRoute, HandlerExport, HttpMethod};

/// The registration surface of an HTTP framework
///
/// `route` is the verb-specific entry point (`get`, `post`, ...), selected
/// by `route.method`; `mount` is the method-agnostic `use` entry point for
/// router-like exports. Implementations own the route table; the loader
/// only calls these in sorted file order.
pub trait RouteRegistrar {
    type Handler;
    type Router;

    fn route(&mut self, route: &CompiledRoute, handler: Self::Handler) -> Result<(), RegisterError>;

    fn mount(&mut self, route: &CompiledRoute, router: Self::Router) -> Result<(), RegisterError>;
}

/// How an export ended up registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Route,
    Mount,
}

/// Registers one export, logging the result line on success
///
/// Handlers go through [`RouteRegistrar::route`], routers through
/// [`RouteRegistrar::mount`]. A missing export is
/// [`RouteError::InvalidExport`].
pub fn register<G: RouteRegistrar>(
    registrar: &mut G,
    route: &CompiledRoute,
    export: HandlerExport<G::Handler, G::Router>,
) -> Result<Registration, RouteError> {
    match export {
        HandlerExport::Handler(handler) => {
            registrar.route(route, handler)?;
            info!(
                method = %route.method,
                pattern = %route.pattern,
                "[ROUTE] [{}] Registered: {}",
                route.method,
                route.pattern
            );
            Ok(Registration::Route)
        }
        HandlerExport::Router(router) => {
            registrar.mount(route, router)?;
            info!(pattern = %route.pattern, "[ROUTER] Registered: {}", route.pattern);
            Ok(Registration::Mount)
        }
        HandlerExport::Missing => Err(RouteError::InvalidExport),
    }
}

/// One entry of a [`RecordingRegistrar`]
#[derive(Debug, Clone)]
pub struct RecordedRoute<H, R> {
    /// `None` for mounted routers
    pub method: Option<HttpMethod>,
    pub pattern: String,
    pub source_file: PathBuf,
    pub export: HandlerExport<H, R>,
}

impl<H, R> fmt::Display for RecordedRoute<H, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = self.method.map_or("USE", |m| m.as_str());
        write!(f, "{:<8}{}  ({})", method, self.pattern, self.source_file.display())
    }
}

/// A registrar that only remembers what it was given
///
/// Used for dry runs (listing the route table without serving it) and in
/// tests.
#[derive(Debug, Clone)]
pub struct RecordingRegistrar<H = (), R = ()> {
    entries: Vec<RecordedRoute<H, R>>,
}

impl<H, R> Default for RecordingRegistrar<H, R> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<H, R> RecordingRegistrar<H, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RecordedRoute<H, R>] {
        &self.entries
    }

    /// `METHOD pattern` for every entry, in registration order
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("{} {}", e.method.map_or("USE", |m| m.as_str()), e.pattern))
            .collect()
    }
}

impl<H, R> RouteRegistrar for RecordingRegistrar<H, R> {
    type Handler = H;
    type Router = R;

    fn route(&mut self, route: &CompiledRoute, handler: H) -> Result<(), RegisterError> {
        self.entries.push(RecordedRoute {
            method: Some(route.method),
            pattern: route.pattern.clone(),
            source_file: route.source_file.clone(),
            export: HandlerExport::Handler(handler),
        });
        Ok(())
    }

    fn mount(&mut self, route: &CompiledRoute, router: R) -> Result<(), RegisterError> {
        self.entries.push(RecordedRoute {
            method: None,
            pattern: route.pattern.clone(),
            source_file: route.source_file.clone(),
            export: HandlerExport::Router(router),
        });
        Ok(())
    }
}
