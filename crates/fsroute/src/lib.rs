//! # fsroute
//!
//! File-based route resolution. A directory of handler files is compiled
//! into HTTP method + URL pattern pairs and registered with whatever HTTP
//! framework implements [`RouteRegistrar`]:
//!
//! - `GET.index.json` → `GET /api`
//! - `users/GET.[id].json` → `GET /api/users/:id`
//! - `docs/POST.[...slug].json` → `POST /api/docs/*` (one or more segments)
//! - `docs/GET.[[...slug]].json` → `GET /api/docs/*?` (zero or more segments)
//! - `(marketing)/about/GET.index.json` → `GET /api/about` (route group)
//! - `feed/photo/(..)/GET.[id].json` → `GET /api/feed/:id` (interception)
//! - `users/_lib/...` → directories after `_lib` are dropped
//!
//! Matching and dispatch stay with the framework. This crate only produces
//! one unambiguous route per file and calls the registrar, in sorted file
//! order, logging through `tracing`.
//!
//! ## Example
//!
//! ```
//! use fsroute::route::compile_pattern;
//!
//! let (pattern, _, _) = compile_pattern(["users"], "[id]", "/api");
//! assert_eq!(pattern, "/api/users/:id");
//! ```

pub mod config;
pub mod error;
pub mod handler;
mod intercept;
pub mod loader;
mod method;
pub mod path;
pub mod registrar;
pub mod route;
pub mod walker;

pub use config::{Config, ConflictPolicy, RoutingConfig};
pub use error::{CompileError, FailureKind, LoadError, LoadResult, RegisterError, RouteError};
pub use handler::{HandlerExport, HandlerSource, RouteFile, StaticHandlers};
pub use intercept::InterceptLevel;
pub use loader::{load_routes, LoadFailure, LoadSummary, RouteLoader};
pub use method::{HttpMethod, MethodParseError};
pub use path::{is_valid_path, normalize_path};
pub use registrar::{register, RecordedRoute, RecordingRegistrar, Registration, RouteRegistrar};
pub use route::{classify_segment, compile_route, CompiledRoute, PatternToken, SegmentKind};
