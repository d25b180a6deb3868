// File: src/registrar.rs
// Purpose: Registers compiled routes on an axum Router

use std::collections::HashSet;
use std::mem;

use axum::routing::{on, MethodFilter};
use axum::Router;
use fsroute::{CompiledRoute, HttpMethod, PatternToken, RegisterError, RouteRegistrar};
use tower_http::services::ServeDir;

use crate::fixtures::Fixture;

/// Builds an axum [`Router`] from compiled routes
///
/// axum panics on paths its matcher cannot hold, so every path is checked
/// against what is already registered and refused with a [`RegisterError`]
/// instead:
///
/// - the same method twice on one path
/// - two differently named parameters or wildcards at the same position
/// - a wildcard next to a literal at the same position
/// - anything at or below a mounted directory
#[derive(Default)]
pub struct AxumRegistrar {
    router: Router,
    paths: Vec<String>,
    methods: HashSet<(HttpMethod, String)>,
    mounts: Vec<String>,
    has_fallback: bool,
}

impl AxumRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    fn check(&self, method: &str, route: &CompiledRoute, path: &str) -> Result<(), RegisterError> {
        let conflict = |existing: &str| RegisterError::Conflict {
            method: method.to_string(),
            pattern: route.pattern.clone(),
            existing: existing.to_string(),
        };

        if let Some(mount) = self.mounts.iter().find(|mount| is_within(path, mount)) {
            return Err(conflict(&format!("USE {}", mount)));
        }
        if let Some(existing) = self.paths.iter().find(|existing| overlaps(existing, path)) {
            return Err(conflict(existing));
        }
        Ok(())
    }

    fn push_path(&mut self, path: String) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }
}

impl RouteRegistrar for AxumRegistrar {
    type Handler = Fixture;
    type Router = ServeDir;

    fn route(&mut self, route: &CompiledRoute, fixture: Fixture) -> Result<(), RegisterError> {
        let filter = method_filter(route.method).ok_or_else(|| RegisterError::Unsupported {
            pattern: route.pattern.clone(),
            reason: format!("axum has no method filter for {}", route.method),
        })?;

        let paths = axum_paths(route)?;
        for path in &paths {
            if self.methods.contains(&(route.method, path.clone())) {
                return Err(RegisterError::Conflict {
                    method: route.method.to_string(),
                    pattern: route.pattern.clone(),
                    existing: path.clone(),
                });
            }
            self.check(route.method.as_str(), route, path)?;
        }

        for path in paths {
            let fixture = fixture.clone();
            let handler = move || {
                let fixture = fixture.clone();
                async move { fixture }
            };
            self.router = mem::take(&mut self.router).route(&path, on(filter, handler));
            self.methods.insert((route.method, path.clone()));
            self.push_path(path);
        }
        Ok(())
    }

    fn mount(&mut self, route: &CompiledRoute, dir: ServeDir) -> Result<(), RegisterError> {
        if route.has_catch_all() {
            return Err(RegisterError::Unsupported {
                pattern: route.pattern.clone(),
                reason: "routers cannot be mounted below a wildcard".to_string(),
            });
        }
        let path = render(route, &route.tokens)?;

        if path == "/" {
            if self.has_fallback {
                return Err(RegisterError::Conflict {
                    method: "USE".to_string(),
                    pattern: route.pattern.clone(),
                    existing: "USE /".to_string(),
                });
            }
            self.router = mem::take(&mut self.router).fallback_service(dir);
            self.has_fallback = true;
            return Ok(());
        }

        self.check("USE", route, &path)?;
        let occupied = self
            .paths
            .iter()
            .chain(&self.mounts)
            .find(|existing| is_within(existing, &path));
        if let Some(existing) = occupied {
            return Err(RegisterError::Conflict {
                method: "USE".to_string(),
                pattern: route.pattern.clone(),
                existing: existing.clone(),
            });
        }

        self.router = mem::take(&mut self.router).nest_service(&path, dir);
        self.mounts.push(path);
        Ok(())
    }
}

fn method_filter(method: HttpMethod) -> Option<MethodFilter> {
    match method {
        HttpMethod::Get => Some(MethodFilter::GET),
        HttpMethod::Post => Some(MethodFilter::POST),
        HttpMethod::Put => Some(MethodFilter::PUT),
        HttpMethod::Delete => Some(MethodFilter::DELETE),
        HttpMethod::Trace => Some(MethodFilter::TRACE),
        HttpMethod::Options => Some(MethodFilter::OPTIONS),
        HttpMethod::Head => Some(MethodFilter::HEAD),
        HttpMethod::Connect => None,
    }
}

/// Renders tokens in axum's path syntax (`:name`, `*name`)
///
/// `:` and `*` are path syntax to axum wherever they appear, so literals,
/// parameter names and the base path must not contain them.
fn render(route: &CompiledRoute, tokens: &[PatternToken]) -> Result<String, RegisterError> {
    let unsupported = |reason: &str| RegisterError::Unsupported {
        pattern: route.pattern.clone(),
        reason: reason.to_string(),
    };

    if has_path_syntax(&route.base_path) {
        return Err(unsupported("base path cannot contain `:` or `*`"));
    }

    let last = tokens.len().saturating_sub(1);
    for (index, token) in tokens.iter().enumerate() {
        match token {
            PatternToken::Literal(text) if has_path_syntax(text) => {
                return Err(unsupported("literal segments cannot contain `:` or `*`"));
            }
            PatternToken::Param(name) | PatternToken::CatchAll(name) | PatternToken::OptionalCatchAll(name)
                if has_path_syntax(name) =>
            {
                return Err(unsupported("parameter names cannot contain `:` or `*`"));
            }
            token if token.is_catch_all() && index != last => {
                return Err(unsupported("catch-all must be the last segment"));
            }
            _ => {}
        }
    }

    Ok(route.render_with(tokens, |token| match token {
        PatternToken::Literal(text) => text.clone(),
        PatternToken::Param(name) => format!(":{}", name),
        PatternToken::CatchAll(name) | PatternToken::OptionalCatchAll(name) => format!("*{}", name),
    }))
}

fn has_path_syntax(text: &str) -> bool {
    text.contains([':', '*'])
}

/// Every axum path a route needs
///
/// An optional catch-all also matches its parent path, which axum's
/// wildcards do not.
fn axum_paths(route: &CompiledRoute) -> Result<Vec<String>, RegisterError> {
    let path = render(route, &route.tokens)?;
    match route.tokens.split_last() {
        Some((PatternToken::OptionalCatchAll(_), parent)) => Ok(vec![render(route, parent)?, path]),
        _ => Ok(vec![path]),
    }
}

fn is_dynamic(segment: &str) -> bool {
    segment.starts_with([':', '*'])
}

/// Whether the matcher would refuse `a` next to `b`
fn overlaps(a: &str, b: &str) -> bool {
    a.split('/')
        .zip(b.split('/'))
        .find(|(x, y)| x != y)
        .is_some_and(|(x, y)| {
            (is_dynamic(x) && is_dynamic(y)) || x.starts_with('*') || y.starts_with('*')
        })
}

/// Whether `path` is `prefix` or lies below it
fn is_within(path: &str, prefix: &str) -> bool {
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderValue, Method, Request, StatusCode};
    use fsroute::compile_route;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tower::ServiceExt;

    fn route(relative: &str) -> CompiledRoute {
        let root = Path::new("routes");
        compile_route(&root.join(relative), root, "/api").unwrap()
    }

    fn fixture(body: &'static str) -> Fixture {
        Fixture {
            status: StatusCode::OK,
            content_type: HeaderValue::from_static("text/plain"),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_routes_are_served_by_method() {
        let mut registrar = AxumRegistrar::new();
        registrar.route(&route("users/GET.[id].json"), fixture("show")).unwrap();
        registrar.route(&route("users/POST.index.json"), fixture("create")).unwrap();
        let router = registrar.into_router();

        assert_eq!(send(&router, Method::GET, "/api/users/7").await, (StatusCode::OK, "show".to_string()));
        assert_eq!(send(&router, Method::POST, "/api/users").await, (StatusCode::OK, "create".to_string()));
        assert_eq!(send(&router, Method::GET, "/api/users").await.0, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_optional_catch_all_matches_parent() {
        let mut registrar = AxumRegistrar::new();
        registrar.route(&route("docs/GET.[[...slug]].json"), fixture("docs")).unwrap();
        let router = registrar.into_router();

        assert_eq!(send(&router, Method::GET, "/api/docs").await.0, StatusCode::OK);
        assert_eq!(send(&router, Method::GET, "/api/docs/a/b").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_required_catch_all_needs_a_segment() {
        let mut registrar = AxumRegistrar::new();
        registrar.route(&route("docs/GET.[...slug].json"), fixture("docs")).unwrap();
        let router = registrar.into_router();

        assert_eq!(send(&router, Method::GET, "/api/docs").await.0, StatusCode::NOT_FOUND);
        assert_eq!(send(&router, Method::GET, "/api/docs/a/b").await.0, StatusCode::OK);
    }

    #[test]
    fn test_differently_named_params_conflict() {
        let mut registrar = AxumRegistrar::new();
        registrar.route(&route("users/GET.[id].json"), fixture("a")).unwrap();
        let err = registrar.route(&route("users/POST.[userId].json"), fixture("b")).unwrap_err();
        assert_eq!(
            err,
            RegisterError::Conflict {
                method: "POST".to_string(),
                pattern: "/api/users/:userId".to_string(),
                existing: "/api/users/:id".to_string(),
            }
        );
    }

    #[test]
    fn test_same_path_other_method_is_fine() {
        let mut registrar = AxumRegistrar::new();
        registrar.route(&route("users/GET.[id].json"), fixture("a")).unwrap();
        registrar.route(&route("users/DELETE.[id].json"), fixture("b")).unwrap();
        assert!(registrar.route(&route("(x)/users/GET.[id].json"), fixture("c")).is_err());
    }

    #[test]
    fn test_literal_next_to_param_is_fine() {
        let mut registrar = AxumRegistrar::new();
        registrar.route(&route("users/GET.[id].json"), fixture("a")).unwrap();
        registrar.route(&route("users/GET.new.json"), fixture("b")).unwrap();
    }

    #[test]
    fn test_connect_is_unsupported() {
        let mut registrar = AxumRegistrar::new();
        let err = registrar.route(&route("CONNECT.index.json"), fixture("a")).unwrap_err();
        assert!(matches!(err, RegisterError::Unsupported { .. }));
    }

    #[test]
    fn test_catch_all_must_be_last() {
        let mut registrar = AxumRegistrar::new();
        let err = registrar.route(&route("[...rest]/GET.edit.json"), fixture("a")).unwrap_err();
        assert!(matches!(err, RegisterError::Unsupported { .. }));
    }

    #[test]
    fn test_wildcard_inside_a_literal_is_unsupported() {
        let mut registrar = AxumRegistrar::new();
        let err = registrar.route(&route("files/GET.a*b.json"), fixture("a")).unwrap_err();
        assert_eq!(
            err,
            RegisterError::Unsupported {
                pattern: "/api/files/a*b".to_string(),
                reason: "literal segments cannot contain `:` or `*`".to_string(),
            }
        );
    }

    #[test]
    fn test_colon_inside_sibling_directories_is_unsupported() {
        let mut registrar = AxumRegistrar::new();
        let first = registrar.route(&route("v1:beta/GET.index.json"), fixture("a")).unwrap_err();
        let second = registrar.route(&route("v1:gamma/GET.index.json"), fixture("b")).unwrap_err();
        assert!(matches!(first, RegisterError::Unsupported { .. }));
        assert!(matches!(second, RegisterError::Unsupported { .. }));

        registrar.route(&route("v1/GET.index.json"), fixture("c")).unwrap();
    }

    #[test]
    fn test_path_syntax_in_param_names_is_unsupported() {
        let mut registrar = AxumRegistrar::new();
        for file in ["users/GET.[a:b].json", "users/GET.[a*b].json", "docs/GET.[...a:b].json"] {
            let err = registrar.route(&route(file), fixture("a")).unwrap_err();
            assert!(matches!(err, RegisterError::Unsupported { .. }), "{file}");
        }
        let err = registrar.mount(&route("v1:beta/GET.index.toml"), ServeDir::new(".")).unwrap_err();
        assert!(matches!(err, RegisterError::Unsupported { .. }));
    }

    #[test]
    fn test_path_syntax_in_base_path_is_unsupported() {
        let root = Path::new("routes");
        let route = compile_route(&root.join("GET.index.json"), root, "/api:v1").unwrap();
        let err = AxumRegistrar::new().route(&route, fixture("a")).unwrap_err();
        assert!(matches!(err, RegisterError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_mounted_directory_is_served() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("hello.txt"), "hello").unwrap();

        let mut registrar = AxumRegistrar::new();
        registrar.mount(&route("static/GET.index.toml"), ServeDir::new(temp_dir.path())).unwrap();
        let err = registrar.route(&route("static/GET.[file].json"), fixture("a")).unwrap_err();
        assert!(matches!(err, RegisterError::Conflict { .. }));

        let router = registrar.into_router();
        assert_eq!(
            send(&router, Method::GET, "/api/static/hello.txt").await,
            (StatusCode::OK, "hello".to_string())
        );
    }

    #[test]
    fn test_mount_over_routes_conflicts() {
        let mut registrar = AxumRegistrar::new();
        registrar.route(&route("static/GET.logo.json"), fixture("a")).unwrap();
        let err = registrar.mount(&route("static/GET.index.toml"), ServeDir::new(".")).unwrap_err();
        assert!(matches!(err, RegisterError::Conflict { .. }));
    }

    #[test]
    fn test_overlap_rules() {
        assert!(overlaps("/api/users/:id", "/api/users/:userId/posts"));
        assert!(overlaps("/api/docs/*slug", "/api/docs/intro"));
        assert!(!overlaps("/api/users/:id", "/api/users/new"));
        assert!(!overlaps("/api/users/:id", "/api/users/:id/posts"));
        assert!(is_within("/api/static/a", "/api/static"));
        assert!(!is_within("/api/statics", "/api/static"));
    }
}
