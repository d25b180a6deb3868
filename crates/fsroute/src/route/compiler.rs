/// Path compilation for route files
///
/// Pure functional compiler that turns `<METHOD>.<name>.<ext>` files under a
/// scan root into an HTTP method and a URL pattern.
/// All functions are **pure**: same input → same output, no side effects.
use std::path::{Component, Path, PathBuf};

use crate::error::CompileError;
use crate::path::normalize_path;
use crate::{HttpMethod, InterceptLevel};

use super::segment::{classify_segment, Directive, PatternToken};

/// Base path used when the caller does not configure one
pub const DEFAULT_BASE_PATH: &str = "/api";

/// File stem that maps to its directory's own path
const INDEX_NAME: &str = "index";

/// A route file compiled into its method and URL pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRoute {
    pub method: HttpMethod,
    /// Canonical pattern, e.g. `/api/users/:id` or `/api/docs/*?`
    pub pattern: String,
    /// Normalized base path the tokens hang off
    pub base_path: String,
    /// Tokens after the base path, in order
    pub tokens: Vec<PatternToken>,
    pub source_file: PathBuf,
    /// Last interception marker seen on the way to the file
    pub intercept: Option<InterceptLevel>,
}

impl CompiledRoute {
    /// Names of the parameters this route binds, in path order
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(PatternToken::param_name)
    }

    pub fn has_catch_all(&self) -> bool {
        self.tokens.iter().any(PatternToken::is_catch_all)
    }

    /// Renders base path and tokens with a framework's own segment syntax
    ///
    /// ```
    /// use fsroute::route::compiler::compile_route;
    /// use fsroute::PatternToken;
    /// use std::path::Path;
    ///
    /// let root = Path::new("routes");
    /// let route = compile_route(&root.join("docs/GET.[...slug].json"), root, "/api").unwrap();
    /// let rendered = route.render_with(&route.tokens, |token| match token {
    ///     PatternToken::CatchAll(name) => format!("{{*{}}}", name),
    ///     other => other.to_string(),
    /// });
    /// assert_eq!(rendered, "/api/docs/{*slug}");
    /// ```
    pub fn render_with<F>(&self, tokens: &[PatternToken], render: F) -> String
    where
        F: FnMut(&PatternToken) -> String,
    {
        let segments: Vec<String> = tokens.iter().map(render).collect();
        normalize_path(&format!("{}/{}", self.base_path, segments.join("/"))).into_owned()
    }

    /// Tokens with parameter names erased
    ///
    /// Two routes with the same method and shape match exactly the same
    /// requests, so they cannot both be registered. A literal segment that
    /// merely looks like a parameter keeps its text.
    ///
    /// ```
    /// use fsroute::route::compiler::compile_route;
    /// use std::path::Path;
    ///
    /// let root = Path::new("routes");
    /// let a = compile_route(&root.join("users/GET.[id].json"), root, "/api").unwrap();
    /// let b = compile_route(&root.join("users/GET.[uid].json"), root, "/api").unwrap();
    /// let c = compile_route(&root.join("users/GET.:id.json"), root, "/api").unwrap();
    /// assert_ne!(a.pattern, b.pattern);
    /// assert_eq!(a.shape(), b.shape());
    /// assert_ne!(a.shape(), c.shape());
    /// ```
    pub fn shape(&self) -> Vec<PatternToken> {
        self.tokens
            .iter()
            .map(|token| match token {
                PatternToken::Literal(text) => PatternToken::Literal(text.clone()),
                PatternToken::Param(_) => PatternToken::Param(String::new()),
                PatternToken::CatchAll(_) => PatternToken::CatchAll(String::new()),
                PatternToken::OptionalCatchAll(_) => PatternToken::OptionalCatchAll(String::new()),
            })
            .collect()
    }
}

/// The three parts of a route file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName<'a> {
    /// Text before the first `.`, as written
    pub method: &'a str,
    /// Text between the first and last `.`
    pub name: String,
    pub extension: Option<&'a str>,
}

/// Splits `GET.users.[id].json` into method, name and extension
///
/// # Examples
///
/// ```
/// use fsroute::route::compiler::split_file_name;
///
/// let parts = split_file_name("GET.[id].json");
/// assert_eq!(parts.method, "GET");
/// assert_eq!(parts.name, "[id]");
/// assert_eq!(parts.extension, Some("json"));
///
/// let parts = split_file_name("post.feed.xml.ts");
/// assert_eq!(parts.name, "feed.xml");
/// ```
pub fn split_file_name(file_name: &str) -> FileName<'_> {
    let parts: Vec<&str> = file_name.split('.').collect();

    match parts.as_slice() {
        [method] => FileName {
            method: *method,
            name: String::new(),
            extension: None,
        },
        [method, middle @ .., extension] => FileName {
            method: *method,
            name: middle.join("."),
            extension: Some(*extension),
        },
        [] => FileName {
            method: "",
            name: String::new(),
            extension: None,
        },
    }
}

/// Internal state accumulator for fold-based compilation
#[derive(Default)]
struct ParseState {
    tokens: Vec<PatternToken>,
    ignoring: bool,
    intercept: Option<InterceptLevel>,
}

impl ParseState {
    /// Applies one directory segment
    fn with_directory_segment(self, segment: &str) -> Self {
        if self.ignoring {
            return self;
        }
        self.with_segment(segment)
    }

    /// Applies the file's name segment; `index` and empty names add nothing
    fn with_name_segment(self, name: &str) -> Self {
        if name.is_empty() || name == INDEX_NAME {
            return self;
        }
        self.with_segment(name)
    }

    fn with_segment(mut self, segment: &str) -> Self {
        let kind = classify_segment(segment);
        if let Some(level) = kind.intercept_level() {
            self.intercept = Some(level);
        }

        let translation = kind.translate();
        match translation.directive {
            Directive::None => {}
            Directive::Pop(levels) => {
                // Never below the root
                let keep = self.tokens.len().saturating_sub(levels);
                self.tokens.truncate(keep);
            }
            Directive::Reset => self.tokens.clear(),
            Directive::IgnoreRest => self.ignoring = true,
        }

        if let Some(token) = translation.token {
            self.tokens.push(token);
        }
        self
    }

    /// Joins tokens under the root separator
    ///
    /// A chain with fewer than two parts gets an extra empty part so the
    /// result always carries a leading separator (`/`).
    fn joined(&self) -> String {
        let mut parts: Vec<String> = std::iter::once(String::new())
            .chain(self.tokens.iter().map(ToString::to_string))
            .collect();

        if parts.len() < 2 {
            parts.insert(0, String::new());
        }

        parts.join("/")
    }
}

/// Compiles directory segments and a name segment into a pattern
///
/// Returns the final pattern, the tokens after the base path, and the last
/// interception level seen.
///
/// # Examples
///
/// ```
/// use fsroute::route::compiler::compile_pattern;
///
/// let (pattern, _, _) = compile_pattern(["users"], "[id]", "/api");
/// assert_eq!(pattern, "/api/users/:id");
///
/// let (pattern, _, _) = compile_pattern(["(marketing)", "about"], "index", "/api");
/// assert_eq!(pattern, "/api/about");
///
/// let (pattern, _, _) = compile_pattern(Vec::<&str>::new(), "index", "/api");
/// assert_eq!(pattern, "/api");
/// ```
pub fn compile_pattern<'a, I>(
    directories: I,
    name: &str,
    base_path: &str,
) -> (String, Vec<PatternToken>, Option<InterceptLevel>)
where
    I: IntoIterator<Item = &'a str>,
{
    let state = directories
        .into_iter()
        .fold(ParseState::default(), ParseState::with_directory_segment)
        .with_name_segment(name);

    let base = normalize_path(base_path);
    let pattern = normalize_path(&format!("{}{}", base, state.joined())).into_owned();

    (pattern, state.tokens, state.intercept)
}

/// Compiles a route file found under `root`
///
/// # Examples
///
/// ```
/// use fsroute::route::compiler::compile_route;
/// use fsroute::HttpMethod;
/// use std::path::Path;
///
/// let route = compile_route(Path::new("routes/users/GET.[id].json"), Path::new("routes"), "/api").unwrap();
/// assert_eq!(route.method, HttpMethod::Get);
/// assert_eq!(route.pattern, "/api/users/:id");
/// ```
pub fn compile_route(file: &Path, root: &Path, base_path: &str) -> Result<CompiledRoute, CompileError> {
    let relative = file.strip_prefix(root).map_err(|_| CompileError::InvalidPath {
        file: file.to_path_buf(),
        reason: "file is not under the scan root",
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy()),
            Component::CurDir => {}
            _ => {
                return Err(CompileError::InvalidPath {
                    file: file.to_path_buf(),
                    reason: "relative path leaves the scan root",
                })
            }
        }
    }

    let file_name = segments.pop().ok_or_else(|| CompileError::InvalidPath {
        file: file.to_path_buf(),
        reason: "path has no file name",
    })?;

    let parts = split_file_name(&file_name);
    let method = parts
        .method
        .parse::<HttpMethod>()
        .map_err(|err| CompileError::UnsupportedMethod {
            method: err.0,
            file: file.to_path_buf(),
        })?;

    let (pattern, tokens, intercept) = compile_pattern(
        segments.iter().map(|segment| segment.as_ref()),
        &parts.name,
        base_path,
    );

    Ok(CompiledRoute {
        method,
        pattern,
        base_path: normalize_path(base_path).into_owned(),
        tokens,
        source_file: file.to_path_buf(),
        intercept,
    })
}
