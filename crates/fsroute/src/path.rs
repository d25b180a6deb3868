/// URL path validation and normalization
///
/// All functions are **pure**: given same input, always produce same output with no side effects.
use std::borrow::Cow;

/// Validates if a URL path is in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not end with `/` (except root `/`)
/// - Must not be empty
///
/// # Examples
///
/// ```
/// use fsroute::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/api/users/:id"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("api")); // Missing leading /
/// assert!(!is_valid_path("/api/")); // Trailing /
/// assert!(!is_valid_path("/api//users")); // Double //
/// assert!(!is_valid_path("/api\\users")); // Backslash
/// ```
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    if path.contains("//") || path.contains('\\') {
        return false;
    }

    path == "/" || !path.ends_with('/')
}

/// Normalize a URL path to canonical form
///
/// Returns `Cow::Borrowed` when input is already valid (zero allocations),
/// `Cow::Owned` when normalization was needed.
///
/// - Trailing slashes: `/api/` → `/api`
/// - Double slashes: `/api//users` → `/api/users`
/// - Backslashes: `\api\users` → `/api/users`
/// - Missing leading slash: `api` → `/api`
///
/// # Examples
///
/// ```
/// use fsroute::path::normalize_path;
/// use std::borrow::Cow;
///
/// assert!(matches!(normalize_path("/api"), Cow::Borrowed("/api")));
/// assert_eq!(normalize_path("/api/"), "/api");
/// assert_eq!(normalize_path("//api///users/:id"), "/api/users/:id");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}
