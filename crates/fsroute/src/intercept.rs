/// Level at which an intercepting route resolves
///
/// Recorded on a compiled route when one of its directory segments carries
/// an interception marker. The marker also rewrites the compiled pattern
/// (see [`crate::route::segment`]); this value keeps the intent visible to
/// adapters and logs.
///
/// # Interception Patterns
///
/// - `(.)` → **SameLevel**: resolved at the marker's own level
/// - `(..)` repeated N times → **Parent(N)**: resolved N levels up
/// - `(...)` → **Root**: resolved from the scan root
///
/// # Examples
///
/// ```
/// use fsroute::InterceptLevel;
///
/// // feed/(..)photo/GET.[id].json → Parent(1)
/// let up = InterceptLevel::Parent(1);
/// assert_eq!(up.to_string(), "(..)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptLevel {
    /// (.) - same level
    SameLevel,
    /// (..) x N - N levels up
    Parent(usize),
    /// (...) - from the root
    Root,
}

impl std::fmt::Display for InterceptLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterceptLevel::SameLevel => f.write_str("(.)"),
            InterceptLevel::Parent(levels) => f.write_str(&"(..)".repeat(*levels)),
            InterceptLevel::Root => f.write_str("(...)"),
        }
    }
}
