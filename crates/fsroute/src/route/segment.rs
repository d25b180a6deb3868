/// Segment classification for file-based routes
///
/// Pure functional parsing of a single directory or file-stem token into a
/// typed [`SegmentKind`], and of that kind into the pattern token and
/// compilation directive it produces.
/// All functions are **pure**: same input → same output, no side effects.
use std::fmt;

use crate::InterceptLevel;

const SAME_LEVEL_MARKER: &str = "(.)";
const PARENT_MARKER: &str = "(..)";
const ROOT_MARKER: &str = "(...)";

/// What a single on-disk segment means to the compiler
///
/// Classification is total: every string maps to exactly one kind, with
/// [`SegmentKind::Literal`] as the fallback.
///
/// # Examples
///
/// ```
/// use fsroute::route::segment::{classify_segment, SegmentKind};
///
/// assert_eq!(classify_segment("users"), SegmentKind::Literal("users".into()));
/// assert_eq!(classify_segment("[id]"), SegmentKind::Dynamic("id".into()));
/// assert_eq!(classify_segment("[...slug]"), SegmentKind::CatchAll("slug".into()));
/// assert_eq!(classify_segment("[[...slug]]"), SegmentKind::OptionalCatchAll("slug".into()));
/// assert_eq!(classify_segment("(marketing)"), SegmentKind::Group("marketing".into()));
/// assert_eq!(classify_segment("(..)(..)"), SegmentKind::InterceptParentN(2));
/// assert_eq!(classify_segment("_components"), SegmentKind::IgnoreRest);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static text segment
    Literal(String),
    /// Single dynamic segment: [id]
    Dynamic(String),
    /// One-or-more trailing segments: [...slug]
    CatchAll(String),
    /// Zero-or-more trailing segments: [[...slug]]
    OptionalCatchAll(String),
    /// (.) anywhere in the segment
    InterceptSameLevel,
    /// (..) anywhere in the segment, counted
    InterceptParentN(usize),
    /// (...) anywhere in the segment
    InterceptRoot,
    /// (name) - organisation only
    Group(String),
    /// Leading underscore - colocated, non-route content
    IgnoreRest,
}

/// One token of a compiled URL pattern
///
/// Catch-all tokens keep their parameter name even though the canonical
/// rendering (`*`, `*?`) does not show it, so adapters can render their
/// own wildcard syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternToken {
    Literal(String),
    Param(String),
    CatchAll(String),
    OptionalCatchAll(String),
}

/// Effect a segment has on the tokens emitted before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    None,
    /// Pop up to N previously emitted tokens, stopping at the root
    Pop(usize),
    /// Discard every previously emitted token
    Reset,
    /// Drop every following directory segment
    IgnoreRest,
}

/// Result of translating one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub token: Option<PatternToken>,
    pub directive: Directive,
}

impl PatternToken {
    /// Parameter name bound by this token, if any
    pub fn param_name(&self) -> Option<&str> {
        match self {
            PatternToken::Literal(_) => None,
            PatternToken::Param(name)
            | PatternToken::CatchAll(name)
            | PatternToken::OptionalCatchAll(name) => Some(name),
        }
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(
            self,
            PatternToken::CatchAll(_) | PatternToken::OptionalCatchAll(_)
        )
    }
}

impl fmt::Display for PatternToken {
    /// Canonical rendering: `users`, `:id`, `*`, `*?`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternToken::Literal(text) => f.write_str(text),
            PatternToken::Param(name) => write!(f, ":{}", name),
            PatternToken::CatchAll(_) => f.write_str("*"),
            PatternToken::OptionalCatchAll(_) => f.write_str("*?"),
        }
    }
}

impl SegmentKind {
    /// Translates this segment into its token and directive
    ///
    /// # Examples
    ///
    /// ```
    /// use fsroute::route::segment::{classify_segment, Directive, PatternToken};
    ///
    /// let t = classify_segment("[id]").translate();
    /// assert_eq!(t.token, Some(PatternToken::Param("id".into())));
    /// assert_eq!(t.directive, Directive::None);
    ///
    /// let t = classify_segment("foo(..)bar").translate();
    /// assert_eq!(t.token, None);
    /// assert_eq!(t.directive, Directive::Pop(1));
    /// ```
    pub fn translate(&self) -> Translation {
        let (token, directive) = match self {
            SegmentKind::Literal(text) => (Some(PatternToken::Literal(text.clone())), Directive::None),
            SegmentKind::Dynamic(name) => (Some(PatternToken::Param(name.clone())), Directive::None),
            SegmentKind::CatchAll(name) => (Some(PatternToken::CatchAll(name.clone())), Directive::None),
            SegmentKind::OptionalCatchAll(name) => {
                (Some(PatternToken::OptionalCatchAll(name.clone())), Directive::None)
            }
            SegmentKind::InterceptSameLevel | SegmentKind::Group(_) => (None, Directive::None),
            SegmentKind::InterceptParentN(levels) => (None, Directive::Pop(*levels)),
            SegmentKind::InterceptRoot => (None, Directive::Reset),
            SegmentKind::IgnoreRest => (None, Directive::IgnoreRest),
        };
        Translation { token, directive }
    }

    /// Interception level this segment declares, if it is a marker
    pub fn intercept_level(&self) -> Option<InterceptLevel> {
        match self {
            SegmentKind::InterceptSameLevel => Some(InterceptLevel::SameLevel),
            SegmentKind::InterceptParentN(levels) => Some(InterceptLevel::Parent(*levels)),
            SegmentKind::InterceptRoot => Some(InterceptLevel::Root),
            _ => None,
        }
    }
}

/// Classifies a segment into its kind (pure function)
///
/// # Parsing Rules (evaluated in order, first match wins)
///
/// 1. Contains `(.)` → same-level interception
/// 2. Contains `(..)` → parent interception, N = occurrences
/// 3. Contains `(...)` → root interception
/// 4. `[[...name]]` → optional catch-all
/// 5. `[...name]` → catch-all
/// 6. `[name]` → dynamic
/// 7. `(name)` → route group
/// 8. Leading `_` → ignore rest
/// 9. Anything else → literal
///
/// Bracketed segments with an empty name (`[]`, `[...]`) are literals: a
/// parameter must be nameable.
pub fn classify_segment(segment: &str) -> SegmentKind {
    if segment.contains(SAME_LEVEL_MARKER) {
        return SegmentKind::InterceptSameLevel;
    }

    let parent_levels = segment.matches(PARENT_MARKER).count();
    if parent_levels > 0 {
        return SegmentKind::InterceptParentN(parent_levels);
    }

    if segment.contains(ROOT_MARKER) {
        return SegmentKind::InterceptRoot;
    }

    if let Some(name) = bracketed(segment, "[[...", "]]") {
        return SegmentKind::OptionalCatchAll(name.to_string());
    }

    if let Some(name) = bracketed(segment, "[...", "]") {
        return SegmentKind::CatchAll(name.to_string());
    }

    if let Some(name) = bracketed(segment, "[", "]") {
        return SegmentKind::Dynamic(name.to_string());
    }

    if let Some(name) = segment.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        return SegmentKind::Group(name.to_string());
    }

    if segment.starts_with('_') {
        return SegmentKind::IgnoreRest;
    }

    SegmentKind::Literal(segment.to_string())
}

/// Strips `open`/`close` and returns a non-empty inner name
fn bracketed<'a>(segment: &'a str, open: &str, close: &str) -> Option<&'a str> {
    segment
        .strip_prefix(open)
        .and_then(|s| s.strip_suffix(close))
        .filter(|name| !name.is_empty())
}
