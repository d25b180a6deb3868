/// Route module for file-based routing
///
/// Pure components that turn a route file's path into a compiled route:
/// - `segment` classifies one directory or file-stem token
/// - `compiler` folds the segments of a whole path into a pattern
pub mod compiler;
pub mod segment;

// Re-export commonly used types
pub use compiler::{compile_pattern, compile_route, split_file_name, CompiledRoute, FileName, DEFAULT_BASE_PATH};
pub use segment::{classify_segment, Directive, PatternToken, SegmentKind, Translation};
