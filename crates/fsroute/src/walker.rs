// File: src/walker.rs
// Purpose: Enumerates route files under the scan root

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{LoadError, LoadResult};

/// Default recursion limit for route trees
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// A directory the walker could not list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableDirectory {
    pub path: PathBuf,
    pub reason: String,
}

/// Every regular file under a root, in sorted order
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files: Vec<PathBuf>,
    pub unreadable: Vec<UnreadableDirectory>,
    /// Non-empty directories whose contents lie below the depth cap
    pub depth_limited: Vec<PathBuf>,
}

/// Recursively lists all regular files under `root`
///
/// Entries are sorted by file name at every level, so the result (and the
/// registration order built from it) is reproducible. Symbolic links are
/// followed. A subdirectory that cannot be listed, a symlink loop or a
/// dangling link ends up in [`ScanOutcome::unreadable`]; only an unreadable
/// root is an error.
pub fn scan_files(root: &Path, max_depth: usize) -> LoadResult<ScanOutcome> {
    fs::read_dir(root).map_err(|source| LoadError::RootUnreadable {
        root: root.to_path_buf(),
        source,
    })?;

    let mut outcome = ScanOutcome::default();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .max_depth(max_depth)
        .sort_by_file_name();

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => outcome.files.push(entry.into_path()),
            Ok(entry) if is_cut_off(&entry, max_depth) => {
                warn!(
                    path = %entry.path().display(),
                    "[WARN] Maximum depth {} reached, skipping contents of {}",
                    max_depth,
                    entry.path().display()
                );
                outcome.depth_limited.push(entry.into_path());
            }
            Ok(_) => {}
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                if let Some(ancestor) = err.loop_ancestor() {
                    error!(
                        path = %path.display(),
                        "[ERROR] Symlink loop: {} points back to {}",
                        path.display(),
                        ancestor.display()
                    );
                } else {
                    error!(
                        path = %path.display(),
                        "[ERROR] Unable to read directory: {}: {}",
                        path.display(),
                        err
                    );
                }
                outcome.unreadable.push(UnreadableDirectory {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }

    debug!(root = %root.display(), files = outcome.files.len(), "scanned route directory");
    Ok(outcome)
}

/// A directory at the cap that still has entries the walk will not visit
fn is_cut_off(entry: &DirEntry, max_depth: usize) -> bool {
    entry.depth() == max_depth
        && entry.file_type().is_dir()
        && fs::read_dir(entry.path()).map_or(true, |mut entries| entries.next().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_scan_is_recursive_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "users/GET.[id].json");
        touch(root, "GET.index.json");
        touch(root, "users/GET.index.json");
        touch(root, "(admin)/stats/GET.index.json");
        fs::create_dir_all(root.join("empty")).unwrap();

        let outcome = scan_files(root, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(
            relative(root, &outcome.files),
            vec![
                "(admin)/stats/GET.index.json",
                "GET.index.json",
                "users/GET.[id].json",
                "users/GET.index.json",
            ]
        );
        assert!(outcome.unreadable.is_empty());
    }

    #[test]
    fn test_scan_respects_max_depth() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "GET.index.json");
        touch(root, "a/b/c/GET.deep.json");

        let outcome = scan_files(root, 2).unwrap();
        assert_eq!(relative(root, &outcome.files), vec!["GET.index.json"]);
        assert_eq!(relative(root, &outcome.depth_limited), vec!["a/b"]);
    }

    #[test]
    fn test_empty_directory_at_depth_cap_is_not_reported() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();

        let outcome = scan_files(root, 2).unwrap();
        assert!(outcome.depth_limited.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_and_files_are_followed() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let shared = temp_dir.path().join("shared");
        touch(&shared, "GET.[id].json");
        touch(&shared, "GET.index.json");

        let root = temp_dir.path().join("routes");
        fs::create_dir_all(&root).unwrap();
        symlink(&shared, root.join("users")).unwrap();
        symlink(shared.join("GET.index.json"), root.join("GET.index.json")).unwrap();

        let outcome = scan_files(&root, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(
            relative(&root, &outcome.files),
            vec!["GET.index.json", "users/GET.[id].json", "users/GET.index.json"]
        );
        assert!(outcome.unreadable.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_reported() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "users/GET.index.json");
        symlink(root.join("users"), root.join("users/again")).unwrap();

        let outcome = scan_files(root, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(relative(root, &outcome.files), vec!["users/GET.index.json"]);
        assert_eq!(outcome.unreadable.len(), 1);
        assert!(outcome.unreadable[0].path.ends_with("users/again"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_recorded() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "GET.index.json");
        touch(root, "locked/GET.secret.json");
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permissions do not apply to root
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let outcome = scan_files(root, DEFAULT_MAX_DEPTH).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(relative(root, &outcome.files), vec!["GET.index.json"]);
        assert_eq!(outcome.unreadable.len(), 1);
        assert_eq!(outcome.unreadable[0].path, locked);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = scan_files(&temp_dir.path().join("missing"), DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(matches!(err, LoadError::RootUnreadable { .. }));
    }

    #[test]
    fn test_root_that_is_a_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "GET.index.json");
        let err = scan_files(&temp_dir.path().join("GET.index.json"), DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(matches!(err, LoadError::RootUnreadable { .. }));
    }
}
