//! Depth-bounded file name search.
//!
//! Wraps a `walkdir` traversal of the search root and keeps only regular
//! files whose name contains the request mask. Results are produced lazily
//! in traversal order (depth-first, directory order as returned by the OS),
//! so callers can stream them as they are found.
//!
//! The first traversal error ends the stream: it is yielded once as
//! `Err(SearchError)` and every later call to `next()` returns `None`.
//!
//! A [`StopHandle`] ends the stream from another thread. The flag is checked
//! before every walked entry, not only before matches.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;
use walkdir::{DirEntry, WalkDir};

use crate::error::SearchError;
use crate::request::{SearchRequest, SearchRoot};

/// Starts a search of `root` for `request`.
///
/// Nothing touches the filesystem until the returned iterator is polled.
pub fn search(root: &SearchRoot, request: &SearchRequest) -> Matches {
    let walker = WalkDir::new(root.path())
        .max_depth(request.depth())
        .follow_links(false)
        .into_iter();

    Matches {
        walker,
        request: request.clone(),
        failed: false,
        stop: StopHandle::default(),
    }
}

/// Lazy stream of matching file paths.
pub struct Matches {
    walker: walkdir::IntoIter,
    request: SearchRequest,
    failed: bool,
    stop: StopHandle,
}

/// Ends a running search at its next walked entry.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Matches {
    /// Handle that stops this search from any thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    fn accepts(&self, entry: &DirEntry) -> bool {
        is_regular_file(entry)
            && self
                .request
                .matches_name(&entry.file_name().to_string_lossy())
    }
}

impl Iterator for Matches {
    type Item = Result<PathBuf, SearchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            if self.stop.is_stopped() {
                return None;
            }

            match self.walker.next()? {
                Ok(entry) => {
                    if self.accepts(&entry) {
                        trace!(path = %entry.path().display(), "Match");
                        return Some(Ok(entry.into_path()));
                    }
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(SearchError::from(e)));
                }
            }
        }
    }
}

impl std::iter::FusedIterator for Matches {}

/// Regular files, plus symlinks that resolve to a regular file.
fn is_regular_file(entry: &DirEntry) -> bool {
    if entry.file_type().is_file() {
        return true;
    }
    entry.path_is_symlink()
        && fs::metadata(entry.path())
            .map(|meta| meta.is_file())
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs::File;
    use std::path::Path;
    use tempfile::TempDir;

    /// root/a.txt, root/sub/b.txt, root/sub/deep/c.txt, root/sub/notes.md
    fn fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub/deep")).unwrap();
        File::create(root.join("a.txt")).unwrap();
        File::create(root.join("sub/b.txt")).unwrap();
        File::create(root.join("sub/deep/c.txt")).unwrap();
        File::create(root.join("sub/notes.md")).unwrap();
        dir
    }

    fn run(root: &Path, depth: usize, mask: &str) -> BTreeSet<PathBuf> {
        search(&SearchRoot::new(root), &SearchRequest::new(depth, mask))
            .map(|item| item.unwrap())
            .collect()
    }

    #[test]
    fn test_depth_limits_results() {
        let dir = fixture();
        let root = dir.path();

        let found = run(root, 2, ".txt");
        let expected: BTreeSet<_> = [root.join("a.txt"), root.join("sub/b.txt")]
            .into_iter()
            .collect();
        assert_eq!(found, expected);

        let deeper = run(root, 3, ".txt");
        assert!(deeper.contains(&root.join("sub/deep/c.txt")));
        assert_eq!(deeper.len(), 3);
    }

    #[test]
    fn test_depth_zero_on_directory_is_empty() {
        let dir = fixture();
        assert!(run(dir.path(), 0, "").is_empty());
    }

    #[test]
    fn test_depth_zero_on_file_yields_root() {
        let dir = fixture();
        let file = dir.path().join("a.txt");
        assert_eq!(run(&file, 0, "a"), [file.clone()].into_iter().collect());
        assert!(run(&file, 0, "zzz").is_empty());
    }

    #[test]
    fn test_empty_mask_returns_all_files() {
        let dir = fixture();
        let found = run(dir.path(), 5, "");
        assert_eq!(found.len(), 4);
        assert!(found.iter().all(|p| p.is_file()));
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let dir = fixture();
        let items: Vec<_> = search(
            &SearchRoot::new(dir.path()),
            &SearchRequest::new(1, "zzz"),
        )
        .collect();
        assert!(items.is_empty());
    }

    #[test]
    fn test_directories_are_excluded_even_if_name_matches() {
        let dir = fixture();
        let found = run(dir.path(), 3, "sub");
        assert!(found.is_empty());
    }

    #[test]
    fn test_missing_root_yields_single_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");

        let items: Vec<_> =
            search(&SearchRoot::new(&missing), &SearchRequest::new(2, "")).collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items.first(), Some(Err(SearchError::Access { .. }))));
    }

    #[test]
    fn test_results_follow_depth_first_order() {
        let dir = fixture();
        let root = dir.path();
        let found: Vec<PathBuf> = search(&SearchRoot::new(root), &SearchRequest::new(3, ".txt"))
            .map(|item| item.unwrap())
            .collect();
        assert_eq!(found.len(), 3);

        // Depth-first: everything under sub/ is emitted contiguously, so
        // a.txt is either first or last, never between b.txt and c.txt.
        let top = found.iter().position(|p| p == &root.join("a.txt")).unwrap();
        assert!(top == 0 || top == 2, "a.txt split the sub/ subtree: {found:?}");
    }

    #[test]
    fn test_stop_handle_ends_search() {
        let dir = fixture();
        let mut matches = search(&SearchRoot::new(dir.path()), &SearchRequest::new(5, ""));
        let stop = matches.stop_handle();

        assert!(matches!(matches.next(), Some(Ok(_))));
        stop.stop();
        assert!(matches.next().is_none());
        assert!(matches.next().is_none());
    }

    #[test]
    fn test_stop_before_first_entry_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let matches = search(
            &SearchRoot::new(&dir.path().join("missing")),
            &SearchRequest::new(2, ""),
        );
        matches.stop_handle().stop();
        assert_eq!(matches.count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_subdirectory_is_one_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = fixture();
        let locked = dir.path().join("sub/deep");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Running with CAP_DAC_OVERRIDE; nothing to deny.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let items: Vec<_> =
            search(&SearchRoot::new(dir.path()), &SearchRequest::new(5, "")).collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let errors: Vec<_> = items.iter().filter(|item| item.is_err()).collect();
        assert_eq!(errors.len(), 1);
        assert!(items.last().is_some_and(|item| item.is_err()));
        assert!(matches!(errors[0], Err(SearchError::Access { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_file_counts_but_broken_link_does_not() {
        let dir = fixture();
        let root = dir.path();
        std::os::unix::fs::symlink(root.join("a.txt"), root.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(root.join("nowhere"), root.join("broken.txt")).unwrap();
        std::os::unix::fs::symlink(root.join("sub"), root.join("dirlink.txt")).unwrap();

        let found = run(root, 1, ".txt");
        assert!(found.contains(&root.join("link.txt")));
        assert!(!found.contains(&root.join("broken.txt")));
        assert!(!found.contains(&root.join("dirlink.txt")));
    }
}
