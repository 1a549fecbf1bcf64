//! Search request and root types.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A single search: how deep to walk and which substring names must contain.
///
/// An empty mask matches every file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    depth: usize,
    mask: String,
}

impl SearchRequest {
    pub fn new(depth: usize, mask: impl Into<String>) -> Self {
        Self {
            depth,
            mask: mask.into(),
        }
    }

    /// Maximum number of path segments below the root (0 = the root itself).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn mask(&self) -> &str {
        &self.mask
    }

    /// Case-sensitive literal substring test against a file name.
    pub fn matches_name(&self, name: &str) -> bool {
        name.contains(self.mask.as_str())
    }
}

impl fmt::Display for SearchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "depth={} mask={:?}", self.depth, self.mask)
    }
}

/// The fixed directory every search starts from.
///
/// Cheap to clone; the path is shared and never mutated after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoot(Arc<Path>);

impl SearchRoot {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(Arc::from(path.as_ref()))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Whether the root currently exists and is a directory.
    pub fn is_searchable(&self) -> bool {
        self.0.is_dir()
    }
}

impl AsRef<Path> for SearchRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SearchRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_is_case_sensitive_substring() {
        let req = SearchRequest::new(3, "Log");
        assert!(req.matches_name("SysLog.txt"));
        assert!(req.matches_name("Log"));
        assert!(!req.matches_name("syslog.txt"));
    }

    #[test]
    fn test_mask_is_literal_not_glob() {
        let req = SearchRequest::new(1, "*.txt");
        assert!(!req.matches_name("a.txt"));
        assert!(req.matches_name("weird*.txt"));
    }

    #[test]
    fn test_empty_mask_matches_everything() {
        let req = SearchRequest::new(0, "");
        assert!(req.matches_name("anything"));
        assert!(req.matches_name(""));
    }

    #[test]
    fn test_root_clone_shares_path() {
        let root = SearchRoot::new("/srv/files");
        let other = root.clone();
        assert_eq!(root, other);
        assert_eq!(other.path(), Path::new("/srv/files"));
        assert_eq!(root.to_string(), "/srv/files");
    }
}
