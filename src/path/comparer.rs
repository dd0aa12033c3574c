//! Case-sensitivity aware path comparison.

use super::PathLike;
use crate::io::FileSystem;

/// Compares paths under a filesystem's case-sensitivity policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathComparer {
    case_sensitive: bool,
}

impl PathComparer {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    /// Comparer matching the policy of `fs`.
    pub fn for_file_system(fs: &dyn FileSystem) -> Self {
        Self::new(fs.is_case_sensitive())
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Compare two optional paths. Two `None`s are equal.
    pub fn equals<P: PathLike>(&self, a: Option<&P>, b: Option<&P>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.str_eq(a.full_path(), b.full_path()),
            _ => false,
        }
    }

    pub fn eq<P: PathLike>(&self, a: &P, b: &P) -> bool {
        self.str_eq(a.full_path(), b.full_path())
    }

    /// Key that is equal for two paths exactly when [`PathComparer::eq`]
    /// holds. Suitable for `HashSet`/`HashMap` keys.
    pub fn key<P: PathLike>(&self, path: &P) -> String {
        if self.case_sensitive {
            path.full_path().to_string()
        } else {
            path.full_path().to_lowercase()
        }
    }

    pub(crate) fn str_eq(&self, a: &str, b: &str) -> bool {
        if self.case_sensitive {
            a == b
        } else {
            a == b || a.to_lowercase() == b.to_lowercase()
        }
    }
}
