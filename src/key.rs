use std::fmt;
use std::path::{Path, PathBuf};

/// The identity of a stored statement inside a [`Container`](crate::Container).
///
/// A key wraps the relative sub-path of a template file. Two keys are equal
/// exactly when their sub-paths are equal, which makes the key the sole
/// identity used for cache lookups.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use sqlx_statement_store::StatementKey;
///
/// let key = StatementKey::new("insert_user.sql");
/// assert_eq!(
///     key.resolve_file(Path::new("sql/mysql")),
///     Path::new("sql/mysql/insert_user.sql"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementKey {
    sub_path: PathBuf,
}

impl StatementKey {
    /// Creates a key from the relative sub-path of a template file.
    pub fn new(sub_path: impl Into<PathBuf>) -> Self {
        Self {
            sub_path: sub_path.into(),
        }
    }

    /// The relative sub-path this key points at.
    pub fn sub_path(&self) -> &Path {
        &self.sub_path
    }

    /// Resolves the template file location under the given dialect folder.
    pub fn resolve_file(&self, dialect_folder: &Path) -> PathBuf {
        dialect_folder.join(&self.sub_path)
    }
}

impl fmt::Display for StatementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sub_path.display())
    }
}

impl From<&str> for StatementKey {
    fn from(sub_path: &str) -> Self {
        Self::new(sub_path)
    }
}

impl From<&Path> for StatementKey {
    fn from(sub_path: &Path) -> Self {
        Self::new(sub_path)
    }
}

impl From<PathBuf> for StatementKey {
    fn from(sub_path: PathBuf) -> Self {
        Self::new(sub_path)
    }
}
