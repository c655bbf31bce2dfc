use std::fmt;
use std::path::{Path, PathBuf};

/// The closed set of SQL dialects a statement store can be built for.
///
/// A dialect only selects the subdirectory the template files are loaded
/// from; it does not rewrite SQL. Statements for different dialects live in
/// sibling folders under one root, e.g. `sql/mysql/` and `sql/sqlite/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    /// SQLite
    Sqlite,
    /// MySQL
    MySql,
    /// MariaDB
    MariaDb,
    /// PostgreSQL
    Postgres,
}

impl SqlDialect {
    /// Every supported dialect.
    pub const ALL: [SqlDialect; 4] = [
        SqlDialect::Sqlite,
        SqlDialect::MySql,
        SqlDialect::MariaDb,
        SqlDialect::Postgres,
    ];

    /// The folder name the dialect's templates live under.
    pub fn folder(&self) -> &'static str {
        match self {
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::MySql => "mysql",
            SqlDialect::MariaDb => "mariadb",
            SqlDialect::Postgres => "postgres",
        }
    }

    /// Resolves the dialect folder under the given root directory.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(self.folder())
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_appends_folder() {
        let root = Path::new("sql");
        for dialect in SqlDialect::ALL {
            assert_eq!(dialect.resolve(root), root.join(dialect.folder()));
        }
    }
}
