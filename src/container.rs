use crate::dialect::SqlDialect;
use crate::error::Error;
use crate::key::StatementKey;
use crate::resolve::{resolve, ResolvedStatement};
use crate::statement::{BoundStatement, Q};
use crate::statement_as::{BoundStatementAs, QA};
use crate::template::Template;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use sqlx::mysql::MySqlRow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Reads the raw text of a template file.
///
/// The default is [`FsReader`]; tests and embedders can swap in their own
/// implementation through [`Container::with_reader`].
pub trait TemplateReader: Send + Sync {
    /// Reads the content of the file at `path`. Only called after the path
    /// passed the existence checks, so a failure here is a read error, not
    /// absence.
    fn read(&self, path: &Path) -> std::io::Result<String>;
}

/// The default reader, backed by [`std::fs::read_to_string`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl TemplateReader for FsReader {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Builds [`StatementKey`]s from the paths callers pass to
/// [`Container::lookup`].
pub type KeyGenerator = Box<dyn Fn(&Path) -> StatementKey + Send + Sync>;

type CacheCell = Arc<OnceCell<Option<Arc<ResolvedStatement>>>>;

/// A lazy, keyed store of resolved statements for one dialect folder.
///
/// Each key is resolved at most once for the lifetime of the container:
/// the template file is read, its header parsed and its body rewritten on
/// first lookup, and the result (or the fact that no file exists) is
/// memoized. A container never refreshes its entries; construct a fresh
/// one to pick up template changes on disk.
///
/// Lookups for different keys never block each other; concurrent first
/// lookups of the same key converge on one shared [`ResolvedStatement`]
/// with the file read exactly once.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::MySqlPool;
/// use sqlx_statement_store::{Container, SqlDialect};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// // Templates live in sql/mysql/*.sql
/// let container = Container::for_dialect("sql", SqlDialect::MySql);
///
/// let handle = container.lookup("delete_user.sql")?;
/// if handle.is_present() {
///     let mut statement = handle.prepare(|q, index| match index {
///         1 => q.bind(42),
///         _ => q,
///     })?;
///     statement.execute(&pool).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct Container<R = FsReader> {
    root: PathBuf,
    key_generator: KeyGenerator,
    reader: R,
    cache: Mutex<HashMap<StatementKey, CacheCell>>,
}

impl Container<FsReader> {
    /// Creates a container over `root` for the given dialect, with the
    /// default key generator that keys each statement by its file name.
    pub fn for_dialect(root: impl Into<PathBuf>, dialect: SqlDialect) -> Self {
        Self::with_key_generator(root, dialect, Box::new(file_name_key))
    }

    /// Creates a container with a custom key generator, e.g. one that keeps
    /// whole sub-paths so statements can be grouped in subdirectories.
    pub fn with_key_generator(
        root: impl Into<PathBuf>,
        dialect: SqlDialect,
        key_generator: KeyGenerator,
    ) -> Self {
        Self::with_reader(root, dialect, key_generator, FsReader)
    }
}

impl<R: TemplateReader> Container<R> {
    /// Creates a container with a custom template reader.
    pub fn with_reader(
        root: impl Into<PathBuf>,
        dialect: SqlDialect,
        key_generator: KeyGenerator,
        reader: R,
    ) -> Self {
        Self {
            root: dialect.resolve(&root.into()),
            key_generator,
            reader,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Looks up a statement by path string, routed through the container's
    /// key generator.
    ///
    /// # Errors
    ///
    /// Same as [`lookup_key`](Self::lookup_key).
    pub fn lookup(&self, key: &str) -> crate::Result<StatementHandle> {
        self.lookup_key(&(self.key_generator)(Path::new(key)))
    }

    /// Looks up a statement by key, resolving and memoizing it on first
    /// access.
    ///
    /// A missing template file is not an error: the returned handle reports
    /// [`is_present()`](StatementHandle::is_present) as `false` and only
    /// fails once prepared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateFormat`] if the template's header block is
    /// malformed, or [`Error::SourceRead`] if the file exists but cannot be
    /// read. Neither outcome is memoized, so a later call may retry.
    pub fn lookup_key(&self, key: &StatementKey) -> crate::Result<StatementHandle> {
        let cell = {
            // The map lock only guards lookup-or-create of the per-key
            // cell; resolution itself runs outside it.
            let mut cache = self.cache.lock();
            Arc::clone(cache.entry(key.clone()).or_default())
        };
        let entry = cell.get_or_try_init(|| self.load(key))?;
        Ok(match entry {
            Some(statement) => StatementHandle {
                inner: HandleInner::Present(Arc::clone(statement)),
            },
            None => StatementHandle {
                inner: HandleInner::Absent(key.resolve_file(&self.root)),
            },
        })
    }

    /// The key generator that converts lookup paths into keys.
    pub fn key_generator(&self) -> &(dyn Fn(&Path) -> StatementKey + Send + Sync) {
        self.key_generator.as_ref()
    }

    /// The dialect folder this container reads from.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    fn load(&self, key: &StatementKey) -> crate::Result<Option<Arc<ResolvedStatement>>> {
        let path = key.resolve_file(&self.root);
        if !path.exists() || !path.is_file() {
            debug!(key = %key, path = %path.display(), "no statement source for key");
            return Ok(None);
        }
        let raw = self.reader.read(&path).map_err(|source| Error::SourceRead {
            path: path.clone(),
            source,
        })?;
        let statement = resolve(&Template::parse(&raw)?);
        debug!(
            key = %key,
            path = %path.display(),
            slots = ?statement.slots(),
            "resolved statement template"
        );
        Ok(Some(Arc::new(statement)))
    }
}

/// Keys each statement by the file name of the lookup path, so
/// `lookup("users/insert.sql")` and `lookup("insert.sql")` address the same
/// statement.
fn file_name_key(path: &Path) -> StatementKey {
    match path.file_name() {
        Some(name) => StatementKey::new(name),
        None => StatementKey::new(path),
    }
}

#[derive(Debug)]
enum HandleInner {
    Present(Arc<ResolvedStatement>),
    Absent(PathBuf),
}

/// The outcome of a container lookup: either a resolved statement ready to
/// prepare, or a memoized "no such template" placeholder.
///
/// [`is_present`](Self::is_present) never fails and performs no I/O; only
/// [`prepare`](Self::prepare) / [`prepare_as`](Self::prepare_as) on an
/// absent handle produce [`Error::StatementNotFound`].
#[derive(Debug)]
pub struct StatementHandle {
    inner: HandleInner,
}

impl StatementHandle {
    /// Whether a template file backed this handle's key.
    pub fn is_present(&self) -> bool {
        matches!(self.inner, HandleInner::Present(_))
    }

    /// The resolved statement, when present.
    pub fn resolved(&self) -> Option<&ResolvedStatement> {
        match &self.inner {
            HandleInner::Present(statement) => Some(statement),
            HandleInner::Absent(_) => None,
        }
    }

    /// Prepares the statement with the given binder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StatementNotFound`] naming the resolved path when
    /// no template file backs this handle.
    pub fn prepare<F>(&self, binder: F) -> crate::Result<BoundStatement<F>>
    where
        F: for<'q> FnMut(Q<'q>, usize) -> Q<'q>,
    {
        match &self.inner {
            HandleInner::Present(statement) => {
                Ok(BoundStatement::new(Arc::clone(statement), binder))
            }
            HandleInner::Absent(path) => Err(Error::StatementNotFound { path: path.clone() }),
        }
    }

    /// Prepares the statement with the given binder, returning typed rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StatementNotFound`] naming the resolved path when
    /// no template file backs this handle.
    pub fn prepare_as<T, F>(&self, binder: F) -> crate::Result<BoundStatementAs<T, F>>
    where
        for<'row> T: sqlx::FromRow<'row, MySqlRow> + Send + Unpin,
        F: for<'q> FnMut(QA<'q, T>, usize) -> QA<'q, T>,
    {
        match &self.inner {
            HandleInner::Present(statement) => {
                Ok(BoundStatementAs::new(Arc::clone(statement), binder))
            }
            HandleInner::Absent(path) => Err(Error::StatementNotFound { path: path.clone() }),
        }
    }
}

impl PartialEq for StatementHandle {
    /// Handles compare through what they wrap: present handles by resolved
    /// statement, absent handles by resolved path.
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (HandleInner::Present(a), HandleInner::Present(b)) => a == b,
            (HandleInner::Absent(a), HandleInner::Absent(b)) => a == b,
            _ => false,
        }
    }
}
