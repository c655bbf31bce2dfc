use crate::resolve::ResolvedStatement;
use sqlx::{
    mysql::{MySqlArguments, MySqlRow},
    query::QueryAs,
    Executor, MySql,
};
use std::sync::Arc;

/// Type alias for SQLx QueryAs with MySQL arguments
pub type QA<'q, R> = QueryAs<'q, MySql, R, MySqlArguments>;

/// A stored statement that returns typed rows.
///
/// `BoundStatementAs` is the typed sibling of
/// [`BoundStatement`](crate::BoundStatement): the same binder fan-out over
/// the slot map, but results are mapped through SQLx's `FromRow` and fetched
/// with `fetch_all`, `fetch_one` or `fetch_optional`.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::{FromRow, MySqlPool};
/// use sqlx_statement_store::{Container, SqlDialect};
///
/// #[derive(FromRow)]
/// struct User {
///     id: i32,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let container = Container::for_dialect("sql", SqlDialect::MySql);
///
/// // select_user.sql:
/// //   /*
/// //   :id=1
/// //   */
/// //   SELECT id, name FROM users WHERE id = :id
/// let mut statement = container
///     .lookup("select_user.sql")?
///     .prepare_as::<User, _>(|q, index| match index {
///         1 => q.bind(42),
///         _ => q,
///     })?;
///
/// let user = statement.fetch_one(&pool).await?;
/// println!("User: {} ({})", user.name, user.id);
/// # Ok(())
/// # }
/// ```
pub struct BoundStatementAs<R, F>
where
    F: for<'q> FnMut(QA<'q, R>, usize) -> QA<'q, R>,
{
    statement: Arc<ResolvedStatement>,
    binder: F,
    _pd: std::marker::PhantomData<R>,
}

impl<R, F> BoundStatementAs<R, F>
where
    for<'row> R: sqlx::FromRow<'row, MySqlRow> + Send + Unpin,
    F: for<'q> FnMut(QA<'q, R>, usize) -> QA<'q, R>,
{
    pub(crate) fn new(statement: Arc<ResolvedStatement>, binder: F) -> Self {
        Self {
            statement,
            binder,
            _pd: std::marker::PhantomData,
        }
    }

    /// The positional SQL text sent to the database.
    pub fn sql(&self) -> &str {
        self.statement.sql()
    }

    /// The slot map the binder is dispatched through.
    pub fn slots(&self) -> &[usize] {
        self.statement.slots()
    }

    /// Builds a fresh typed query, fanning the binder out over the slot map.
    fn build(&mut self) -> QA<'_, R> {
        let &mut BoundStatementAs {
            ref statement,
            ref mut binder,
            _pd,
        } = self;

        let mut q = sqlx::query_as(statement.sql());
        for &logical in statement.slots() {
            q = binder(q, logical);
        }
        q
    }

    /// Executes the statement and returns all matching rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`](crate::Error::Database) if the query
    /// fails or a row cannot be converted to type `R`.
    pub async fn fetch_all<'e, E>(&mut self, executor: E) -> crate::Result<Vec<R>>
    where
        E: Executor<'e, Database = MySql>,
    {
        Ok(self.build().fetch_all(executor).await?)
    }

    /// Executes the statement and returns exactly one row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`](crate::Error::Database) if no row is
    /// found, the query fails, or the row cannot be converted to type `R`.
    pub async fn fetch_one<'e, E>(&mut self, executor: E) -> crate::Result<R>
    where
        E: Executor<'e, Database = MySql>,
    {
        Ok(self.build().fetch_one(executor).await?)
    }

    /// Executes the statement and returns at most one row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`](crate::Error::Database) if the query
    /// fails or the row cannot be converted to type `R`.
    pub async fn fetch_optional<'e, E>(&mut self, executor: E) -> crate::Result<Option<R>>
    where
        E: Executor<'e, Database = MySql>,
    {
        Ok(self.build().fetch_optional(executor).await?)
    }
}
