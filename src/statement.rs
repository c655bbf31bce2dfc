use crate::resolve::ResolvedStatement;
use sqlx::mysql::{MySqlArguments, MySqlQueryResult};
use sqlx::query::Query;
use sqlx::{Executor, MySql};
use std::sync::Arc;

/// Type alias for SQLx Query with MySQL arguments
pub type Q<'q> = Query<'q, MySql, MySqlArguments>;

/// A stored statement bound to a parameter binder, ready to execute.
///
/// `BoundStatement` is the binding facade over a [`ResolvedStatement`]. It
/// holds the positional SQL, the slot map and a binder function, and
/// constructs a fresh SQLx `Query` on every execution to avoid
/// self-referential lifetime issues.
///
/// The binder is invoked once per positional slot, in slot order, with the
/// **logical** index that slot stands for. A logical index mapped to several
/// slots therefore receives one bind call per slot with the same value, and
/// a logical index mapped to no slot receives none at all: binder arms for
/// unmapped indices are silently skipped, so callers may supply optional
/// parameters unconditionally.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::MySqlPool;
/// use sqlx_statement_store::{Container, SqlDialect};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let container = Container::for_dialect("sql", SqlDialect::MySql);
///
/// // insert_user.sql:
/// //   /*
/// //   :name=1
/// //   :email=2
/// //   */
/// //   INSERT INTO users (name, email) VALUES (:name, :email)
/// let mut statement = container.lookup("insert_user.sql")?.prepare(|q, index| match index {
///     1 => q.bind("Alice"),
///     2 => q.bind("alice@example.com"),
///     _ => q,
/// })?;
///
/// let result = statement.execute(&pool).await?;
/// println!("Inserted {} rows", result.rows_affected());
/// # Ok(())
/// # }
/// ```
pub struct BoundStatement<F> {
    statement: Arc<ResolvedStatement>,
    binder: F,
}

impl<F> BoundStatement<F>
where
    F: for<'q> FnMut(Q<'q>, usize) -> Q<'q>,
{
    pub(crate) fn new(statement: Arc<ResolvedStatement>, binder: F) -> Self {
        Self { statement, binder }
    }

    /// The positional SQL text sent to the database.
    pub fn sql(&self) -> &str {
        self.statement.sql()
    }

    /// The slot map the binder is dispatched through.
    pub fn slots(&self) -> &[usize] {
        self.statement.slots()
    }

    /// Builds a fresh query, fanning the binder out over the slot map.
    fn build(&mut self) -> Q<'_> {
        let &mut BoundStatement {
            ref statement,
            ref mut binder,
        } = self;

        let mut q = sqlx::query::<MySql>(statement.sql());
        for &logical in statement.slots() {
            q = binder(q, logical);
        }
        q
    }

    /// Executes the statement using the provided executor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`](crate::Error::Database) if the database
    /// query fails.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use sqlx::MySqlPool;
    /// use sqlx_statement_store::{Container, SqlDialect};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
    /// let container = Container::for_dialect("sql", SqlDialect::MySql);
    ///
    /// let mut statement = container.lookup("delete_user.sql")?.prepare(|q, index| match index {
    ///     1 => q.bind(42),
    ///     _ => q,
    /// })?;
    ///
    /// let result = statement.execute(&pool).await?;
    /// println!("Deleted {} rows", result.rows_affected());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<'e, E>(&mut self, executor: E) -> crate::Result<MySqlQueryResult>
    where
        E: Executor<'e, Database = MySql>,
    {
        Ok(self.build().execute(executor).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn statement(raw: &str) -> Arc<ResolvedStatement> {
        Arc::new(crate::resolve::resolve(&Template::parse(raw).unwrap()))
    }

    #[test]
    fn test_binder_fans_out_per_slot() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&calls);

        let mut bound = BoundStatement::new(
            statement("/*\n:id=1\n*/\nSELECT * FROM t WHERE a = :id OR b = :id"),
            move |q: Q<'_>, index| {
                seen.borrow_mut().push(index);
                q
            },
        );
        drop(bound.build());

        // Logical index 1 maps to two slots, so it is bound twice.
        assert_eq!(*calls.borrow(), vec![1, 1]);
    }

    #[test]
    fn test_binder_follows_slot_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&calls);

        let mut bound = BoundStatement::new(
            statement("/*\n:a=1\n:b=2\n*/\nSELECT :b, ?, :a"),
            move |q: Q<'_>, index| {
                seen.borrow_mut().push(index);
                q
            },
        );
        drop(bound.build());

        assert_eq!(*calls.borrow(), vec![2, 3, 1]);
    }

    #[test]
    fn test_unmapped_logical_index_is_never_bound() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&calls);

        let mut bound = BoundStatement::new(
            statement("SELECT * FROM t WHERE id = ?"),
            move |q: Q<'_>, index| {
                seen.borrow_mut().push(index);
                q
            },
        );
        drop(bound.build());

        // Only slot 1 exists; a binder arm for, say, index 5 is dead code.
        assert_eq!(*calls.borrow(), vec![1]);
    }

    #[test]
    fn test_exposes_resolved_sql_and_slots() {
        let bound = BoundStatement::new(
            statement("/*\n:name=2\n*/\nINSERT INTO t(a,b) VALUES (?, :name)"),
            |q: Q<'_>, _| q,
        );
        assert_eq!(bound.sql(), "INSERT INTO t(a,b) VALUES (?, ?)");
        assert_eq!(bound.slots(), &[1, 2]);
    }
}
