//! # sqlx-statement-store
//!
//! A file-backed SQL statement store for SQLx: keep your statements in `.sql`
//! files addressed by a symbolic key, declare named parameters in a leading
//! comment block, and let the store rewrite them into the positional `?`
//! placeholders prepared statements require.
//!
//! ## Features
//!
//! - **Statements as files**: SQL lives next to your code in per-dialect
//!   folders (`sql/mysql/`, `sql/sqlite/`, ...), not in string literals
//! - **Named Placeholders**: declare `name=index` pairs in a `/* ... */`
//!   header and repeat a name as often as the statement needs it
//! - **Slot fan-out**: binding one logical index binds every positional slot
//!   that name occupies, so repeated parameters are set once
//! - **Lazy caching**: each template is read and resolved at most once per
//!   container, even under concurrent first access
//! - **HRTB Pattern**: binder closures work with any lifetime, avoiding
//!   self-referential issues; a fresh SQLx `Query` is built per execution
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx = { version = "0.8", features = ["mysql", "runtime-tokio"] }
//! sqlx-statement-store = "0.1"
//! ```
//!
//! ## Template format
//!
//! A template optionally starts with a comment block declaring its named
//! parameters, one `name=index` line each. The name is matched in the body
//! exactly as written, so declare it with whatever marker spelling the file
//! uses:
//!
//! ```text
//! /*
//! :name=1
//! :email=2
//! */
//! INSERT INTO users (name, email)
//! VALUES (:name, :email)
//! ```
//!
//! Resolution replaces every occurrence of each declared name (and counts
//! every bare `?`) left to right, collapses the body to a single line and
//! records which logical index each positional slot belongs to. The file
//! above becomes `INSERT INTO users (name, email) VALUES (?, ?)` with slot
//! map `[1, 2]`.
//!
//! ## Basic usage
//!
//! ```rust,no_run
//! use sqlx::MySqlPool;
//! use sqlx_statement_store::{Container, SqlDialect};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = MySqlPool::connect("mysql://localhost/test").await?;
//!
//! // Templates are read from sql/mysql/ and resolved on first lookup.
//! let container = Container::for_dialect("sql", SqlDialect::MySql);
//!
//! let mut insert = container.lookup("insert_user.sql")?.prepare(|q, index| match index {
//!     1 => q.bind("John Doe"),
//!     2 => q.bind("john@example.com"),
//!     _ => q,
//! })?;
//!
//! let result = insert.execute(&pool).await?;
//! println!("Inserted {} rows", result.rows_affected());
//! # Ok(())
//! # }
//! ```
//!
//! ## Typed results
//!
//! ```rust,no_run
//! use sqlx::{FromRow, MySqlPool};
//! use sqlx_statement_store::{Container, SqlDialect};
//!
//! #[derive(FromRow)]
//! struct User {
//!     id: i32,
//!     name: String,
//!     email: String,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let pool = MySqlPool::connect("mysql://localhost/test").await?;
//! let container = Container::for_dialect("sql", SqlDialect::MySql);
//!
//! let mut select = container
//!     .lookup("select_adults.sql")?
//!     .prepare_as::<User, _>(|q, index| match index {
//!         1 => q.bind(18),
//!         _ => q,
//!     })?;
//!
//! let users: Vec<User> = select.fetch_all(&pool).await?;
//! for user in users {
//!     println!("{}: {}", user.name, user.email);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! 1. **Load**: the container resolves a key to a template file under its
//!    dialect folder and reads it on first lookup
//! 2. **Parse**: the leading `/* ... */` block is split off and parsed into
//!    `(name, logical index)` declarations
//! 3. **Resolve**: a single scan rewrites every declared name and bare `?`
//!    into positional slots and builds the slot map
//! 4. **Bind**: preparing a statement takes a binder closure; on execution
//!    it is invoked once per slot with that slot's logical index, so one
//!    logical value fans out to every slot its name occupies
//!
//! The resolved form is memoized per key for the container's lifetime;
//! construct a fresh container to pick up changed files.
//!
//! ## Limitations
//!
//! - Execution currently targets MySQL (matching the `sqlx` feature set
//!   this crate is built with); the dialect folders exist so stores for
//!   other backends can share one template tree
//! - Declared names are matched as exact literals, so pick spellings (e.g.
//!   a `:` prefix) that cannot collide with identifiers in the SQL text
//! - Binding a logical index that no slot maps to is a deliberate no-op
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at
//! your option.

pub mod container;
pub mod dialect;
pub mod error;
pub mod key;
pub mod resolve;
pub mod statement;
pub mod statement_as;
pub mod template;

pub use container::{Container, FsReader, KeyGenerator, StatementHandle, TemplateReader};
pub use dialect::SqlDialect;
pub use error::{Error, Result};
pub use key::StatementKey;
pub use resolve::ResolvedStatement;
pub use statement::BoundStatement;
pub use statement_as::BoundStatementAs;

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::container::{Container, StatementHandle};
    pub use crate::dialect::SqlDialect;
    pub use crate::error::{Error, Result};
    pub use crate::key::StatementKey;
    pub use crate::statement::BoundStatement;
    pub use crate::statement_as::BoundStatementAs;
}
