use std::path::PathBuf;

/// Error types for sqlx-statement-store
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error compiling the header comment pattern
    #[error("Failed to parse SQL template: {0}")]
    Parse(#[from] regex::Error),

    /// The template declares its parameters in a malformed header block
    #[error("Malformed template header: {reason}")]
    TemplateFormat {
        /// Why the header block was rejected
        reason: String,
    },

    /// The template file passed the existence checks but could not be read
    #[error("Could not read statement source at {}", path.display())]
    SourceRead {
        /// Path of the unreadable template file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A statement was prepared from a key that has no backing template file
    #[error("No statement source found at {}", path.display())]
    StatementNotFound {
        /// Path the key resolved to
        path: PathBuf,
    },

    /// Error from SQLx database operations
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type alias for sqlx-statement-store operations
pub type Result<T> = std::result::Result<T, Error>;
