use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row failed validation; nothing in its batch was written
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
