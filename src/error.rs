/// Error type for data access and transaction operations.
///
/// Misuse of the transaction lifecycle (settling when nothing is active,
/// failing to begin) is not represented here; those conditions panic.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no rows returned by a query that expected exactly one row")]
    NotFound,

    #[error("named parameter `:{0}` has no bound value")]
    MissingParameter(String),

    #[error("failed to map row: {0}")]
    Mapping(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("a transaction is already active on this unit of work")]
    TransactionAlreadyActive,

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl Error {
    /// Wraps a row mapping failure.
    pub fn mapping<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Mapping(source.into())
    }

    /// Whether a single-row fetch found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound,
            other => Error::Database(other),
        }
    }
}

/// Result type for data access and transaction operations
pub type Result<T> = std::result::Result<T, Error>;
