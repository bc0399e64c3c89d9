use std::fmt;

use crate::{Error, Result};

/// Outcome of a mutating statement.
///
/// Both a native driver result and a wrapped failure answer through this
/// trait, so callers of `execute_named` never branch on which one they got.
pub trait MutationResult: fmt::Debug + Send + Sync {
    /// Number of rows affected. Always `0` when the statement failed.
    fn rows_affected(&self) -> u64;

    /// The failure that prevented the statement from producing a result.
    fn error(&self) -> Option<&Error>;

    /// Collapses into a plain `Result`, for use with `?`.
    fn into_result(self: Box<Self>) -> Result<u64>;
}

/// Native result of a statement that ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryResult {
    rows_affected: u64,
}

impl QueryResult {
    /// Create a result for a statement that affected `rows_affected` rows.
    pub fn new(rows_affected: u64) -> Self {
        Self { rows_affected }
    }
}

impl MutationResult for QueryResult {
    fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    fn error(&self) -> Option<&Error> {
        None
    }

    fn into_result(self: Box<Self>) -> Result<u64> {
        Ok(self.rows_affected)
    }
}

/// Adapts a failed statement into a [`MutationResult`].
#[derive(Debug)]
pub struct ErrorResult {
    error: Error,
}

impl ErrorResult {
    /// Wrap the failure of a statement.
    pub fn new(error: Error) -> Self {
        Self { error }
    }

    /// Take back the wrapped failure.
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl MutationResult for ErrorResult {
    fn rows_affected(&self) -> u64 {
        0
    }

    fn error(&self) -> Option<&Error> {
        Some(&self.error)
    }

    fn into_result(self: Box<Self>) -> Result<u64> {
        Err(self.error)
    }
}

impl From<Result<QueryResult>> for Box<dyn MutationResult> {
    fn from(result: Result<QueryResult>) -> Self {
        match result {
            Ok(done) => Box::new(done),
            Err(err) => Box::new(ErrorResult::new(err)),
        }
    }
}
