use async_trait::async_trait;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};

use crate::{NamedArgs, QueryResult, Result, Value};

/// Lazy, forward-only sequence of rows.
pub type RowCursor<'a, R> = BoxStream<'a, Result<R>>;

/// Data access capabilities shared by connections and transactions.
///
/// A [`crate::UnitOfWork`] routes every operation to exactly one
/// implementor of this trait: the active transaction if there is one,
/// otherwise the shared connection.
#[async_trait]
pub trait DataAccess: Send {
    /// Row type produced by queries.
    type Row: Send + 'static;

    /// Executes a mutating statement with `:name` placeholders.
    async fn named_execute(&mut self, query: &str, args: &NamedArgs) -> Result<QueryResult>;

    /// Executes a mutating statement with positional placeholders.
    async fn execute(&mut self, query: &str, args: &[Value]) -> Result<QueryResult>;

    /// Runs a query and returns its rows as a cursor.
    ///
    /// Fails only when the statement itself cannot be prepared or executed;
    /// failures on later rows are yielded by the cursor.
    async fn query<'a>(&'a mut self, query: &str, args: &[Value]) -> Result<RowCursor<'a, Self::Row>>;

    /// Named-parameter variant of [`DataAccess::query`].
    async fn named_query<'a>(
        &'a mut self,
        query: &str,
        args: &NamedArgs,
    ) -> Result<RowCursor<'a, Self::Row>>;

    /// Runs a query and collects every row.
    async fn select_all(&mut self, query: &str, args: &[Value]) -> Result<Vec<Self::Row>>;

    /// Runs a query expected to return one row.
    ///
    /// Zero rows is reported as [`crate::Error::NotFound`].
    async fn get_one(&mut self, query: &str, args: &[Value]) -> Result<Self::Row>;
}

/// An in-progress transaction. Consumed by settlement.
#[async_trait]
pub trait TransactionHandle: DataAccess {
    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

/// Shared, long-lived handle to the data store.
#[async_trait]
pub trait Connection: DataAccess + Sync {
    type Transaction: TransactionHandle<Row = Self::Row>;

    /// Begin a new transaction.
    async fn begin(&self) -> Result<Self::Transaction>;
}

/// Maps a single row into a destination type.
pub trait FromRecord<R>: Sized {
    fn from_record(row: &R) -> Result<Self>;
}

/// Pulls the first item out of `rows` so a failing statement is reported
/// up front instead of as the cursor's first element.
pub async fn prime_cursor<'a, R>(mut rows: RowCursor<'a, R>) -> Result<RowCursor<'a, R>>
where
    R: Send + 'a,
{
    match rows.next().await {
        None => Ok(stream::empty().boxed()),
        Some(Err(err)) => Err(err),
        Some(Ok(first)) => Ok(stream::once(future::ready(Ok(first))).chain(rows).boxed()),
    }
}
