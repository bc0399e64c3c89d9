//! PostgreSQL implementation of the data access capabilities, backed by `sqlx`.

mod named;

use std::fmt;
use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Executor, PgPool, Postgres, Transaction};

use crate::executor::{prime_cursor, Connection, DataAccess, FromRecord, RowCursor, TransactionHandle};
use crate::{Error, NamedArgs, QueryResult, Result, UnitOfWork, Value};

use self::named::bind_named;

/// Unit of work over a PostgreSQL connection pool.
pub type PostgresUnitOfWork = UnitOfWork<PostgresConnection>;

impl UnitOfWork<PostgresConnection> {
    /// Create an idle unit of work over the given connection pool.
    pub fn from_pool(pool: Arc<PgPool>) -> Self {
        UnitOfWork::new(PostgresConnection::new(pool))
    }
}

/// Shared PostgreSQL connection pool.
#[derive(Clone, Debug)]
pub struct PostgresConnection {
    pool: Arc<PgPool>,
}

impl PostgresConnection {
    /// Create a new PostgresConnection with the given connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// An open PostgreSQL transaction.
///
/// Dropping it without settling rolls it back.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl fmt::Debug for PostgresTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresTransaction").finish_non_exhaustive()
    }
}

impl PostgresTransaction {
    /// Wrap a transaction opened directly on the pool.
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl DataAccess for PostgresConnection {
    type Row = PgRow;

    async fn named_execute(&mut self, query: &str, args: &NamedArgs) -> Result<QueryResult> {
        let (sql, values) = bind_named(query, args)?;
        execute_with(&*self.pool, &sql, &values).await
    }

    async fn execute(&mut self, query: &str, args: &[Value]) -> Result<QueryResult> {
        execute_with(&*self.pool, query, args).await
    }

    async fn query<'a>(&'a mut self, query: &str, args: &[Value]) -> Result<RowCursor<'a, PgRow>> {
        prime_cursor(fetch_with(&*self.pool, query.to_owned(), args.to_vec())).await
    }

    async fn named_query<'a>(
        &'a mut self,
        query: &str,
        args: &NamedArgs,
    ) -> Result<RowCursor<'a, PgRow>> {
        let (sql, values) = bind_named(query, args)?;
        prime_cursor(fetch_with(&*self.pool, sql, values)).await
    }

    async fn select_all(&mut self, query: &str, args: &[Value]) -> Result<Vec<PgRow>> {
        select_with(&*self.pool, query, args).await
    }

    async fn get_one(&mut self, query: &str, args: &[Value]) -> Result<PgRow> {
        get_with(&*self.pool, query, args).await
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> Result<PostgresTransaction> {
        let tx = self.pool.begin().await?;
        Ok(PostgresTransaction::new(tx))
    }
}

#[async_trait]
impl DataAccess for PostgresTransaction {
    type Row = PgRow;

    async fn named_execute(&mut self, query: &str, args: &NamedArgs) -> Result<QueryResult> {
        let (sql, values) = bind_named(query, args)?;
        execute_with(&mut *self.tx, &sql, &values).await
    }

    async fn execute(&mut self, query: &str, args: &[Value]) -> Result<QueryResult> {
        execute_with(&mut *self.tx, query, args).await
    }

    async fn query<'a>(&'a mut self, query: &str, args: &[Value]) -> Result<RowCursor<'a, PgRow>> {
        prime_cursor(fetch_with(&mut *self.tx, query.to_owned(), args.to_vec())).await
    }

    async fn named_query<'a>(
        &'a mut self,
        query: &str,
        args: &NamedArgs,
    ) -> Result<RowCursor<'a, PgRow>> {
        let (sql, values) = bind_named(query, args)?;
        prime_cursor(fetch_with(&mut *self.tx, sql, values)).await
    }

    async fn select_all(&mut self, query: &str, args: &[Value]) -> Result<Vec<PgRow>> {
        select_with(&mut *self.tx, query, args).await
    }

    async fn get_one(&mut self, query: &str, args: &[Value]) -> Result<PgRow> {
        get_with(&mut *self.tx, query, args).await
    }
}

#[async_trait]
impl TransactionHandle for PostgresTransaction {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

impl<T> FromRecord<PgRow> for T
where
    T: for<'r> sqlx::FromRow<'r, PgRow>,
{
    fn from_record(row: &PgRow) -> Result<Self> {
        T::from_row(row).map_err(Error::mapping)
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    values: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    for value in values {
        query = match value.clone() {
            // Untyped NULL travels as text.
            Value::Null => query.bind(None::<String>),
            Value::Bool(v) => query.bind(v),
            Value::Int(v) => query.bind(v),
            Value::Float(v) => query.bind(v),
            Value::Text(v) => query.bind(v),
            Value::Bytes(v) => query.bind(v),
            Value::Uuid(v) => query.bind(v),
        };
    }
    query
}

async fn execute_with<'e, E>(executor: E, sql: &str, values: &[Value]) -> Result<QueryResult>
where
    E: Executor<'e, Database = Postgres>,
{
    let done = bind_all(sqlx::query(sql), values).execute(executor).await?;
    Ok(QueryResult::new(done.rows_affected()))
}

async fn select_with<'e, E>(executor: E, sql: &str, values: &[Value]) -> Result<Vec<PgRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    Ok(bind_all(sqlx::query(sql), values).fetch_all(executor).await?)
}

async fn get_with<'e, E>(executor: E, sql: &str, values: &[Value]) -> Result<PgRow>
where
    E: Executor<'e, Database = Postgres>,
{
    bind_all(sqlx::query(sql), values)
        .fetch_optional(executor)
        .await?
        .ok_or(Error::NotFound)
}

/// Streams rows lazily; the cursor owns the statement text and values.
fn fetch_with<'e, E>(executor: E, sql: String, values: Vec<Value>) -> RowCursor<'e, PgRow>
where
    E: Executor<'e, Database = Postgres> + 'e,
{
    Box::pin(stream! {
        let mut rows = bind_all(sqlx::query(&sql), &values).fetch(executor);
        while let Some(row) = rows.next().await {
            yield row.map_err(Error::from);
        }
    })
}
