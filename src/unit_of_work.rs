use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{debug, error, warn};

use crate::executor::{Connection, DataAccess, FromRecord, RowCursor, TransactionHandle};
use crate::{Error, MutationResult, QueryResult, Result, ToNamedArgs, TransactionAware, Value};

/// What the unit of work currently dispatches to.
enum Binding<T> {
    Idle,
    Active(T),
}

#[derive(Clone, Copy)]
enum Settlement {
    Commit,
    Rollback,
}

impl Settlement {
    fn as_str(self) -> &'static str {
        match self {
            Settlement::Commit => "commit",
            Settlement::Rollback => "rollback",
        }
    }
}

/// Unit of Work over a shared connection and an optional active transaction.
///
/// Every data operation is routed to the active transaction when there is
/// one, otherwise to the connection, so the same business code runs both
/// inside and outside [`UnitOfWork::in_transaction`].
///
/// An instance holding an active transaction must not be shared across
/// tasks. Independent instances may share the same connection.
pub struct UnitOfWork<C: Connection> {
    connection: C,
    binding: Binding<C::Transaction>,
    observers: Arc<RwLock<Vec<Arc<dyn TransactionAware>>>>,
}

impl<C: Connection> UnitOfWork<C> {
    /// Create an idle unit of work bound to the shared connection.
    pub fn new(connection: C) -> Self {
        Self::from_parts(connection, None)
    }

    /// Create a unit of work from a connection and an already-open transaction.
    pub fn from_parts(connection: C, transaction: Option<C::Transaction>) -> Self {
        let binding = match transaction {
            Some(tx) => Binding::Active(tx),
            None => Binding::Idle,
        };
        Self {
            connection,
            binding,
            observers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The shared connection idle operations run on.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Whether operations are currently routed to a transaction.
    pub fn is_active(&self) -> bool {
        matches!(self.binding, Binding::Active(_))
    }

    /// Register a component that needs to be notified of settlements.
    pub fn register_transaction_aware(&self, observer: Arc<dyn TransactionAware>) {
        self.observers.write().push(observer);
    }

    fn executor(&mut self) -> &mut dyn DataAccess<Row = C::Row> {
        match &mut self.binding {
            Binding::Active(tx) => tx,
            Binding::Idle => &mut self.connection,
        }
    }

    /// Executes a mutating statement with named parameters.
    ///
    /// Failures are not propagated: they come back as a result whose
    /// [`MutationResult::error`] is set and whose row count is zero.
    pub async fn execute_named<A>(&mut self, query: &str, args: &A) -> Box<dyn MutationResult>
    where
        A: ToNamedArgs + ?Sized,
    {
        let args = args.to_named_args();
        self.executor().named_execute(query, &args).await.into()
    }

    /// Executes a mutating statement with positional parameters.
    ///
    /// # Panics
    ///
    /// Panics if the statement fails.
    pub async fn must_execute(&mut self, query: &str, args: &[Value]) -> QueryResult {
        match self.executor().execute(query, args).await {
            Ok(done) => done,
            Err(err) => panic!("statement failed: {err}"),
        }
    }

    /// Runs a query with positional parameters and returns a lazy cursor
    /// over its rows. A statement that fails is reported here, not by the
    /// cursor.
    pub async fn query(&mut self, query: &str, args: &[Value]) -> Result<RowCursor<'_, C::Row>> {
        self.executor().query(query, args).await
    }

    /// Runs a query with `:name` parameters and returns a lazy cursor.
    pub async fn query_named<A>(&mut self, query: &str, args: &A) -> Result<RowCursor<'_, C::Row>>
    where
        A: ToNamedArgs + ?Sized,
    {
        let args = args.to_named_args();
        self.executor().named_query(query, &args).await
    }

    /// Runs a query and appends every mapped row to `dest`.
    ///
    /// Nothing is appended unless every row maps.
    pub async fn select<T>(&mut self, dest: &mut Vec<T>, query: &str, args: &[Value]) -> Result<()>
    where
        T: FromRecord<C::Row>,
    {
        let rows = self.executor().select_all(query, args).await?;
        let mapped = rows
            .iter()
            .map(T::from_record)
            .collect::<Result<Vec<T>>>()?;
        dest.extend(mapped);
        Ok(())
    }

    /// Runs a query and maps its single row.
    ///
    /// Returns [`Error::NotFound`] when no row matches.
    pub async fn get<T>(&mut self, query: &str, args: &[Value]) -> Result<T>
    where
        T: FromRecord<C::Row>,
    {
        let row = self.executor().get_one(query, args).await?;
        T::from_record(&row)
    }

    /// Commit the active transaction.
    ///
    /// The transaction is released whether or not the commit succeeds, so
    /// the instance can be reused against the connection afterwards.
    ///
    /// # Panics
    ///
    /// Panics if no transaction is active.
    pub async fn commit(&mut self) -> Result<()> {
        self.settle(Settlement::Commit).await
    }

    /// Roll back the active transaction.
    ///
    /// # Panics
    ///
    /// Panics if no transaction is active.
    pub async fn rollback(&mut self) -> Result<()> {
        self.settle(Settlement::Rollback).await
    }

    /// Runs `work` inside a new transaction.
    ///
    /// The transaction is committed when `work` returns `Ok` and rolled back
    /// when it returns `Err` or panics. A panic is re-raised unchanged after
    /// the rollback. The settlement outcome is logged and reported to
    /// registered [`TransactionAware`] observers; the caller always receives
    /// exactly what `work` returned.
    ///
    /// Starting while a transaction is already active returns
    /// [`Error::TransactionAlreadyActive`] and leaves that transaction alone.
    /// If the returned future is dropped before settlement, the transaction
    /// is released unsettled and the instance goes back to the connection.
    /// Dropping a [`crate::PostgresTransaction`] rolls it back.
    ///
    /// # Panics
    ///
    /// Panics if the store refuses to begin a transaction.
    pub async fn in_transaction<T, E, F>(&mut self, work: F) -> std::result::Result<T, E>
    where
        F: for<'u> FnOnce(&'u mut Self) -> BoxFuture<'u, std::result::Result<T, E>>,
        E: From<Error>,
    {
        if self.is_active() {
            warn!("rejecting transaction start on a unit of work that is already active");
            return Err(Error::TransactionAlreadyActive.into());
        }

        self.begin().await;
        let mut scope = TransactionScope { uow: self };

        // The closure call itself sits inside the unwind boundary.
        let outcome = AssertUnwindSafe(async { work(&mut *scope.uow).await })
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                error!("unit of work panicked, rolling back");
                if scope.uow.is_active() {
                    // Outcome is reported through the log and observers.
                    let _ = scope.uow.rollback().await;
                }
                panic::resume_unwind(payload);
            }
        };

        if !scope.uow.is_active() {
            warn!("work settled its own transaction");
            return result;
        }

        // Settlement failures are reported through the log and observers,
        // never merged into the work's result.
        let _ = if result.is_ok() {
            scope.uow.commit().await
        } else {
            scope.uow.rollback().await
        };

        result
    }

    async fn begin(&mut self) {
        match self.connection.begin().await {
            Ok(tx) => {
                debug!("transaction started");
                self.binding = Binding::Active(tx);
            }
            Err(err) => panic!("failed to begin transaction: {err}"),
        }
    }

    async fn settle(&mut self, settlement: Settlement) -> Result<()> {
        let tx = match std::mem::replace(&mut self.binding, Binding::Idle) {
            Binding::Active(tx) => tx,
            Binding::Idle => panic!(
                "{} called with no active transaction",
                settlement.as_str()
            ),
        };

        let outcome = match settlement {
            Settlement::Commit => tx.commit().await,
            Settlement::Rollback => tx.rollback().await,
        };

        match &outcome {
            Ok(()) => debug!(settlement = settlement.as_str(), "transaction settled"),
            Err(err) => warn!(
                settlement = settlement.as_str(),
                error = %err,
                "transaction settlement failed"
            ),
        }

        self.notify(settlement, &outcome).await;
        outcome
    }

    async fn notify(&self, settlement: Settlement, outcome: &Result<()>) {
        let observers = self.observers.read().clone();
        for observer in observers.iter() {
            let notified = match settlement {
                Settlement::Commit => observer.on_commit(outcome).await,
                Settlement::Rollback => observer.on_rollback(outcome).await,
            };
            if let Err(err) = notified {
                warn!(
                    settlement = settlement.as_str(),
                    error = %err,
                    "transaction observer failed"
                );
            }
        }
    }
}

/// Releases a transaction left unsettled when `in_transaction` stops early,
/// such as when its future is dropped.
struct TransactionScope<'a, C: Connection> {
    uow: &'a mut UnitOfWork<C>,
}

impl<C: Connection> Drop for TransactionScope<'_, C> {
    fn drop(&mut self) {
        if let Binding::Active(tx) = std::mem::replace(&mut self.uow.binding, Binding::Idle) {
            warn!("transaction abandoned before settlement, releasing it");
            drop(tx);
        }
    }
}

impl<C> fmt::Debug for UnitOfWork<C>
where
    C: Connection + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("connection", &self.connection)
            .field("active", &self.is_active())
            .field("observers", &self.observers.read().len())
            .finish()
    }
}
