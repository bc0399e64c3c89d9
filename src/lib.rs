//! Postgres Unit of Work Module
//!
//! This module provides a unit of work that runs queries either directly on a
//! shared connection or, transparently, on an active transaction. Business
//! code issues the same calls in both modes; [`UnitOfWork::in_transaction`]
//! owns the begin / commit / rollback lifecycle around it.
//!
//! ```no_run
//! use pg_unit_of_work::{Error, MutationResult, NamedArgs, PostgresUnitOfWork};
//! use std::sync::Arc;
//!
//! # async fn example(pool: sqlx::PgPool) -> Result<(), Error> {
//! let mut uow = PostgresUnitOfWork::from_pool(Arc::new(pool));
//!
//! let _inserted = uow
//!     .in_transaction(|uow| {
//!         Box::pin(async move {
//!             let args = NamedArgs::new().bind("name", "Alice");
//!             let rows = uow
//!                 .execute_named("INSERT INTO users (name) VALUES (:name)", &args)
//!                 .await
//!                 .into_result()?;
//!             Ok::<_, Error>(rows)
//!         })
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod postgres;
pub mod result;
pub mod transaction_aware;
pub mod unit_of_work;
pub mod value;

pub use config::{ConfigError, DatabaseConfig};
pub use error::{Error, Result};
pub use executor::{Connection, DataAccess, FromRecord, RowCursor, TransactionHandle};
pub use postgres::{PostgresConnection, PostgresTransaction, PostgresUnitOfWork};
pub use result::{ErrorResult, MutationResult, QueryResult};
pub use transaction_aware::TransactionAware;
pub use unit_of_work::UnitOfWork;
pub use value::{NamedArgs, ToNamedArgs, Value};
