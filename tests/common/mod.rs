#![allow(dead_code)]

pub mod entities;
pub mod repositories;

pub use entities::{Order, User};
pub use fake::{Call, FakeConnection, Op, SettlementLog, Target};
pub use repositories::{OrderRepository, UserRepository};

use pg_unit_of_work::Error;

/// Error returned by test work functions.
#[derive(Debug, PartialEq)]
pub enum WorkError {
    Aborted,
    Store(String),
}

impl From<Error> for WorkError {
    fn from(err: Error) -> Self {
        WorkError::Store(err.to_string())
    }
}

/// Routes `tracing` output through the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
