use async_trait::async_trait;

use crate::Result;

/// Trait for components that need to be notified when a transaction settles.
///
/// Observers registered with a [`crate::UnitOfWork`] are called after every
/// commit or rollback with the settlement's own outcome, including failed
/// settlements that `in_transaction` does not surface to its caller.
#[async_trait]
pub trait TransactionAware: Send + Sync {
    /// Called after a commit was attempted.
    ///
    /// `outcome` is `Err` when the store refused the commit; the
    /// transaction's changes are then not durable.
    async fn on_commit(&self, outcome: &Result<()>) -> Result<()>;

    /// Called after a rollback was attempted.
    async fn on_rollback(&self, outcome: &Result<()>) -> Result<()>;
}
