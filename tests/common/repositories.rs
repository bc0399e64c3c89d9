use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

use pg_unit_of_work::{Error, MutationResult, PostgresUnitOfWork, Result, TransactionAware};

use super::entities::{Order, User};

/// Treats `NotFound` as an absent row.
fn optional<T>(found: Result<T>) -> Result<Option<T>> {
    match found {
        Ok(value) => Ok(Some(value)),
        Err(Error::NotFound) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Transaction-aware User Repository
pub struct UserRepository {
    // Track settlements for verification in tests
    committed: Arc<RwLock<bool>>,
    rolled_back: Arc<RwLock<bool>>,
}

impl UserRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            committed: Arc::new(RwLock::new(false)),
            rolled_back: Arc::new(RwLock::new(false)),
        })
    }

    pub async fn create(&self, uow: &mut PostgresUnitOfWork, user: &User) -> Result<u64> {
        uow.execute_named(
            "INSERT INTO users (id, username, email) VALUES (:id, :username, :email)",
            user,
        )
        .await
        .into_result()
    }

    pub async fn find_by_id(&self, uow: &mut PostgresUnitOfWork, id: Uuid) -> Result<Option<User>> {
        optional(
            uow.get("SELECT id, username, email FROM users WHERE id = $1", &[id.into()])
                .await,
        )
    }

    pub async fn count(&self, uow: &mut PostgresUnitOfWork) -> Result<i64> {
        let (count,): (i64,) = uow.get("SELECT COUNT(*) FROM users", &[]).await?;
        Ok(count)
    }

    pub fn is_committed(&self) -> bool {
        *self.committed.read()
    }

    pub fn is_rolled_back(&self) -> bool {
        *self.rolled_back.read()
    }
}

#[async_trait]
impl TransactionAware for UserRepository {
    async fn on_commit(&self, outcome: &Result<()>) -> Result<()> {
        *self.committed.write() = outcome.is_ok();
        Ok(())
    }

    async fn on_rollback(&self, outcome: &Result<()>) -> Result<()> {
        *self.rolled_back.write() = outcome.is_ok();
        Ok(())
    }
}

/// Transaction-aware Order Repository
pub struct OrderRepository {
    // Track settlements for verification in tests
    committed: Arc<RwLock<bool>>,
    rolled_back: Arc<RwLock<bool>>,
}

impl OrderRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            committed: Arc::new(RwLock::new(false)),
            rolled_back: Arc::new(RwLock::new(false)),
        })
    }

    pub async fn create(&self, uow: &mut PostgresUnitOfWork, order: &Order) -> Result<u64> {
        uow.execute_named(
            "INSERT INTO orders (id, user_id, product_name, amount) \
             VALUES (:id, :user_id, :product_name, :amount)",
            order,
        )
        .await
        .into_result()
    }

    pub async fn find_by_id(&self, uow: &mut PostgresUnitOfWork, id: Uuid) -> Result<Option<Order>> {
        optional(
            uow.get(
                "SELECT id, user_id, product_name, amount FROM orders WHERE id = $1",
                &[id.into()],
            )
            .await,
        )
    }

    pub async fn count(&self, uow: &mut PostgresUnitOfWork) -> Result<i64> {
        let (count,): (i64,) = uow.get("SELECT COUNT(*) FROM orders", &[]).await?;
        Ok(count)
    }

    pub fn is_committed(&self) -> bool {
        *self.committed.read()
    }

    pub fn is_rolled_back(&self) -> bool {
        *self.rolled_back.read()
    }
}

#[async_trait]
impl TransactionAware for OrderRepository {
    async fn on_commit(&self, outcome: &Result<()>) -> Result<()> {
        *self.committed.write() = outcome.is_ok();
        Ok(())
    }

    async fn on_rollback(&self, outcome: &Result<()>) -> Result<()> {
        *self.rolled_back.write() = outcome.is_ok();
        Ok(())
    }
}
