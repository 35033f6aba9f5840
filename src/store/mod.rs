//! Persistence behind two traits so the service runs against PostgreSQL in
//! production and an in-memory map in tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Calculation, NewCalculation, NewUser, User, UserUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already used")]
    EmailAlreadyUsed,
    #[error("user {0} not found")]
    UserNotFound(i64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Returns `None` when no user has this id.
    async fn update_user(
        &self,
        id: i64,
        update: UserUpdate,
    ) -> Result<Option<User>, StoreError>;

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Deletes the user and every calculation it owns.
    async fn delete_user(&self, id: i64) -> Result<bool, StoreError>;

    async fn delete_all_users(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait CalculationStore: Send + Sync {
    /// Appends a calculation. When it has an owner, the owner's aggregates are
    /// updated in the same transaction (see [`crate::history::fold_into`]).
    async fn append(&self, new: NewCalculation) -> Result<Calculation, StoreError>;

    /// Newest first.
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Calculation>, StoreError>;

    async fn list_all(&self) -> Result<Vec<Calculation>, StoreError>;
}

pub trait Store: UserStore + CalculationStore {}

impl<T: UserStore + CalculationStore> Store for T {}
