use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AlertRecord, AttendanceRecord};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Persistence for attendance records and the alert ledger.
///
/// Listings are ordered by `recorded_at`, newest first. Ordering and
/// durability of concurrent writes are left to the backend.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts an attendance record together with the alert it raised, if
    /// any. Both writes commit or neither does.
    async fn insert_attendance(
        &self,
        record: &AttendanceRecord,
        alert: Option<&AlertRecord>,
    ) -> Result<(), StoreError>;

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn insert_alert(&self, alert: &AlertRecord) -> Result<(), StoreError>;

    async fn list_alerts(&self) -> Result<Vec<AlertRecord>, StoreError>;

    /// Removes every system-generated alert and returns how many were removed.
    async fn delete_system_alerts(&self) -> Result<u64, StoreError>;
}
