//! Database implementations

pub mod manager;
pub mod quota_repository;

pub use manager::{QuotaConnection, QuotaDbManager};
pub use quota_repository::SqliteQuotaStore;
