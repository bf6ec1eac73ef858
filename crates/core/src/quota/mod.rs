//! Shared daily call budget

pub mod ports;
pub mod service;

pub use ports::QuotaStore;
pub use service::DailyQuota;
