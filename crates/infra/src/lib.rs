//! # Pardot Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The SQLite quota store shared by every process on one host
//! - The Redis quota store shared across hosts
//! - An in-memory quota store
//! - The reqwest HTTP transport
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `pardot-core`
//! - Contains all "impure" code (I/O, network, files)

pub mod client;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod memory_store;
pub mod observability;
pub mod redis_store;

// Re-export commonly used items
pub use client::{connect, connect_with_clock, open_quota_store};
pub use database::{QuotaDbManager, SqliteQuotaStore};
pub use errors::InfraError;
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use memory_store::MemoryQuotaStore;
pub use observability::init_tracing;
pub use redis_store::RedisQuotaStore;
