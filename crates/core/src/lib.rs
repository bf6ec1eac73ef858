//! # Pardot Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (`QuotaStore`, `ApiTransport`)
//! - Response classification and the retry predicate
//! - The daily quota guard, session manager and request executor
//! - The `PardotClient` facade
//!
//! ## Architecture Principles
//! - Only depends on `pardot-common` and `pardot-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod api;
pub mod quota;
pub mod session;

// Re-export specific items to avoid ambiguity
pub use api::{
    classify, embedded_error, ApiCall, ApiRequest, ApiTransport, PardotClient, PardotRetryPolicy,
    RawResponse, RequestExecutor,
};
pub use quota::{DailyQuota, QuotaStore};
pub use session::SessionManager;
