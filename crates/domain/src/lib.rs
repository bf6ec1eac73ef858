//! # Pardot Domain
//!
//! Business domain types for the Pardot request-governance client.
//!
//! This crate contains:
//! - Credential, session and quota-key types
//! - The classified `RequestOutcome` of a raw API response
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Wire-level constants (endpoints, embedded error codes)
//!
//! ## Architecture
//! - No dependencies on other Pardot crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
