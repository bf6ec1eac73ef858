//! Session management

pub mod service;

pub use service::SessionManager;
