//! Time utilities and abstractions
//!
//! - **Clock abstractions**: real and mock time, so that day rollover and
//!   counter expiry can be tested without waiting.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use pardot_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! ```

pub mod clock;

// Re-export commonly used items
pub use clock::{Clock, MockClock, SystemClock};
