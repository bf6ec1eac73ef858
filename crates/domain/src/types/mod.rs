//! Domain types and models

pub mod outcome;
pub mod quota;
pub mod session;

pub use outcome::{ApiOperation, EmbeddedError, HttpMethod, RequestOutcome};
pub use quota::QuotaKey;
pub use session::{auth_header_value, Credentials, Session};
