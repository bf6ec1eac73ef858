//! Remote API access: ports, classification, execution and the client
//! facade.

pub mod classification;
pub mod client;
pub mod endpoint;
pub mod executor;
pub mod ports;

pub use classification::{classify, embedded_error, PardotRetryPolicy};
pub use client::PardotClient;
pub use endpoint::ApiCall;
pub use executor::{retry_config, RequestExecutor};
pub use ports::{ApiRequest, ApiTransport, RawResponse};
