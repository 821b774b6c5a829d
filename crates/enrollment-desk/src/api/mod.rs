//! REST plumbing shared by every workflow: transport seam, HTTP client,
//! endpoint catalog and the keyed query cache.

pub mod cache;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod transport;

#[cfg(test)]
pub(crate) mod stub;

pub use cache::{QueryCache, QueryKey};
pub use client::{ApiClient, Envelope, Invalidation};
pub use endpoints::Endpoint;
pub use error::{extract_message, ApiError, GENERIC_FAILURE_MESSAGE};
pub use http::HttpTransport;
pub use transport::Transport;
