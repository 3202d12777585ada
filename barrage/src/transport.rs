//! The seam between the dispatcher and whatever actually sends requests.
#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
pub use http::HttpTransport;

use barrage_core::RequestDescriptor;
pub use barrage_core::{RawResult, Response, TransportError};

/// Executes one request and yields its terminal result.
///
/// Implementations must always settle. Timeouts belong to the transport and are reported as
/// [`TransportError::Timeout`]; they never abort the run.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    async fn send(&self, descriptor: &RequestDescriptor) -> RawResult;
}
