use super::{RawResult, Response, Transport, TransportError};
use barrage_core::RequestDescriptor;
use reqwest::Client;
use std::time::Duration;
use tracing::trace;

/// reqwest-backed transport (requires `http` feature)
///
/// Descriptors with a payload are sent as `POST` with a JSON body, all others as `GET`. There are
/// no retries; every attempt is exactly one request.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, descriptor: &RequestDescriptor) -> RawResult {
        let request = match &descriptor.payload {
            Some(payload) => self.client.post(&descriptor.target).json(payload),
            None => self.client.get(&descriptor.target),
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;
        trace!("{} -> {status} ({} bytes)", descriptor.target, body.len());

        Ok(Some(Response::with_body(status, body.to_vec())))
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}
