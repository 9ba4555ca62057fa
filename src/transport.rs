use async_trait::async_trait;
use http::StatusCode;

use crate::error::{TransportError, TransportResult};
use crate::request::SignedRequest;

/// Response returned by a `Transport`.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Executes a fully-assembled signed request.
///
/// One round trip per call; retry policy, timeouts and cancellation belong to
/// the implementation. Dropping the returned future before completion leaves
/// stored handshake state untouched, the flow writes nothing until a response
/// is fully parsed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: SignedRequest) -> TransportResult<TransportResponse>;
}

#[async_trait]
impl<T> Transport for std::sync::Arc<T>
where
    T: Transport + ?Sized,
{
    async fn execute(&self, request: SignedRequest) -> TransportResult<TransportResponse> {
        (**self).execute(request).await
    }
}

/// Default transport backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Constructs the transport over `reqwest::Client::new()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs the transport over a preconfigured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        ReqwestTransport { inner: client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: SignedRequest) -> TransportResult<TransportResponse> {
        let mut builder = self
            .inner
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::Io(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| TransportError::Io(err.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}
