use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

use crate::Result;

/// One outbound request handed to a [`Transport`].
#[derive(Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// Time budget for the whole exchange, when configured.
    pub timeout: Option<Duration>,
}

/// Status, headers, and a still-unread body produced by a [`Transport`].
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Box<dyn ResponseBody>,
}

/// Request/response exchanger behind the fetch pipeline.
///
/// Network-level failures propagate unwrapped; the pipeline never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn exchange(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Readable, closable response body handle.
///
/// Reading consumes the handle. Dropping it unread releases the underlying
/// connection, which is the close operation on every non-reading exit path.
#[async_trait]
pub trait ResponseBody: Send {
    async fn read_to_end(self: Box<Self>) -> Result<Bytes>;
}

/// [`Transport`] backed by a `reqwest::Client`.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl From<reqwest::Client> for ReqwestTransport {
    fn from(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn exchange(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .http
            .request(request.method, request.url.as_str())
            .headers(request.headers);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        Ok(TransportResponse {
            status: response.status(),
            headers: response.headers().clone(),
            body: Box::new(ReqwestResponseBody(response)),
        })
    }
}

struct ReqwestResponseBody(reqwest::Response);

#[async_trait]
impl ResponseBody for ReqwestResponseBody {
    async fn read_to_end(self: Box<Self>) -> Result<Bytes> {
        Ok(self.0.bytes().await?)
    }
}

/// Shared transport used when no [`with_transport`](crate::with_transport) or
/// [`with_client`](crate::with_client) option is configured.
pub(crate) fn default_transport() -> Arc<dyn Transport> {
    static DEFAULT: OnceLock<Arc<ReqwestTransport>> = OnceLock::new();
    DEFAULT
        .get_or_init(|| Arc::new(ReqwestTransport::new()))
        .clone()
}
