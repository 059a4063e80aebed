use std::{future::Future, time::Duration};

use reqwest::header;

use crate::QueryRequest;

/// Error produced when no HTTP response could be obtained.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// One POST of a question to the model endpoint.
#[derive(Clone, Copy, Debug)]
pub struct PostRequest<'a> {
    pub url: &'a str,
    /// Full `Authorization` header value.
    pub authorization: &'a str,
    pub payload: &'a QueryRequest,
    pub timeout: Duration,
}

/// Status and body text of a received HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends a single request and hands back whatever the server answered.
///
/// Implementations must not retry; [`crate::QaClient`] owns the retry loop.
pub trait Transport {
    fn post(
        &self,
        request: PostRequest<'_>,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

#[derive(Clone, Debug, Default)]
/// [`Transport`] backed by `reqwest`.
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a preconfigured `reqwest` client (proxies, custom TLS, ...).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    async fn post(&self, request: PostRequest<'_>) -> Result<RawResponse, TransportError> {
        let response = self
            .http
            .post(request.url)
            .header(header::AUTHORIZATION, request.authorization)
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(request.timeout)
            .json(request.payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}
