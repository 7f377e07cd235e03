use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::header::HOST,
    response::Response,
};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("upstream timed out: {0}")]
    Timeout(reqwest::Error),
    #[error("upstream unreachable: {0}")]
    Transport(reqwest::Error),
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Transport(err)
        }
    }
}

/// HTTP client forwarding gateway requests to the backends.
///
/// One `reqwest::Client` is shared by all requests; its timeout bounds the
/// whole exchange, body included.
#[derive(Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
}

impl ServiceClient {
    pub fn new(timeout: Duration) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Sends `request` to `url` and hands back the backend's response with
    /// status, headers and body untouched. Both bodies are streamed.
    pub async fn forward(&self, url: &str, request: Request) -> Result<Response, ProxyError> {
        let (parts, body) = request.into_parts();

        let mut outbound = self.client.request(parts.method, url);
        // reqwest sets Host from the target URL
        for (name, value) in parts.headers.iter().filter(|(name, _)| **name != HOST) {
            outbound = outbound.header(name, value);
        }
        if body.size_hint().exact() != Some(0) {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = outbound.send().await?;
        debug!(status = %upstream.status(), %url, "upstream responded");

        let status = upstream.status();
        let headers = upstream.headers().clone();
        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
