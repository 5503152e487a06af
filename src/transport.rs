use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;

use crate::error::TransportError;

/// Body chunks delivered as they arrive from the network.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// Outcome of a whole-body fetch.
#[derive(Debug, Clone)]
pub struct Response {
    pub success: bool,
    pub status: u16,
    pub body: Vec<u8>,
}

/// Fetches remote resources. Pages are retrieved whole, assets are streamed.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, url: &str) -> Result<Response, TransportError>;

    /// Fails unless the response status is a success.
    async fn get_streaming(&self, url: &str) -> Result<ChunkStream, TransportError>;
}

impl<T: Transport> Transport for &T {
    async fn get(&self, url: &str) -> Result<Response, TransportError> {
        (**self).get(url).await
    }

    async fn get_streaming(&self, url: &str) -> Result<ChunkStream, TransportError> {
        (**self).get_streaming(url).await
    }
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: "PageMirror/1.0".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// `reqwest` backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Response, TransportError> {
        debug!(%url, "sending request");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!(%url, status = status.as_u16(), "response received");

        let body = response.bytes().await?;
        Ok(Response {
            success: status.is_success(),
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }

    async fn get_streaming(&self, url: &str) -> Result<ChunkStream, TransportError> {
        debug!(%url, "streaming asset");
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| TransportError::Stream(e.to_string()))
            })
            .boxed())
    }
}
