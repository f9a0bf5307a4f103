use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;

use crate::core::error::{LauncherError, LauncherResult};

/// Body of a response, delivered chunk by chunk.
pub type ByteStream = BoxStream<'static, LauncherResult<Vec<u8>>>;

/// Response headers plus the still-unread body.
pub struct TransportResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

/// Network seam of the transfer engine.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, url: &str) -> LauncherResult<TransportResponse>;
}

/// Plain GET over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, url: &str) -> LauncherResult<TransportResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(LauncherError::from))
            .boxed();

        Ok(TransportResponse {
            status,
            content_length,
            body,
        })
    }
}
