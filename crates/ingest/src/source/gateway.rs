use async_trait::async_trait;
use reqwest::Client;

use cidvault_core::config::GatewayConfig;
use cidvault_core::{FetchError, MetadataDocument};

use super::traits::MetadataSource;

/// Metadata source backed by an IPFS HTTP gateway (`GET {base_url}{cid}`).
pub struct GatewaySource {
    client: Client,
    base_url: String,
}

impl GatewaySource {
    /// Build a client with the configured per-request timeout.
    pub fn new(config: &GatewayConfig) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(config.fetch_timeout()).build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { client, base_url }
    }

    pub fn url_for(&self, cid: &str) -> String {
        format!("{}{}", self.base_url, cid)
    }
}

#[async_trait]
impl MetadataSource for GatewaySource {
    async fn fetch(&self, cid: &str) -> Result<MetadataDocument, FetchError> {
        let response = self
            .client
            .get(self.url_for(cid))
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::RemoteError {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        MetadataDocument::from_slice(&body).map_err(|e| FetchError::DecodeError(e.to_string()))
    }
}
