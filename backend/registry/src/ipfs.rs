//! IPFS metadata publishing via the Pinata pinning API.
//!
//! The full registration payload is pinned as a JSON blob; the returned CID
//! and a gateway URL derived from it are what the rest of the pipeline (and
//! ultimately the database row) carry.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::projects::{NewProject, PinnedMetadata};

#[derive(Debug, Error)]
pub enum IpfsError {
    #[error("IPFS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pinata API error (status {status}): {body}")]
    Api { status: u16, body: String },
}

/// Seam between the registration pipeline and the metadata storage service.
#[async_trait::async_trait]
pub trait MetadataPublisher {
    async fn publish(&self, project: &NewProject) -> Result<PinnedMetadata, IpfsError>;
}

/// Pinata-backed [`MetadataPublisher`].
#[derive(Debug, Clone)]
pub struct PinataClient {
    client: Client,
    api_url: String,
    jwt: String,
    gateway_url: String,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinataClient {
    pub fn new(client: Client, api_url: String, jwt: String, gateway_url: String) -> Self {
        Self {
            client,
            api_url,
            jwt,
            gateway_url,
        }
    }
}

#[async_trait::async_trait]
impl MetadataPublisher for PinataClient {
    async fn publish(&self, project: &NewProject) -> Result<PinnedMetadata, IpfsError> {
        let url = format!("{}/pinning/pinJSONToIPFS", self.api_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.jwt)
            .json(&json!({
                "pinataContent": project,
                "pinataMetadata": { "name": project.name },
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IpfsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let pin: PinResponse = response.json().await?;
        debug!("Pinned project metadata: {}", pin.ipfs_hash);

        let ipfs_url = retrieval_url(&self.gateway_url, &pin.ipfs_hash);
        Ok(PinnedMetadata {
            ipfs_hash: pin.ipfs_hash,
            ipfs_url,
        })
    }
}

/// Build the gateway URL for a pinned CID.
fn retrieval_url(gateway_url: &str, hash: &str) -> String {
    format!("{}/{hash}", gateway_url.trim_end_matches('/'))
}
