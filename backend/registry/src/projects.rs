//! Project domain types shared across the registration pipeline.

use serde::{Deserialize, Serialize};

/// Inbound registration payload, as supplied by the caller.
///
/// All fields are immutable once the pipeline starts; the whole struct is
/// pinned to IPFS verbatim as the project's metadata blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub location: String,
    pub photo_url: String,
    pub impact: String,
    pub asset_code: String,
    pub issuer_public_key: String,
    pub supply: i64,
}

impl NewProject {
    /// Validate caller-supplied fields before any external effect runs.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.supply <= 0 {
            return Err("supply must be a positive integer".to_string());
        }
        if self.asset_code.is_empty()
            || self.asset_code.len() > 12
            || !self
                .asset_code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err("asset_code must be 1-12 uppercase alphanumeric characters".to_string());
        }
        if !is_account_public_key(&self.issuer_public_key) {
            return Err("issuer_public_key is not a valid Stellar account key".to_string());
        }
        Ok(())
    }
}

/// Location of the pinned metadata blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedMetadata {
    /// Content hash (CID) assigned by the pinning service
    pub ipfs_hash: String,
    /// Resolvable gateway URL for the pinned content
    pub ipfs_url: String,
}

/// A fully linked project ready to be stored: metadata pinned, contract
/// deployed, no row id or timestamp assigned yet.
#[derive(Debug, Clone)]
pub struct PendingProject {
    pub project: NewProject,
    pub metadata: PinnedMetadata,
    pub contract_id: String,
}

/// A registered project as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub location: String,
    pub photo_url: String,
    pub impact: String,
    pub asset_code: String,
    pub issuer_public_key: String,
    pub supply: i64,
    pub ipfs_hash: String,
    pub ipfs_url: String,
    pub contract_id: String,
    pub created_at: i64,
}

/// Shape check for an ed25519 account strkey: `G` followed by 55 base32
/// (`A-Z2-7`) characters.
pub fn is_account_public_key(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 56
        && bytes[0] == b'G'
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(b))
}
