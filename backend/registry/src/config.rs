//! Application configuration loaded from environment variables.

use crate::errors::{RegistryError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL (e.g. sqlite:./registry.db)
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Base URL of the Pinata pinning API
    pub pinata_api_url: String,
    /// Pinata JWT used as a bearer token for pinning requests
    pub pinata_jwt: String,
    /// Gateway base URL used to build retrieval URLs for pinned content
    pub ipfs_gateway_url: String,
    /// Settings for the contract-deployment subprocess
    pub deployer: DeployerConfig,
}

/// Settings consumed by [`crate::soroban::SorobanDeployer`].
///
/// Resolved once at startup and handed to the deployer at construction, so
/// deployments never read ambient process state.
#[derive(Debug, Clone)]
pub struct DeployerConfig {
    /// Name or path of the Stellar CLI binary
    pub cli: String,
    /// Path to the compiled project-token wasm artifact
    pub wasm_path: String,
    /// Target network passed to `stellar contract deploy`
    pub network: String,
    /// Account that signs deployments; when unset, the project's issuer
    /// public key is used per request
    pub deployer_account: Option<String>,
    /// Upper bound on how long a single deployment may run
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./registry.db".to_string()),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| RegistryError::Config("Invalid API_PORT".to_string()))?,
            pinata_api_url: env_var("PINATA_API_URL")
                .unwrap_or_else(|_| "https://api.pinata.cloud".to_string()),
            pinata_jwt: env_var("PINATA_JWT").map_err(|_| {
                RegistryError::Config("PINATA_JWT environment variable is required".to_string())
            })?,
            ipfs_gateway_url: env_var("IPFS_GATEWAY_URL")
                .unwrap_or_else(|_| "https://gateway.pinata.cloud/ipfs".to_string()),
            deployer: DeployerConfig::from_env()?,
        })
    }
}

impl DeployerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(DeployerConfig {
            cli: env_var("STELLAR_CLI").unwrap_or_else(|_| "stellar".to_string()),
            wasm_path: env_var("PROJECT_TOKEN_WASM_PATH").unwrap_or_else(|_| {
                "contracts/target/wasm32-unknown-unknown/release/project_token.wasm".to_string()
            }),
            network: env_var("STELLAR_NETWORK").unwrap_or_else(|_| "testnet".to_string()),
            deployer_account: env_var("CONTRACT_DEPLOYER").ok(),
            timeout_secs: env_var("DEPLOY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .map_err(|_| RegistryError::Config("Invalid DEPLOY_TIMEOUT_SECS".to_string()))?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| RegistryError::Config(format!("Missing env var: {key}")))
}
