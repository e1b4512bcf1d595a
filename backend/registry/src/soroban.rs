//! Soroban contract deployment — invokes the Stellar CLI and validates the
//! returned contract id.
//!
//! ## Trust boundary
//!
//! The CLI's stdout is untrusted text.  The tool prints diagnostic lines
//! before the final contract address, so the last non-empty line is taken as
//! the candidate id, and the candidate is only trusted once it matches the
//! contract strkey shape (`C` followed by exactly 55 uppercase
//! alphanumerics).  Caller-supplied fields are passed as discrete arguments,
//! never interpolated through a shell.

use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::info;

use crate::config::DeployerConfig;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("deploy command failed with {status}: {stderr}")]
    NonZeroExit {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("deploy command timed out after {0}s")]
    Timeout(u64),

    #[error("invalid contract id in deploy output: {0:?}")]
    InvalidContractId(String),
}

impl DeployError {
    /// Whether the failure came from the child process itself rather than
    /// from validating its output.
    pub fn is_process_failure(&self) -> bool {
        !matches!(self, Self::InvalidContractId(_))
    }
}

/// Seam between the registration pipeline and the contract deployment tool.
#[async_trait::async_trait]
pub trait TokenDeployer {
    async fn deploy(
        &self,
        supply: i64,
        name: &str,
        issuer_public_key: &str,
    ) -> Result<String, DeployError>;
}

/// Deploys the project-token wasm through `stellar contract deploy`.
///
/// Spawns exactly one child process per call and performs no retries; retry
/// policy, if any, belongs to the caller.
#[derive(Debug, Clone)]
pub struct SorobanDeployer {
    config: DeployerConfig,
}

impl SorobanDeployer {
    pub fn new(config: DeployerConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl TokenDeployer for SorobanDeployer {
    async fn deploy(
        &self,
        supply: i64,
        name: &str,
        issuer_public_key: &str,
    ) -> Result<String, DeployError> {
        let source = self
            .config
            .deployer_account
            .as_deref()
            .unwrap_or(issuer_public_key);

        info!(
            "Deploying project token for {name:?} (supply {supply}) on {}",
            self.config.network
        );

        let mut cmd = Command::new(&self.config.cli);
        cmd.args(["contract", "deploy"])
            .arg("--wasm")
            .arg(&self.config.wasm_path)
            .arg("--source")
            .arg(source)
            .arg("--network")
            .arg(&self.config.network)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // reap the child even if the bounded wait below gives up on it
            .kill_on_drop(true);

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Err(_) => return Err(DeployError::Timeout(self.config.timeout_secs)),
            Ok(Err(e)) => {
                return Err(DeployError::Spawn {
                    command: self.config.cli.clone(),
                    source: e,
                })
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(DeployError::NonZeroExit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let contract_id = parse_contract_id(&String::from_utf8_lossy(&output.stdout))?;
        info!("Deployed project token contract {contract_id}");
        Ok(contract_id)
    }
}

/// Take the last non-empty stdout line as the candidate contract id and
/// validate its shape.
fn parse_contract_id(stdout: &str) -> Result<String, DeployError> {
    let candidate = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or("");

    if !is_contract_id(candidate) {
        return Err(DeployError::InvalidContractId(candidate.to_string()));
    }
    Ok(candidate.to_string())
}

/// Shape check for a contract strkey: `C` followed by exactly 55 uppercase
/// alphanumeric characters.
pub fn is_contract_id(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 56
        && bytes[0] == b'C'
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
