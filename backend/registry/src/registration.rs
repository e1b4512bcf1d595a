//! Registration pipeline — publish metadata, deploy the token contract, and
//! persist the linked record, in that fixed order.
//!
//! Each stage's output feeds the next, so the stages never interleave and a
//! failure aborts the rest of the pipeline immediately.  Earlier side effects
//! are not rolled back: a deploy failure leaves the pinned metadata orphaned,
//! and a persist failure additionally leaves the deployed contract orphaned.
//! Orphans are logged for operators; no compensating cleanup is attempted and
//! no stage is retried.

use thiserror::Error;
use tracing::warn;

use crate::db::ProjectStore;
use crate::ipfs::{IpfsError, MetadataPublisher};
use crate::projects::{NewProject, PendingProject, ProjectRecord};
use crate::soroban::{DeployError, TokenDeployer};

/// The three ordered stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Publish,
    Deploy,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Deploy => "deploy",
            Self::Persist => "persist",
        }
    }
}

/// A registration failure, identifying the stage that failed and carrying
/// the underlying cause.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("metadata publish failed: {0}")]
    Publish(#[source] IpfsError),

    #[error("contract deployment failed: {0}")]
    Deploy(#[source] DeployError),

    #[error("project persist failed: {0}")]
    Persist(#[source] sqlx::Error),
}

impl RegistrationError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Publish(_) => Stage::Publish,
            Self::Deploy(_) => Stage::Deploy,
            Self::Persist(_) => Stage::Persist,
        }
    }
}

/// Run the full registration pipeline for one project.
///
/// Returns the stored row verbatim, including its generated id and creation
/// timestamp.  Two calls with identical inputs produce two uploads, two
/// deployments and two rows; deduplication belongs to the request boundary.
pub async fn register<P, D, S>(
    publisher: &P,
    deployer: &D,
    store: &S,
    project: NewProject,
) -> Result<ProjectRecord, RegistrationError>
where
    P: MetadataPublisher + Sync,
    D: TokenDeployer + Sync,
    S: ProjectStore + Sync,
{
    let metadata = publisher
        .publish(&project)
        .await
        .map_err(RegistrationError::Publish)?;

    let contract_id = match deployer
        .deploy(project.supply, &project.name, &project.issuer_public_key)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            warn!(
                "Deploy failed; pinned metadata {} is now orphaned",
                metadata.ipfs_hash
            );
            return Err(RegistrationError::Deploy(e));
        }
    };

    let pending = PendingProject {
        project,
        metadata,
        contract_id,
    };

    match store.insert(&pending).await {
        Ok(record) => Ok(record),
        Err(e) => {
            warn!(
                "Persist failed; pinned metadata {} and contract {} are now orphaned",
                pending.metadata.ipfs_hash, pending.contract_id
            );
            Err(RegistrationError::Persist(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::projects::PinnedMetadata;

    const VALID_ID: &str = "CABCDEFGHIJKLMNOPQRSTUVWXYZABCDEFGHIJKLMNOPQRSTUVWXYZ123";
    const ISSUER: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    fn mangrove() -> NewProject {
        NewProject {
            name: "Mangrove Restoration".to_string(),
            description: "Replanting mangroves along the delta".to_string(),
            location: "Niger Delta".to_string(),
            photo_url: "https://example.com/mangrove.jpg".to_string(),
            impact: "500 hectares restored".to_string(),
            asset_code: "MNG".to_string(),
            issuer_public_key: ISSUER.to_string(),
            supply: 1_000_000,
        }
    }

    fn bafy() -> PinnedMetadata {
        PinnedMetadata {
            ipfs_hash: "bafy123".to_string(),
            ipfs_url: "https://ipfs.example/bafy123".to_string(),
        }
    }

    struct FakePublisher {
        log: CallLog,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl MetadataPublisher for FakePublisher {
        async fn publish(&self, _project: &NewProject) -> Result<PinnedMetadata, IpfsError> {
            self.log.lock().unwrap().push("publish");
            if self.fail {
                return Err(IpfsError::Api {
                    status: 500,
                    body: "pinning unavailable".to_string(),
                });
            }
            Ok(bafy())
        }
    }

    struct FakeDeployer {
        log: CallLog,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl TokenDeployer for FakeDeployer {
        async fn deploy(
            &self,
            _supply: i64,
            _name: &str,
            _issuer_public_key: &str,
        ) -> Result<String, DeployError> {
            self.log.lock().unwrap().push("deploy");
            if self.fail {
                return Err(DeployError::InvalidContractId("bogus".to_string()));
            }
            Ok(VALID_ID.to_string())
        }
    }

    struct FakeStore {
        log: CallLog,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl ProjectStore for FakeStore {
        async fn insert(
            &self,
            pending: &PendingProject,
        ) -> Result<ProjectRecord, sqlx::Error> {
            self.log.lock().unwrap().push("insert");
            if self.fail {
                return Err(sqlx::Error::RowNotFound);
            }
            Ok(ProjectRecord {
                id: 1,
                name: pending.project.name.clone(),
                description: pending.project.description.clone(),
                location: pending.project.location.clone(),
                photo_url: pending.project.photo_url.clone(),
                impact: pending.project.impact.clone(),
                asset_code: pending.project.asset_code.clone(),
                issuer_public_key: pending.project.issuer_public_key.clone(),
                supply: pending.project.supply,
                ipfs_hash: pending.metadata.ipfs_hash.clone(),
                ipfs_url: pending.metadata.ipfs_url.clone(),
                contract_id: pending.contract_id.clone(),
                created_at: 1_700_000_000,
            })
        }
    }

    fn fakes(
        publish_fails: bool,
        deploy_fails: bool,
        persist_fails: bool,
    ) -> (CallLog, FakePublisher, FakeDeployer, FakeStore) {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        (
            log.clone(),
            FakePublisher {
                log: log.clone(),
                fail: publish_fails,
            },
            FakeDeployer {
                log: log.clone(),
                fail: deploy_fails,
            },
            FakeStore {
                log,
                fail: persist_fails,
            },
        )
    }

    #[tokio::test]
    async fn success_runs_stages_in_order_and_merges_outputs() {
        let (log, publisher, deployer, store) = fakes(false, false, false);

        let record = register(&publisher, &deployer, &store, mangrove())
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["publish", "deploy", "insert"]);
        assert_eq!(record.ipfs_hash, "bafy123");
        assert_eq!(record.ipfs_url, "https://ipfs.example/bafy123");
        assert_eq!(record.contract_id, VALID_ID);
        // original registration fields are carried through unchanged
        assert_eq!(record.name, "Mangrove Restoration");
        assert_eq!(record.asset_code, "MNG");
        assert_eq!(record.issuer_public_key, ISSUER);
        assert_eq!(record.supply, 1_000_000);
    }

    #[tokio::test]
    async fn publish_failure_short_circuits() {
        let (log, publisher, deployer, store) = fakes(true, false, false);

        let err = register(&publisher, &deployer, &store, mangrove())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Publish);
        // deploy and insert were never invoked
        assert_eq!(*log.lock().unwrap(), vec!["publish"]);
    }

    #[tokio::test]
    async fn deploy_failure_skips_persist_and_keeps_cause() {
        let (log, publisher, deployer, store) = fakes(false, true, false);

        let err = register(&publisher, &deployer, &store, mangrove())
            .await
            .unwrap_err();

        assert_eq!(*log.lock().unwrap(), vec!["publish", "deploy"]);
        match err {
            RegistrationError::Deploy(DeployError::InvalidContractId(candidate)) => {
                assert_eq!(candidate, "bogus");
            }
            other => panic!("expected Deploy(InvalidContractId), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn persist_failure_is_reported_as_persist_stage() {
        let (log, publisher, deployer, store) = fakes(false, false, true);

        let err = register(&publisher, &deployer, &store, mangrove())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Persist);
        assert_eq!(*log.lock().unwrap(), vec!["publish", "deploy", "insert"]);
    }

    /// End-to-end scenario with a real subprocess standing in for the CLI:
    /// diagnostics on stdout followed by the contract address.
    #[cfg(unix)]
    #[tokio::test]
    async fn register_with_scripted_cli() {
        use std::os::unix::fs::PermissionsExt;

        use crate::config::DeployerConfig;
        use crate::soroban::SorobanDeployer;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stellar");
        std::fs::write(&path, format!("#!/bin/sh\necho 'Deploying...'\necho {VALID_ID}\n"))
            .unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();

        let deployer = SorobanDeployer::new(DeployerConfig {
            cli: path.to_string_lossy().into_owned(),
            wasm_path: "project_token.wasm".to_string(),
            network: "testnet".to_string(),
            deployer_account: None,
            timeout_secs: 5,
        });
        let (_log, publisher, _unused, store) = fakes(false, false, false);

        let record = register(&publisher, &deployer, &store, mangrove())
            .await
            .unwrap();

        assert_eq!(record.contract_id, VALID_ID);
        assert_eq!(record.ipfs_hash, "bafy123");
        assert_eq!(record.ipfs_url, "https://ipfs.example/bafy123");
    }
}
