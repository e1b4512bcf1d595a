//! Application-wide error types.
//!
//! Per-step failures of the registration pipeline carry their own error
//! enums ([`crate::ipfs::IpfsError`], [`crate::soroban::DeployError`],
//! [`crate::registration::RegistrationError`]); this module only covers the
//! service plumbing around them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
