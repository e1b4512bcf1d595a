//! Database layer — migrations and project queries.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::{RegistryError, Result};
use crate::projects::{PendingProject, ProjectRecord};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    // Make sure the URL carries the scheme even when only a path is given.
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    let options = SqliteConnectOptions::from_str(&url)
        .map_err(RegistryError::Database)?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

/// Seam between the registration pipeline and the durable store.
#[async_trait::async_trait]
pub trait ProjectStore {
    async fn insert(
        &self,
        pending: &PendingProject,
    ) -> std::result::Result<ProjectRecord, sqlx::Error>;
}

/// [`ProjectStore`] backed by the SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteProjectStore {
    pool: SqlitePool,
}

impl SqliteProjectStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProjectStore for SqliteProjectStore {
    async fn insert(
        &self,
        pending: &PendingProject,
    ) -> std::result::Result<ProjectRecord, sqlx::Error> {
        insert_project(&self.pool, pending).await
    }
}

// ─────────────────────────────────────────────────────────
// Writes
// ─────────────────────────────────────────────────────────

/// Insert a fully linked project and return the stored row, including its
/// generated id.
pub async fn insert_project(
    pool: &SqlitePool,
    pending: &PendingProject,
) -> std::result::Result<ProjectRecord, sqlx::Error> {
    sqlx::query_as::<_, ProjectRecord>(
        r#"
        INSERT INTO projects
            (name, description, location, photo_url, impact, asset_code,
             issuer_public_key, supply, ipfs_hash, ipfs_url, contract_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        RETURNING id, name, description, location, photo_url, impact, asset_code,
                  issuer_public_key, supply, ipfs_hash, ipfs_url, contract_id, created_at
        "#,
    )
    .bind(&pending.project.name)
    .bind(&pending.project.description)
    .bind(&pending.project.location)
    .bind(&pending.project.photo_url)
    .bind(&pending.project.impact)
    .bind(&pending.project.asset_code)
    .bind(&pending.project.issuer_public_key)
    .bind(pending.project.supply)
    .bind(&pending.metadata.ipfs_hash)
    .bind(&pending.metadata.ipfs_url)
    .bind(&pending.contract_id)
    .bind(chrono::Utc::now().timestamp())
    .fetch_one(pool)
    .await
}

// ─────────────────────────────────────────────────────────
// Reads
// ─────────────────────────────────────────────────────────

/// Fetch one project by its id.
pub async fn get_project(pool: &SqlitePool, id: i64) -> Result<Option<ProjectRecord>> {
    let row = sqlx::query_as::<_, ProjectRecord>(
        r#"
        SELECT id, name, description, location, photo_url, impact, asset_code,
               issuer_public_key, supply, ipfs_hash, ipfs_url, contract_id, created_at
        FROM   projects
        WHERE  id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Fetch all registered projects, newest first.
pub async fn get_all_projects(pool: &SqlitePool) -> Result<Vec<ProjectRecord>> {
    let rows = sqlx::query_as::<_, ProjectRecord>(
        r#"
        SELECT id, name, description, location, photo_url, impact, asset_code,
               issuer_public_key, supply, ipfs_hash, ipfs_url, contract_id, created_at
        FROM   projects
        ORDER  BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::{NewProject, PinnedMetadata};

    const VALID_ID: &str = "CABCDEFGHIJKLMNOPQRSTUVWXYZABCDEFGHIJKLMNOPQRSTUVWXYZ123";
    const ISSUER: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    /// In-memory database for tests.  A single connection is required:
    /// every `sqlite::memory:` connection gets its own database.
    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn pending(name: &str) -> PendingProject {
        PendingProject {
            project: NewProject {
                name: name.to_string(),
                description: "Replanting mangroves along the delta".to_string(),
                location: "Niger Delta".to_string(),
                photo_url: "https://example.com/mangrove.jpg".to_string(),
                impact: "500 hectares restored".to_string(),
                asset_code: "MNG".to_string(),
                issuer_public_key: ISSUER.to_string(),
                supply: 1_000_000,
            },
            metadata: PinnedMetadata {
                ipfs_hash: "bafy123".to_string(),
                ipfs_url: "https://ipfs.example/bafy123".to_string(),
            },
            contract_id: VALID_ID.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_returns_stored_row() {
        let pool = test_pool().await;

        let record = insert_project(&pool, &pending("Mangrove Restoration"))
            .await
            .unwrap();

        assert!(record.id > 0);
        assert!(record.created_at > 0);
        assert_eq!(record.name, "Mangrove Restoration");
        assert_eq!(record.supply, 1_000_000);
        assert_eq!(record.ipfs_hash, "bafy123");
        assert_eq!(record.ipfs_url, "https://ipfs.example/bafy123");
        assert_eq!(record.contract_id, VALID_ID);
    }

    #[tokio::test]
    async fn get_project_round_trips() {
        let pool = test_pool().await;

        let inserted = insert_project(&pool, &pending("Mangrove Restoration"))
            .await
            .unwrap();
        let fetched = get_project(&pool, inserted.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, inserted.id);
        assert_eq!(fetched.contract_id, inserted.contract_id);
        assert_eq!(fetched.created_at, inserted.created_at);

        assert!(get_project(&pool, inserted.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_all_projects_newest_first() {
        let pool = test_pool().await;

        let first = insert_project(&pool, &pending("First")).await.unwrap();
        let second = insert_project(&pool, &pending("Second")).await.unwrap();

        let all = get_all_projects(&pool).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[tokio::test]
    async fn store_seam_inserts_through_pool() {
        let pool = test_pool().await;
        let store = SqliteProjectStore::new(pool.clone());

        let record = store.insert(&pending("Via seam")).await.unwrap();
        assert_eq!(
            get_project(&pool, record.id).await.unwrap().unwrap().name,
            "Via seam"
        );
    }
}
