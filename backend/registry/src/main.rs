//! Conservation project registry — entry point.
//!
//! Exposes a small Axum REST API for registering conservation projects.
//! Each registration pins the project metadata to IPFS, deploys a Soroban
//! project-token contract through the Stellar CLI, and records the linked
//! result in SQLite.

mod api;
mod config;
mod db;
mod errors;
mod ipfs;
mod projects;
mod registration;
mod soroban;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use db::SqliteProjectStore;
use ipfs::PinataClient;
use soroban::SorobanDeployer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    // Load config from environment.
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    // HTTP client used for pinning requests.
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let state = Arc::new(api::ApiState {
        publisher: PinataClient::new(
            client,
            config.pinata_api_url.clone(),
            config.pinata_jwt.clone(),
            config.ipfs_gateway_url.clone(),
        ),
        deployer: SorobanDeployer::new(config.deployer.clone()),
        store: SqliteProjectStore::new(pool.clone()),
        pool,
    });

    let app = Router::new()
        .route("/health", get(api::health))
        .route(
            "/projects",
            post(api::register_project).get(api::get_all_projects),
        )
        .route("/projects/:id", get(api::get_project))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
