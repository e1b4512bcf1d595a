//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::error;

use crate::db::{self, SqliteProjectStore};
use crate::ipfs::PinataClient;
use crate::projects::{NewProject, ProjectRecord};
use crate::registration::{self, Stage};
use crate::soroban::SorobanDeployer;

pub struct ApiState {
    pub pool: SqlitePool,
    pub publisher: PinataClient,
    pub deployer: SorobanDeployer,
    pub store: SqliteProjectStore,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProjectsResponse {
    pub count: usize,
    pub projects: Vec<ProjectRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct RegistrationFailure {
    pub stage: &'static str,
    pub error: String,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /projects`
///
/// Validates the payload, then runs the full registration pipeline:
/// pin metadata to IPFS, deploy the project-token contract, persist the
/// linked record.  The stored row is returned on success; on failure the
/// response names the stage that failed.
pub async fn register_project(
    State(state): State<Arc<ApiState>>,
    Json(project): Json<NewProject>,
) -> impl IntoResponse {
    if let Err(reason) = project.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!(ErrorResponse { error: reason })),
        )
            .into_response();
    }

    match registration::register(&state.publisher, &state.deployer, &state.store, project).await
    {
        Ok(record) => (StatusCode::CREATED, Json(serde_json::json!(record))).into_response(),
        Err(e) => {
            let stage = e.stage();
            error!("Registration failed at {} stage: {e}", stage.as_str());
            let status = match stage {
                // upstream systems (pinning service, blockchain network)
                Stage::Publish | Stage::Deploy => StatusCode::BAD_GATEWAY,
                Stage::Persist => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(serde_json::json!(RegistrationFailure {
                    stage: stage.as_str(),
                    error: e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// `GET /projects`
///
/// Returns all registered projects, newest first.
pub async fn get_all_projects(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match db::get_all_projects(&state.pool).await {
        Ok(projects) => {
            let count = projects.len();
            (
                StatusCode::OK,
                Json(serde_json::json!(ProjectsResponse { count, projects })),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!(ErrorResponse {
                error: e.to_string()
            })),
        )
            .into_response(),
    }
}

/// `GET /projects/:id`
pub async fn get_project(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match db::get_project(&state.pool, id).await {
        Ok(Some(project)) => (StatusCode::OK, Json(serde_json::json!(project))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!(ErrorResponse {
                error: format!("No project with id {id}")
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!(ErrorResponse {
                error: e.to_string()
            })),
        )
            .into_response(),
    }
}
