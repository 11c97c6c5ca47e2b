use axum::{
    extract::{Path, State},
    Json,
};
use tt_jobs::JobStatus;
use tt_types::RunReport;

use crate::error::ApiError;
use crate::state::AppState;

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Job status", body = JobStatus),
            (status = 404, description = "Unknown job")
        )
    )]
pub async fn status(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<JobStatus>, ApiError> {
    state
        .jobs
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("job {id} not found")))
}

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}/result",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Run report (if ready)", body = RunReport),
            (status = 404, description = "Unknown job or no report yet")
        )
    )]
pub async fn result(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<RunReport>, ApiError> {
    match state.jobs.get(&id) {
        Some(st) => st
            .report()
            .cloned()
            .map(Json)
            .ok_or_else(|| ApiError::not_found(format!("job {id} has no report yet"))),
        None => Err(ApiError::not_found(format!("job {id} not found"))),
    }
}

#[utoipa::path(
        post,
        path = "/v1/jobs/{id}/cancel",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Cancellation requested; honored before the next sub-problem"),
            (status = 404, description = "Unknown or finished job")
        )
    )]
pub async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    if state.jobs.cancel(&id) {
        tracing::info!(job = %id, "cancellation requested");
        Ok(Json(serde_json::json!({ "status": "cancelling" })))
    } else {
        Err(ApiError::not_found(format!("job {id} not found or already finished")))
    }
}
