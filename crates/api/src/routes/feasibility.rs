use axum::Json;
use tt_types::{FeasibilityReport, RunRequest};

use crate::error::ApiError;

#[utoipa::path(
    post,
    path = "/v1/feasibility",
    request_body = RunRequest,
    responses(
        (status = 200, description = "Demand against room supply for the whole instance", body = FeasibilityReport),
        (status = 422, description = "Configuration or data rejected")
    )
)]
pub async fn feasibility(Json(req): Json<RunRequest>) -> Result<Json<FeasibilityReport>, ApiError> {
    let report = tt_core::preflight(&req.instance, &req.config)?;
    Ok(Json(report))
}
