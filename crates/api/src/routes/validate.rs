use axum::Json;
use serde::Serialize;
use tt_core::validate;
use tt_types::RunRequest;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/v1/validate",
    request_body = RunRequest,
    responses(
    (status = 200, description = "Validation result", body = ValidationReport)
    )
)]
pub async fn validate_handler(Json(req): Json<RunRequest>) -> Json<ValidationReport> {
    match validate(&req.instance, &req.config) {
        Ok(()) => Json(ValidationReport { ok: true, errors: vec![] }),
        Err(e) => Json(ValidationReport { ok: false, errors: e.0 }),
    }
}
