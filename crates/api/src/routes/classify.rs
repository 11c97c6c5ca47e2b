use axum::Json;
use serde::{Deserialize, Serialize};
use tt_types::RoomCategory;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyIn {
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lab_hours: f64,
}

#[derive(Serialize, ToSchema)]
pub struct ClassifyOut {
    pub category: RoomCategory,
}

/// Suggests the room category a course needs from its code and description.
#[utoipa::path(
    post,
    path = "/v1/classify",
    request_body = ClassifyIn,
    responses(
    (status = 200, description = "Inferred room category", body = ClassifyOut)
    )
)]
pub async fn classify(Json(input): Json<ClassifyIn>) -> Json<ClassifyOut> {
    Json(ClassifyOut {
        category: RoomCategory::infer(&input.code, &input.description, input.lab_hours),
    })
}
