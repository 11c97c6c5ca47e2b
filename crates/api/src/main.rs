mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod classify;
    pub mod feasibility;
    pub mod health;
    pub mod jobs;
    pub mod solve;
    pub mod validate;
}

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            routes::health::health,
            routes::validate::validate_handler,
            routes::feasibility::feasibility,
            routes::solve::solve,
            routes::jobs::status,
            routes::jobs::result,
            routes::jobs::cancel,
            routes::classify::classify,
        ),
        components(schemas(
            tt_types::Instance, tt_types::Course, tt_types::Block, tt_types::Room,
            tt_types::BlockKey, tt_types::RoomCategory, tt_types::CourseKind,
            tt_types::DayOfWeek, tt_types::ClockTime, tt_types::TimeWindow, tt_types::SlotId,
            tt_types::CourseCode, tt_types::RoomId, tt_types::ProgramId,
            tt_types::RunRequest, tt_types::RunConfig, tt_types::TimeDomainConfig,
            tt_types::ObjectiveConfig, tt_types::Weights, tt_types::SolveBudget,
            tt_types::Strategy, tt_types::ScopeKey, tt_types::ModelMode, tt_types::ClassRules,
            tt_types::FixedBooking, tt_types::ClassComponent,
            tt_types::RunReport, tt_types::RunOutcome, tt_types::FeasibilityReport,
            tt_types::FeasibilityVerdict, tt_types::CategoryBalance, tt_types::BlockLoad,
            tt_types::SubproblemReport, tt_types::SubproblemStatus, tt_types::VerdictKind,
            tt_types::ControllerState, tt_types::BlockSchedule, tt_types::ScheduleEntry,
            tt_types::DayRange, tt_types::UnscheduledClass, tt_types::Metrics,
            tt_jobs::JobId, tt_jobs::JobStatus, tt_jobs::JobProgress,
            routes::validate::ValidationReport,
            routes::solve::JobCreated,
            routes::classify::ClassifyIn,
            routes::classify::ClassifyOut,
        )),
        tags(
            (name = "timetable", description = "Course timetabling API")
        )
    )]
struct ApiDoc;

fn app(app_state: state::AppState) -> Router {
    Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/feasibility", post(routes::feasibility::feasibility))
        .route("/v1/solve", post(routes::solve::solve))
        .route("/v1/classify", post(routes::classify::classify))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .route("/v1/jobs/:id/cancel", post(routes::jobs::cancel))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(telemetry::stack())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let port = std::env::var("TIMETABLE__SERVER__PORT").unwrap_or_else(|_| "8080".into());
    let addr: std::net::SocketAddr = format!("0.0.0.0:{}", port)
        .parse()
        .with_context(|| format!("invalid listen port {port:?}"))?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state::AppState::new_default())).await?;
    Ok(())
}
