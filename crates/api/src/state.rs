use std::sync::Arc;
use tt_jobs::InMemJobs;
use tt_milp::MilpBackend;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<MilpBackend>>,
}

impl AppState {
    pub fn new_default() -> Self {
        Self {
            jobs: Arc::new(InMemJobs::new(MilpBackend::new())),
        }
    }
}
