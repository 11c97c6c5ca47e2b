use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use tt_core::{Backend, CancelToken, Controller, Progress, ProgressSink};
use tt_types::{ControllerState, RunOutcome, RunReport, RunRequest};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema, PartialEq, Eq)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    pub subproblem: usize,
    pub total: usize,
    pub scope: String,
    pub state: ControllerState,
}

impl From<&Progress> for JobProgress {
    fn from(p: &Progress) -> Self {
        Self {
            subproblem: p.subproblem,
            total: p.total,
            scope: p.scope.clone(),
            state: p.state,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum JobStatus {
    Queued,
    Running { progress: JobProgress },
    Completed { report: RunReport },
    /// Cancellation was honored; the report holds whatever was solved before it.
    Aborted { report: RunReport },
    Failed { message: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed { .. } | JobStatus::Aborted { .. } | JobStatus::Failed { .. }
        )
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            JobStatus::Completed { report } | JobStatus::Aborted { report } => Some(report),
            _ => None,
        }
    }
}

struct JobEntry {
    status: JobStatus,
    cancel: CancelToken,
}

type JobMap = Arc<RwLock<HashMap<String, JobEntry>>>;

fn set_status(map: &JobMap, id: &str, status: JobStatus) {
    if let Some(entry) = map.write().get_mut(id) {
        entry.status = status;
    }
}

struct JobSink {
    id: String,
    map: JobMap,
}

impl ProgressSink for JobSink {
    fn on_transition(&self, progress: &Progress) {
        set_status(
            &self.map,
            &self.id,
            JobStatus::Running {
                progress: progress.into(),
            },
        );
    }
}

/// In-memory job registry. Runs execute on tokio's blocking pool.
pub struct InMemJobs<B: Backend + 'static> {
    inner: JobMap,
    backend: Arc<B>,
}

impl<B: Backend + 'static> Clone for InMemJobs<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            backend: self.backend.clone(),
        }
    }
}

impl<B: Backend + 'static> InMemJobs<B> {
    pub fn new(backend: B) -> Self {
        Self {
            inner: Default::default(),
            backend: Arc::new(backend),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, req: RunRequest) -> JobId {
        let id = Uuid::new_v4().to_string();
        let cancel = CancelToken::new();
        self.inner.write().insert(
            id.clone(),
            JobEntry {
                status: JobStatus::Queued,
                cancel: cancel.clone(),
            },
        );

        let map = self.inner.clone();
        let backend = self.backend.clone();
        let id_for_task = id.clone();

        tokio::task::spawn_blocking(move || {
            let sink = JobSink {
                id: id_for_task.clone(),
                map: map.clone(),
            };
            let result = Controller::new(&req.instance, &req.config, &*backend)
                .with_cancel(cancel)
                .with_progress(&sink)
                .run();
            let status = match result {
                Ok(report) if report.outcome == RunOutcome::Aborted => {
                    info!(job = %id_for_task, "job aborted");
                    JobStatus::Aborted { report }
                }
                Ok(report) => {
                    info!(job = %id_for_task, outcome = ?report.outcome, "job finished");
                    JobStatus::Completed { report }
                }
                Err(e) => {
                    error!(job = %id_for_task, error = %e, "job failed");
                    JobStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            set_status(&map, &id_for_task, status);
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).map(|e| e.status.clone())
    }

    /// Requests cancellation. Returns `false` for unknown or already finished jobs.
    pub fn cancel(&self, id: &str) -> bool {
        let map = self.inner.read();
        match map.get(id) {
            Some(entry) if !entry.status.is_finished() => {
                entry.cancel.cancel();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tt_core::lp::LinearModel;
    use tt_core::Verdict;
    use tt_types::{Block, Course, CourseKind, Instance, Room, RoomCategory, RunConfig, SolveBudget};

    struct Slow(u64);

    impl Backend for Slow {
        fn solve(&self, _model: &LinearModel, _budget: &SolveBudget) -> anyhow::Result<Verdict> {
            std::thread::sleep(Duration::from_millis(self.0));
            Ok(Verdict::Infeasible)
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn course(code: &str, year: u8) -> Course {
        Course {
            code: code.into(),
            title: code.into(),
            program: "IT".into(),
            year,
            lecture_hours: 2.0,
            lab_hours: 0.0,
            units: 2.0,
            room_category: RoomCategory::NonLab,
            kind: CourseKind::Regular,
        }
    }

    fn request() -> RunRequest {
        RunRequest {
            instance: Instance {
                courses: vec![course("GE101", 1), course("GE201", 2)],
                blocks: [1, 2]
                    .into_iter()
                    .map(|year| Block {
                        program: "IT".into(),
                        year,
                        section: "A".into(),
                        students: 30,
                    })
                    .collect(),
                rooms: vec![Room {
                    id: "R1".into(),
                    building: None,
                    floor: None,
                    capacity: 40,
                    category: RoomCategory::NonLab,
                    equipment: vec![],
                }],
            },
            config: RunConfig::default(),
        }
    }

    async fn wait_finished<B: Backend + 'static>(jobs: &InMemJobs<B>, id: &JobId) -> JobStatus {
        for _ in 0..200 {
            if let Some(s) = jobs.get(&id.0) {
                if s.is_finished() {
                    return s;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job {} did not finish", id.0);
    }

    #[tokio::test]
    async fn job_runs_to_a_report() {
        let jobs = InMemJobs::new(Slow(0));
        let id = jobs.enqueue(request());
        assert!(jobs.get(&id.0).is_some());
        let status = wait_finished(&jobs, &id).await;
        let report = status.report().unwrap();
        assert_eq!(report.outcome, RunOutcome::Failed);
        assert_eq!(report.subproblems.len(), 2);
        assert!(!jobs.cancel(&id.0));
    }

    #[tokio::test]
    async fn cancelled_job_is_aborted() {
        let jobs = InMemJobs::new(Slow(300));
        let id = jobs.enqueue(request());
        assert!(jobs.cancel(&id.0));
        let status = wait_finished(&jobs, &id).await;
        assert!(matches!(status, JobStatus::Aborted { .. }));
    }

    #[tokio::test]
    async fn unknown_job() {
        let jobs = InMemJobs::new(Slow(0));
        assert!(jobs.get("nope").is_none());
        assert!(!jobs.cancel("nope"));
    }

    #[test]
    fn status_is_tagged() {
        let v = serde_json::to_value(JobStatus::Failed { message: "x".into() }).unwrap();
        assert_eq!(v, serde_json::json!({"status": "failed", "message": "x"}));
        let v = serde_json::to_value(JobStatus::Queued).unwrap();
        assert_eq!(v, serde_json::json!({"status": "queued"}));
    }
}
