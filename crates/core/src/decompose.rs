use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use tt_types::{
    ControllerState, FeasibilityReport, Instance, ProgramId, RunConfig, RunOutcome, RunReport,
    ScopeKey, Strategy, SubproblemReport, SubproblemStatus, UnscheduledClass, VerdictKind,
};

use crate::backend::{Backend, Verdict};
use crate::builder::ModelBuilder;
use crate::classes::{expand_classes, Class, ClassId};
use crate::error::{ConfigError, CoreError};
use crate::extract::extract;
use crate::feasibility;
use crate::objective;
use crate::occupancy::{self, Occupancy, Placement};
use crate::scoring::compute_metrics;
use crate::time_domain::TimeDomain;

const CONTRACT_TOLERANCE: f64 = 1e-6;

/// Cooperative cancellation flag, honored between sub-problems only.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Zero-based index of the current sub-problem.
    pub subproblem: usize,
    pub total: usize,
    pub scope: String,
    pub state: ControllerState,
}

/// Observer of controller progress. Both hooks run on the controller's thread.
pub trait ProgressSink: Send + Sync {
    fn on_transition(&self, _progress: &Progress) {}

    /// Called after a sub-problem's placements were merged into the carried occupancy.
    fn on_accepted(&self, _subproblem: usize, _occupancy: &Occupancy) {}
}

pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Partition label for the built-in scope keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScopeLabel {
    All,
    Year(u8),
    Program(ProgramId),
    ProgramYear(ProgramId, u8),
    /// Sorted by descending block count, then program id.
    SizedProgram(Reverse<usize>, ProgramId),
}

impl ScopeLabel {
    /// `blocks` holds the number of blocks per program; only
    /// [`ScopeKey::ProgramBySize`] reads it.
    pub fn of(key: ScopeKey, class: &Class, blocks: &BTreeMap<ProgramId, usize>) -> Self {
        match key {
            ScopeKey::YearLevel => ScopeLabel::Year(class.year),
            ScopeKey::Program => ScopeLabel::Program(class.program.clone()),
            ScopeKey::ProgramYear => ScopeLabel::ProgramYear(class.program.clone(), class.year),
            ScopeKey::ProgramBySize => ScopeLabel::SizedProgram(
                Reverse(blocks.get(&class.program).copied().unwrap_or_default()),
                class.program.clone(),
            ),
        }
    }
}

/// Number of blocks each program enrolls.
pub fn program_blocks(instance: &Instance) -> BTreeMap<ProgramId, usize> {
    let mut sizes: BTreeMap<ProgramId, usize> = BTreeMap::new();
    for b in &instance.blocks {
        *sizes.entry(b.program.clone()).or_default() += 1;
    }
    sizes
}

impl fmt::Display for ScopeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeLabel::All => f.write_str("all"),
            ScopeLabel::Year(y) => write!(f, "year {y}"),
            ScopeLabel::Program(p) => write!(f, "program {p}"),
            ScopeLabel::ProgramYear(p, y) => write!(f, "{p}-{y}"),
            ScopeLabel::SizedProgram(_, p) => write!(f, "program {p}"),
        }
    }
}

/// Drives a run: feasibility, per-scope model construction, backend calls and
/// merging of accepted occupancy.
pub struct Controller<'a, B: Backend + ?Sized> {
    instance: &'a Instance,
    config: &'a RunConfig,
    backend: &'a B,
    cancel: CancelToken,
    progress: &'a dyn ProgressSink,
}

struct Prepared {
    domain: TimeDomain,
    classes: Vec<Class>,
    /// Occupancy from fixed bookings; every run starts from it.
    fixed: Occupancy,
}

fn prepare(instance: &Instance, config: &RunConfig) -> Result<Prepared, CoreError> {
    objective::validate(&config.objective)?;
    let gap = config.budget.gap;
    if !(0.0..1.0).contains(&gap) {
        return Err(ConfigError::InvalidGap(gap).into());
    }
    if let Strategy::Sequential { reserve_ratio, .. } = config.strategy {
        if !(0.0..=1.0).contains(&reserve_ratio) {
            return Err(ConfigError::InvalidReserveRatio(reserve_ratio).into());
        }
    }
    let domain = TimeDomain::for_courses(&config.time_domain, &instance.courses, &config.rules)?;
    let classes = expand_classes(instance, &domain, &config.rules)?;
    let fixed = occupancy::from_bookings(instance, &domain, &config.fixed_occupancy)?;
    Ok(Prepared { domain, classes, fixed })
}

/// Pre-solve demand/supply check of the whole instance, net of fixed bookings.
pub fn preflight(instance: &Instance, config: &RunConfig) -> Result<FeasibilityReport, CoreError> {
    let p = prepare(instance, config)?;
    Ok(feasibility::estimate("all", instance, &p.domain, &p.classes, &p.fixed))
}

impl<'a, B: Backend + ?Sized> Controller<'a, B> {
    pub fn new(instance: &'a Instance, config: &'a RunConfig, backend: &'a B) -> Self {
        Self {
            instance,
            config,
            backend,
            cancel: CancelToken::new(),
            progress: &NoProgress,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn run(&self) -> Result<RunReport, CoreError> {
        match self.config.strategy {
            Strategy::Global => self.execute(self.config.strategy, |_| ScopeLabel::All, false),
            Strategy::Sequential { key, .. } => {
                let blocks = program_blocks(self.instance);
                self.execute(self.config.strategy, move |c| ScopeLabel::of(key, c, &blocks), true)
            }
        }
    }

    /// Sequential run over a caller-supplied partition; scopes run in
    /// ascending key order.
    pub fn run_with_key<K, F>(&self, key: F) -> Result<RunReport, CoreError>
    where
        K: Ord + fmt::Display,
        F: Fn(&Class) -> K,
    {
        let strategy = match self.config.strategy {
            s @ Strategy::Sequential { .. } => s,
            Strategy::Global => Strategy::default(),
        };
        self.execute(strategy, key, true)
    }

    pub fn preflight(&self) -> Result<FeasibilityReport, CoreError> {
        preflight(self.instance, self.config)
    }

    fn transition(&self, subproblem: usize, total: usize, scope: &str, state: ControllerState) {
        debug!(subproblem, total, scope, state = ?state, "controller transition");
        self.progress.on_transition(&Progress {
            subproblem,
            total,
            scope: scope.to_string(),
            state,
        });
    }

    fn execute<K, F>(&self, strategy: Strategy, key: F, sequential: bool) -> Result<RunReport, CoreError>
    where
        K: Ord + fmt::Display,
        F: Fn(&Class) -> K,
    {
        let Prepared { domain, classes, fixed } = prepare(self.instance, self.config)?;
        let builder = ModelBuilder::new(self.instance, &domain, &classes, self.config.mode)?;
        let reserve_ratio = match strategy {
            Strategy::Sequential { reserve_ratio, .. } if sequential => reserve_ratio,
            _ => 0.0,
        };

        let preflight = feasibility::estimate("all", self.instance, &domain, &classes, &fixed);
        if !preflight.is_likely_feasible() {
            warn!(
                deficits = preflight.deficits().count(),
                overloaded_blocks = preflight.overloaded_blocks.len(),
                "instance is likely infeasible"
            );
        }

        let mut partition: BTreeMap<K, Vec<ClassId>> = BTreeMap::new();
        for c in &classes {
            partition.entry(key(c)).or_default().push(c.id);
        }
        let scopes: Vec<(K, Vec<ClassId>)> = partition.into_iter().collect();
        let total = scopes.len();
        info!(
            backend = self.backend.name(),
            classes = classes.len(),
            subproblems = total,
            sequential,
            "run started"
        );
        self.transition(0, total, "", ControllerState::Idle);

        let mut occupancy = fixed;
        let mut placements: Vec<Placement> = Vec::new();
        let mut unscheduled: Vec<UnscheduledClass> = Vec::new();
        let mut subproblems = Vec::with_capacity(total);
        let mut objective_sum = 0.0_f64;
        let mut aborted = false;

        for (index, (label, ids)) in scopes.iter().enumerate() {
            let scope = label.to_string();
            let mut report = SubproblemReport {
                index,
                scope: scope.clone(),
                classes: ids.len(),
                status: SubproblemStatus::Skipped,
                feasibility: None,
                verdict: None,
                objective: None,
                gap: None,
                variables: 0,
                constraints: 0,
                elapsed_ms: 0,
                reserved_pairs: 0,
            };

            if aborted || self.cancel.is_cancelled() {
                if !aborted {
                    info!(subproblem = index, scope = %scope, "cancellation honored");
                }
                aborted = true;
                unscheduled.extend(self.unscheduled(&classes, ids, &scope, "run aborted before this sub-problem"));
                subproblems.push(report);
                continue;
            }

            let reserved = (reserve_ratio > 0.0 && index + 1 < total).then(|| {
                let later = scopes[index + 1..]
                    .iter()
                    .flat_map(|(_, later_ids)| later_ids.iter().map(|id| &classes[id.0]));
                let held = feasibility::lab_reserve(
                    self.instance,
                    &domain,
                    ids.iter().map(|id| &classes[id.0]),
                    later,
                    &occupancy,
                    reserve_ratio,
                );
                let mut scoped = occupancy.clone();
                for &(room, slot) in &held {
                    scoped.hold_room(room, slot);
                }
                info!(subproblem = index, scope = %scope, reserved = held.len(), "lab pairs held for later scopes");
                report.reserved_pairs = held.len();
                scoped
            });
            let available = reserved.as_ref().unwrap_or(&occupancy);

            if sequential {
                self.transition(index, total, &scope, ControllerState::CheckingFeasibility);
                let est = feasibility::estimate(
                    &scope,
                    self.instance,
                    &domain,
                    ids.iter().map(|id| &classes[id.0]),
                    available,
                );
                if !est.is_likely_feasible() {
                    warn!(subproblem = index, scope = %scope, deficits = est.deficits().count(), "sub-problem likely infeasible");
                }
                report.feasibility = Some(est);
            }

            self.transition(index, total, &scope, ControllerState::BuildingSubproblem);
            let mut built = builder.build(ids, available)?;
            objective::apply(&mut built, &self.config.objective);
            report.variables = built.model.num_vars();
            report.constraints = built.model.num_constraints();

            self.transition(index, total, &scope, ControllerState::Solving);
            let started = Instant::now();
            let verdict = self
                .backend
                .solve(&built.model, &self.config.budget)
                .map_err(|e| CoreError::Backend {
                    scope: scope.clone(),
                    message: format!("{e:#}"),
                })?;
            report.elapsed_ms = started.elapsed().as_millis() as u64;
            report.verdict = Some(verdict.kind());
            report.objective = verdict.objective();
            report.gap = verdict.gap();
            info!(
                subproblem = index,
                scope = %scope,
                verdict = ?verdict.kind(),
                vars = report.variables,
                constraints = report.constraints,
                elapsed_ms = report.elapsed_ms,
                "sub-problem solved"
            );

            match &verdict {
                Verdict::Optimal { assignment, objective } | Verdict::FeasibleWithinGap { assignment, objective, .. } => {
                    self.transition(index, total, &scope, ControllerState::MergingResult);
                    let violations = built.model.check(assignment, CONTRACT_TOLERANCE);
                    if let Some(first) = violations.first() {
                        return Err(CoreError::BackendContract {
                            scope,
                            count: violations.len(),
                            first: first.clone(),
                        });
                    }
                    let decoded = built.decode(assignment);
                    occupancy
                        .absorb(decoded.placements.iter().map(|p| (p, classes[p.class.0].block)))
                        .map_err(|o| CoreError::BackendContract {
                            scope: scope.clone(),
                            count: 1,
                            first: format!("room {} slot {} already occupied", o.room, o.slot),
                        })?;
                    self.progress.on_accepted(index, &occupancy);
                    unscheduled.extend(self.unscheduled(
                        &classes,
                        &decoded.unscheduled,
                        &scope,
                        "left unscheduled by the relaxed model",
                    ));
                    placements.extend(decoded.placements);
                    objective_sum += *objective;
                    report.status = SubproblemStatus::Solved;
                }
                Verdict::Infeasible | Verdict::TimedOutNoIncumbent => {
                    let reason = match verdict.kind() {
                        VerdictKind::TimedOutNoIncumbent => "solver timed out without a feasible assignment",
                        _ => "sub-problem is infeasible",
                    };
                    warn!(subproblem = index, scope = %scope, reason, "sub-problem failed");
                    unscheduled.extend(self.unscheduled(&classes, ids, &scope, reason));
                    report.status = SubproblemStatus::Failed;
                }
            }
            subproblems.push(report);
        }

        let end_state = if aborted {
            ControllerState::Aborted
        } else {
            ControllerState::Done
        };
        self.transition(total.saturating_sub(1), total, "", end_state);

        let solved = subproblems
            .iter()
            .filter(|s| s.status == SubproblemStatus::Solved)
            .count();
        let failed = subproblems
            .iter()
            .filter(|s| s.status == SubproblemStatus::Failed)
            .count();
        let outcome = if aborted {
            RunOutcome::Aborted
        } else if total > 0 && solved == 0 {
            RunOutcome::Failed
        } else if failed > 0 || !unscheduled.is_empty() {
            RunOutcome::PartiallyCompleted
        } else {
            RunOutcome::Completed
        };

        let schedule = extract(self.instance, &domain, &classes, &placements);
        let metrics = compute_metrics(self.instance, &domain, &classes, &placements, unscheduled.len());
        info!(
            outcome = ?outcome,
            solved,
            failed,
            unscheduled = unscheduled.len(),
            utilization_pct = metrics.utilization_pct,
            "run finished"
        );

        Ok(RunReport {
            outcome,
            strategy,
            preflight,
            subproblems,
            schedule,
            unscheduled,
            metrics,
            objective: objective_sum,
        })
    }

    fn unscheduled(
        &self,
        classes: &[Class],
        ids: &[ClassId],
        scope: &str,
        reason: &str,
    ) -> Vec<UnscheduledClass> {
        ids.iter()
            .map(|id| {
                let c = &classes[id.0];
                UnscheduledClass {
                    block: c.block_key.clone(),
                    course_code: c.code.clone(),
                    component: c.component,
                    scope: scope.to_string(),
                    reason: reason.to_string(),
                }
            })
            .collect()
    }
}
