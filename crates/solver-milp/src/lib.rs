//! `Backend` implementation on `good_lp`.
//!
//! COIN-OR CBC (feature `cbc`, on by default) receives the time limit and
//! relative gap of every [`SolveBudget`]. The pure-Rust `microlp` solver
//! (feature `microlp`, used only when `cbc` is off) ignores both: it always
//! searches to proven optimality, so the budget is enforced from outside by
//! abandoning the solve once the time limit passes. The gap is not applied.

#[cfg(not(any(feature = "cbc", feature = "microlp")))]
compile_error!("tt-milp needs a solver: enable the `cbc` or `microlp` feature");

use std::time::Instant;

use good_lp::{
    variable, Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus, Solver,
    SolverModel, Variable,
};
use tracing::{debug, warn};
use tt_core::lp::{Assignment, LinExpr, LinearModel, Relation, Sense, VarKind};
use tt_core::{Backend, Verdict};
use tt_types::SolveBudget;

const CONSTANT_TOLERANCE: f64 = 1e-9;

#[derive(Clone, Copy, Debug, Default)]
pub struct MilpBackend;

impl MilpBackend {
    pub fn new() -> Self {
        Self
    }
}

fn declare_vars(model: &LinearModel, pvars: &mut ProblemVariables) -> Vec<Variable> {
    model
        .vars()
        .iter()
        .map(|def| {
            let v = match def.kind {
                VarKind::Binary => variable().binary(),
                VarKind::Continuous { lower, upper } => match upper {
                    Some(u) => variable().min(lower).max(u),
                    None => variable().min(lower),
                },
            };
            pvars.add(v.name(def.name.clone()))
        })
        .collect()
}

fn to_expression(e: &LinExpr, vars: &[Variable]) -> Expression {
    let mut sum = Expression::from(e.constant);
    for &(v, c) in &e.terms {
        sum = sum + c * vars[v.0];
    }
    sum
}

/// Adds every non-constant constraint. Returns `None` when a constant
/// constraint is already violated, i.e. the model is trivially infeasible.
fn add_constraints<M: SolverModel>(
    mut problem: M,
    model: &LinearModel,
    vars: &[Variable],
) -> Option<M> {
    for c in model.constraints() {
        if c.expr.is_constant() {
            if !c.holds(&Assignment::default(), CONSTANT_TOLERANCE) {
                debug!(constraint = %c.name, "constant constraint violated");
                return None;
            }
            continue;
        }
        let lhs = to_expression(&c.expr, vars);
        problem = match c.relation {
            Relation::Le => problem.with(lhs.leq(c.rhs)),
            Relation::Eq => problem.with(lhs.eq(c.rhs)),
            Relation::Ge => problem.with(lhs.geq(c.rhs)),
        };
    }
    Some(problem)
}

fn read_assignment(model: &LinearModel, vars: &[Variable], sol: &impl Solution) -> Assignment {
    Assignment(
        model
            .vars()
            .iter()
            .zip(vars)
            .map(|(def, &v)| {
                let value = sol.value(v);
                match def.kind {
                    VarKind::Binary => {
                        if value > 0.5 {
                            1.0
                        } else {
                            0.0
                        }
                    }
                    VarKind::Continuous { .. } => value,
                }
            })
            .collect(),
    )
}

#[cfg(feature = "cbc")]
fn configure(
    mut problem: good_lp::solvers::coin_cbc::CoinCbcProblem,
    budget: &SolveBudget,
) -> good_lp::solvers::coin_cbc::CoinCbcProblem {
    problem.set_parameter("log", "0");
    problem.set_parameter("sec", &budget.time_limit_sec.to_string());
    problem.set_parameter("ratioGap", &budget.gap.to_string());
    problem
}

/// Translates `model`, hands it to `solver` and classifies the outcome from
/// the solver's own termination status.
fn solve_with<S: Solver>(
    model: &LinearModel,
    budget: &SolveBudget,
    solver: S,
    tune: impl FnOnce(S::Model, &SolveBudget) -> S::Model,
) -> anyhow::Result<Verdict>
where
    S::Model: SolverModel<Error = ResolutionError>,
{
    let mut pvars = ProblemVariables::new();
    let vars = declare_vars(model, &mut pvars);
    let objective = to_expression(model.objective(), &vars);
    let unsolved = match model.sense() {
        Sense::Maximize => pvars.maximise(objective),
        Sense::Minimize => pvars.minimise(objective),
    };
    let problem = tune(unsolved.using(solver), budget);

    let Some(problem) = add_constraints(problem, model, &vars) else {
        return Ok(Verdict::Infeasible);
    };

    let started = Instant::now();
    match problem.solve() {
        Ok(sol) => {
            let assignment = read_assignment(model, &vars, &sol);
            let objective = model.objective().evaluate(&assignment);
            match sol.status() {
                SolutionStatus::Optimal => Ok(Verdict::Optimal {
                    assignment,
                    objective,
                }),
                status => {
                    debug!(?status, "stopped before proving optimality");
                    Ok(Verdict::FeasibleWithinGap {
                        assignment,
                        objective,
                        gap: budget.gap,
                    })
                }
            }
        }
        Err(ResolutionError::Infeasible) => Ok(Verdict::Infeasible),
        // CBC reports a time limit without incumbent as a generic failure.
        Err(e) if started.elapsed() >= budget.time_limit() => {
            warn!(error = %e, "no incumbent within the time budget");
            Ok(Verdict::TimedOutNoIncumbent)
        }
        Err(e) => Err(anyhow::anyhow!("solver failed: {e}")),
    }
}

/// Runs microlp on a worker thread and stops waiting at the time limit.
/// An abandoned worker keeps running until its search ends.
#[cfg(all(feature = "microlp", not(feature = "cbc")))]
fn solve_watched(model: &LinearModel, budget: &SolveBudget) -> anyhow::Result<Verdict> {
    use std::sync::mpsc::{self, RecvTimeoutError};

    let (tx, rx) = mpsc::channel();
    let owned = model.clone();
    let budget = *budget;
    std::thread::Builder::new()
        .name("microlp".into())
        .spawn(move || {
            let _ = tx.send(solve_with(&owned, &budget, good_lp::microlp, |p, _| p));
        })?;
    match rx.recv_timeout(budget.time_limit()) {
        Ok(verdict) => verdict,
        Err(RecvTimeoutError::Timeout) => {
            warn!(limit_sec = budget.time_limit_sec, "microlp exceeded the time budget");
            Ok(Verdict::TimedOutNoIncumbent)
        }
        Err(RecvTimeoutError::Disconnected) => Err(anyhow::anyhow!("microlp worker died")),
    }
}

impl Backend for MilpBackend {
    fn solve(&self, model: &LinearModel, budget: &SolveBudget) -> anyhow::Result<Verdict> {
        debug!(
            backend = self.name(),
            vars = model.num_vars(),
            constraints = model.num_constraints(),
            "translating model"
        );

        #[cfg(feature = "cbc")]
        let verdict = solve_with(model, budget, good_lp::coin_cbc, configure);
        #[cfg(all(feature = "microlp", not(feature = "cbc")))]
        let verdict = solve_watched(model, budget);

        verdict.map_err(|e| e.context(format!("{} backend", self.name())))
    }

    fn name(&self) -> &'static str {
        if cfg!(feature = "cbc") {
            "cbc"
        } else {
            "microlp"
        }
    }
}
