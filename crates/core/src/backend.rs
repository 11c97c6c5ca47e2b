use tt_types::{SolveBudget, VerdictKind};

use crate::lp::{Assignment, LinearModel};

/// What the optimization backend concluded about one model.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Optimal {
        assignment: Assignment,
        objective: f64,
    },
    FeasibleWithinGap {
        assignment: Assignment,
        objective: f64,
        gap: f64,
    },
    Infeasible,
    TimedOutNoIncumbent,
}

impl Verdict {
    pub fn kind(&self) -> VerdictKind {
        match self {
            Verdict::Optimal { .. } => VerdictKind::Optimal,
            Verdict::FeasibleWithinGap { .. } => VerdictKind::FeasibleWithinGap,
            Verdict::Infeasible => VerdictKind::Infeasible,
            Verdict::TimedOutNoIncumbent => VerdictKind::TimedOutNoIncumbent,
        }
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Verdict::Optimal { assignment, .. } | Verdict::FeasibleWithinGap { assignment, .. } => {
                Some(assignment)
            }
            _ => None,
        }
    }

    pub fn objective(&self) -> Option<f64> {
        match self {
            Verdict::Optimal { objective, .. } | Verdict::FeasibleWithinGap { objective, .. } => {
                Some(*objective)
            }
            _ => None,
        }
    }

    pub fn gap(&self) -> Option<f64> {
        match self {
            Verdict::Optimal { .. } => Some(0.0),
            Verdict::FeasibleWithinGap { gap, .. } => Some(*gap),
            _ => None,
        }
    }
}

/// An optimization oracle: model and budget in, verdict out.
///
/// Implementations run synchronously and may block for up to the time
/// budget. An `Err` means the backend itself broke, not that the model has
/// no solution.
pub trait Backend: Send + Sync {
    fn solve(&self, model: &LinearModel, budget: &SolveBudget) -> anyhow::Result<Verdict>;

    fn name(&self) -> &'static str;
}

impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    fn solve(&self, model: &LinearModel, budget: &SolveBudget) -> anyhow::Result<Verdict> {
        (**self).solve(model, budget)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
