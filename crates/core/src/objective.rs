use tt_types::{ObjectiveConfig, Weights};

use crate::builder::BuiltModel;
use crate::error::ConfigError;
use crate::lp::{LinExpr, Sense};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// The named objective terms of one sub-problem, each scaled into `[0, 1]`.
///
/// Built alongside the constraints by the model builder; weighting happens
/// here so tuning never touches constraint construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectiveTerms {
    pub utilization: LinExpr,
    pub conflicts: LinExpr,
    pub idle_time: LinExpr,
    pub fairness: LinExpr,
    pub contiguity: LinExpr,
}

pub fn validate(cfg: &ObjectiveConfig) -> Result<(), ConfigError> {
    let w = &cfg.weights;
    for (name, value) in [
        ("utilization", w.utilization),
        ("conflicts", w.conflicts),
        ("idle_time", w.idle_time),
        ("fairness", w.fairness),
        ("contiguity_penalty", cfg.contiguity_penalty),
    ] {
        if value < 0.0 || !value.is_finite() {
            return Err(ConfigError::NegativeWeight { name, value });
        }
    }
    let sum = w.sum();
    if (sum - Weights::NORMALIZATION).abs() > WEIGHT_TOLERANCE {
        return Err(ConfigError::WeightsNotNormalized {
            sum,
            expected: Weights::NORMALIZATION,
        });
    }
    Ok(())
}

/// `Z = α·U − β·C − γ·I + δ·F − κ·P`, to be maximized.
pub fn compose(terms: &ObjectiveTerms, cfg: &ObjectiveConfig) -> LinExpr {
    let w = &cfg.weights;
    let mut z = LinExpr::new();
    z.add_expr(&terms.utilization, w.utilization)
        .add_expr(&terms.conflicts, -w.conflicts)
        .add_expr(&terms.idle_time, -w.idle_time)
        .add_expr(&terms.fairness, w.fairness)
        .add_expr(&terms.contiguity, -cfg.contiguity_penalty);
    z
}

pub fn apply(built: &mut BuiltModel, cfg: &ObjectiveConfig) {
    let z = compose(&built.terms, cfg);
    built.model.set_objective(Sense::Maximize, z);
}
