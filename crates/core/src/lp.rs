//! Backend-agnostic linear model.
//!
//! The builder and objective composer only ever produce this representation;
//! solver crates translate it into their own problem types.

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VarKind {
    Binary,
    Continuous { lower: f64, upper: Option<f64> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn add(&mut self, var: VarId, coef: f64) -> &mut Self {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
        self
    }

    pub fn add_expr(&mut self, other: &LinExpr, scale: f64) -> &mut Self {
        for &(v, c) in &other.terms {
            self.add(v, c * scale);
        }
        self.constant += other.constant * scale;
        self
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, assignment: &Assignment) -> f64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * assignment.value(v))
            .sum::<f64>()
            + self.constant
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Relation {
    Le,
    Eq,
    Ge,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::Le => "<=",
            Relation::Eq => "=",
            Relation::Ge => ">=",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl Constraint {
    pub fn holds(&self, assignment: &Assignment, tol: f64) -> bool {
        let lhs = self.expr.evaluate(assignment);
        match self.relation {
            Relation::Le => lhs <= self.rhs + tol,
            Relation::Eq => (lhs - self.rhs).abs() <= tol,
            Relation::Ge => lhs >= self.rhs - tol,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Sense {
    #[default]
    Maximize,
    Minimize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearModel {
    vars: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: LinExpr,
    sense: Sense,
}

impl LinearModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_var(&mut self, name: impl Into<String>, kind: VarKind) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDef {
            name: name.into(),
            kind,
        });
        id
    }

    pub fn binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name, VarKind::Binary)
    }

    pub fn continuous(&mut self, name: impl Into<String>, lower: f64, upper: Option<f64>) -> VarId {
        self.add_var(name, VarKind::Continuous { lower, upper })
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinExpr,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            relation,
            rhs,
        });
    }

    pub fn set_objective(&mut self, sense: Sense, objective: LinExpr) {
        self.sense = sense;
        self.objective = objective;
    }

    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> &VarDef {
        &self.vars[id.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Names of every bound or constraint the assignment violates.
    pub fn check(&self, assignment: &Assignment, tol: f64) -> Vec<String> {
        let mut violations = Vec::new();
        if assignment.len() != self.vars.len() {
            violations.push(format!(
                "assignment has {} values for {} variables",
                assignment.len(),
                self.vars.len()
            ));
            return violations;
        }
        for (i, def) in self.vars.iter().enumerate() {
            let v = assignment.0[i];
            let ok = match def.kind {
                VarKind::Binary => v.abs() <= tol || (v - 1.0).abs() <= tol,
                VarKind::Continuous { lower, upper } => {
                    v >= lower - tol && upper.map_or(true, |u| v <= u + tol)
                }
            };
            if !ok {
                violations.push(format!("bound {} = {v}", def.name));
            }
        }
        violations.extend(
            self.constraints
                .iter()
                .filter(|c| !c.holds(assignment, tol))
                .map(|c| c.name.clone()),
        );
        violations
    }
}

/// Values for every model variable, indexed by [`VarId`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignment(pub Vec<f64>);

impl Assignment {
    pub fn value(&self, var: VarId) -> f64 {
        self.0.get(var.0).copied().unwrap_or(0.0)
    }

    /// Binary reading with the usual half-way threshold.
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
