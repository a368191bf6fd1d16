use thiserror::Error;

/// A standard-form linear program:
///
///   maximize   sum_j objective[j] * x_j
///   subject to sum_j constraint_i[j] * x_j <= rhs_i   (for every constraint i)
///              x_j >= 0
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Decision variable names
    pub variables: Vec<String>,
    /// Objective coefficients, one per decision variable
    pub objective: Vec<f64>,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each decision variable
    pub coefficients: Vec<f64>,
    /// Right-hand side value, must be non-negative
    pub rhs: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Constraint {row} ({name}) has negative right-hand side {value}; only non-negative scalars are supported")]
    InfeasibleInput { row: usize, name: String, value: f64 },
    #[error("Constraint {row} has {found} coefficients, expected {expected}")]
    ConstraintDimension { row: usize, expected: usize, found: usize },
    #[error("Objective has {found} coefficients, expected {expected}")]
    ObjectiveDimension { expected: usize, found: usize },
    #[error("Non-finite value in {what}")]
    NonFinite { what: String },
}

impl Problem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: vec![0.0; n],
            constraints: Vec::new(),
        }
    }

    /// Build a problem from the flat form: `a` is the m x n constraint matrix in
    /// row-major order, `b` the right-hand sides and `c` the objective.
    ///
    /// Variables are named `x0..`, constraints `c0..`.
    pub fn from_dense(a: &[f64], b: &[f64], c: &[f64]) -> Result<Self, ProblemError> {
        let n = c.len();
        if a.len() != b.len() * n {
            let found = if b.is_empty() { a.len() } else { a.len() / b.len() };
            return Err(ProblemError::ConstraintDimension {
                row: 0,
                expected: n,
                found,
            });
        }

        let mut problem = Problem::new((0..n).map(|j| format!("x{}", j)).collect());
        problem.set_objective(c.to_vec());
        for (i, &rhs) in b.iter().enumerate() {
            problem.add_constraint(format!("c{}", i), a[i * n..(i + 1) * n].to_vec(), rhs);
        }
        Ok(problem)
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>) {
        self.objective = coefficients;
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check dimensions, finiteness and right-hand side signs, in that order.
    pub fn validate(&self) -> Result<(), ProblemError> {
        let n = self.num_variables();

        if self.objective.len() != n {
            return Err(ProblemError::ObjectiveDimension {
                expected: n,
                found: self.objective.len(),
            });
        }
        for (row, c) in self.constraints.iter().enumerate() {
            if c.coefficients.len() != n {
                return Err(ProblemError::ConstraintDimension {
                    row,
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
        }

        if self.objective.iter().any(|v| !v.is_finite()) {
            return Err(ProblemError::NonFinite {
                what: "objective".to_string(),
            });
        }
        for c in &self.constraints {
            if !c.rhs.is_finite() || c.coefficients.iter().any(|v| !v.is_finite()) {
                return Err(ProblemError::NonFinite {
                    what: format!("constraint {}", c.name),
                });
            }
        }

        // No phase one: the origin must be feasible.
        for (row, c) in self.constraints.iter().enumerate() {
            if c.rhs < 0.0 {
                return Err(ProblemError::InfeasibleInput {
                    row,
                    name: c.name.clone(),
                    value: c.rhs,
                });
            }
        }

        Ok(())
    }
}
