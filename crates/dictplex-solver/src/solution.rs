use crate::dictionary::{Dictionary, Variable};

/// The result of solving an LP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each decision variable
    pub values: Vec<f64>,
    /// Optimal values for each slack variable, in constraint order
    pub slacks: Vec<f64>,
    /// Optimal objective value; `+inf` when unbounded, and omitted from the
    /// serialized form in that case since JSON has no infinity
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "is_unbounded_objective", default = "unbounded_objective")
    )]
    pub objective_value: f64,
    /// Number of pivots performed
    pub iterations: usize,
    /// Basic variable of each row of the terminal dictionary
    pub basis: Vec<Variable>,
    /// The entering variable that could grow without limit (when unbounded)
    pub unbounded_variable: Option<Variable>,
}

#[cfg(feature = "serde")]
fn is_unbounded_objective(value: &f64) -> bool {
    *value == f64::INFINITY
}

#[cfg(feature = "serde")]
fn unbounded_objective() -> f64 {
    f64::INFINITY
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The objective can be increased without limit
    Unbounded,
}

impl Solution {
    pub fn optimal(dictionary: &Dictionary, iterations: usize) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values: dictionary.decision_values(),
            slacks: dictionary.slack_values(),
            objective_value: dictionary.objective_value(),
            iterations,
            basis: dictionary.basis(),
            unbounded_variable: None,
        }
    }

    pub fn unbounded(entering: Variable, iterations: usize) -> Self {
        Self {
            status: SolutionStatus::Unbounded,
            values: Vec::new(),
            slacks: Vec::new(),
            objective_value: f64::INFINITY,
            iterations,
            basis: Vec::new(),
            unbounded_variable: Some(entering),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_json_round_trip() {
        let solution = Solution::unbounded(1, 3);
        let json = serde_json::to_string(&solution).unwrap();
        assert!(!json.contains("objective_value"));

        let back: Solution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, solution);
        assert_eq!(back.objective_value, f64::INFINITY);
        assert_eq!(back.unbounded_variable, Some(1));
    }

    #[test]
    fn test_optimal_json_keeps_objective() {
        let solution = Solution {
            status: SolutionStatus::Optimal,
            values: vec![3.0, 1.0],
            slacks: vec![0.0, 0.0, 2.0],
            objective_value: 11.0,
            iterations: 2,
            basis: vec![1, 0, 4],
            unbounded_variable: None,
        };
        let json = serde_json::to_string(&solution).unwrap();
        assert!(json.contains("\"objective_value\":11.0"));
        assert_eq!(serde_json::from_str::<Solution>(&json).unwrap(), solution);
    }
}
