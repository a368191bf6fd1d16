use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::problem::{Problem, ProblemError};

/// Index of a variable: decision variables occupy `[0, n)`, slack variables `[n, n + m)`.
pub type Variable = usize;

/// A linear expression `scalar + sum(coefficient_v * x_v)` over the non-basic variables.
///
/// Absent coefficients are zero. Keys are kept in ascending order, which fixes
/// the rendering order; the selection rules never depend on it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    scalar: f64,
    coefficients: BTreeMap<Variable, f64>,
}

impl Expression {
    pub fn new(scalar: f64) -> Self {
        Self {
            scalar,
            coefficients: BTreeMap::new(),
        }
    }

    pub fn scalar(&self) -> f64 {
        self.scalar
    }

    /// Coefficient of `variable`, zero when absent.
    pub fn coefficient(&self, variable: Variable) -> f64 {
        self.coefficients.get(&variable).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, variable: Variable) -> bool {
        self.coefficients.contains_key(&variable)
    }

    /// `(variable, coefficient)` pairs in ascending variable order.
    pub fn terms(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.coefficients.iter().map(|(&v, &c)| (v, c))
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.coefficients.keys().copied()
    }

    pub(crate) fn set(&mut self, variable: Variable, coefficient: f64) {
        self.coefficients.insert(variable, coefficient);
    }

    /// Replace `variable` by the right-hand side of `row`, whose basic variable it is.
    ///
    /// Reads only `self` and `row`, so every row can be rewritten against the
    /// same pivot row without observing another row's update.
    pub(crate) fn substitute(&mut self, variable: Variable, row: &Row) {
        let a = self.coefficients.remove(&variable).unwrap_or(0.0);
        self.scalar += row.scalar() * a;
        // Keys are inserted even when `a` is zero so that every expression keeps
        // the full non-basic set.
        for (v, c) in row.expression.terms() {
            *self.coefficients.entry(v).or_insert(0.0) += c * a;
        }
    }
}

/// One constraint equation: `basic = scalar + sum(coefficient_v * x_v)`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    basic: Variable,
    expression: Expression,
}

impl Row {
    pub fn new(basic: Variable, expression: Expression) -> Self {
        Self { basic, expression }
    }

    pub fn basic(&self) -> Variable {
        self.basic
    }

    pub fn scalar(&self) -> f64 {
        self.expression.scalar()
    }

    pub fn coefficient(&self, variable: Variable) -> f64 {
        self.expression.coefficient(variable)
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub(crate) fn expression_mut(&mut self) -> &mut Expression {
        &mut self.expression
    }
}

/// The solver state: one row per constraint plus the objective `z`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    rows: Vec<Row>,
    objective: Expression,
    num_decision: usize,
}

impl Dictionary {
    /// Build the initial dictionary `slack_i = b_i - sum_j A_ij x_j`, `z = sum_j c_j x_j`.
    pub fn new(problem: &Problem) -> Result<Self, ProblemError> {
        problem.validate()?;

        let n = problem.num_variables();
        let rows = problem
            .constraints
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mut expression = Expression::new(c.rhs);
                for (j, &a) in c.coefficients.iter().enumerate() {
                    expression.set(j, -a);
                }
                Row::new(n + i, expression)
            })
            .collect();

        let mut objective = Expression::new(0.0);
        for (j, &c) in problem.objective.iter().enumerate() {
            objective.set(j, c);
        }

        Ok(Self {
            rows,
            objective,
            num_decision: n,
        })
    }

    pub fn num_decision_variables(&self) -> usize {
        self.num_decision
    }

    pub fn num_constraints(&self) -> usize {
        self.rows.len()
    }

    pub fn num_variables(&self) -> usize {
        self.num_decision + self.rows.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    pub(crate) fn objective_mut(&mut self) -> &mut Expression {
        &mut self.objective
    }

    /// Current objective value.
    pub fn objective_value(&self) -> f64 {
        self.objective.scalar()
    }

    /// Position of the row whose basic variable is `variable`.
    pub fn row_of(&self, variable: Variable) -> Option<usize> {
        self.rows.iter().position(|r| r.basic == variable)
    }

    pub fn is_basic(&self, variable: Variable) -> bool {
        self.row_of(variable).is_some()
    }

    /// Value of `variable` in the current basic solution: its row's scalar if
    /// basic, zero otherwise.
    pub fn value(&self, variable: Variable) -> f64 {
        self.row_of(variable).map(|i| self.rows[i].scalar()).unwrap_or(0.0)
    }

    pub fn decision_values(&self) -> Vec<f64> {
        self.values_in(0..self.num_decision)
    }

    pub fn slack_values(&self) -> Vec<f64> {
        self.values_in(self.num_decision..self.num_variables())
    }

    fn values_in(&self, range: std::ops::Range<Variable>) -> Vec<f64> {
        let mut values = vec![0.0; range.len()];
        for row in &self.rows {
            if range.contains(&row.basic) {
                values[row.basic - range.start] = row.scalar();
            }
        }
        values
    }

    /// Basic variable of each row, in row order.
    pub fn basis(&self) -> Vec<Variable> {
        self.rows.iter().map(|r| r.basic).collect()
    }

    /// Verify the structural invariants of a feasible dictionary.
    pub fn check_invariants(&self, tolerance: f64) -> Result<(), String> {
        let total = self.num_variables();
        let mut basic = BTreeSet::new();

        for row in &self.rows {
            if row.basic >= total {
                return Err(format!("basic variable x{} out of range", row.basic));
            }
            if !basic.insert(row.basic) {
                return Err(format!("x{} is basic in more than one row", row.basic));
            }
            if row.expression.contains(row.basic) {
                return Err(format!("x{} appears in its own row", row.basic));
            }
            if row.scalar() < -tolerance {
                return Err(format!("x{} = {} is infeasible", row.basic, row.scalar()));
            }
        }

        let nonbasic: BTreeSet<Variable> = self.objective.variables().collect();
        if let Some(v) = basic.intersection(&nonbasic).next() {
            return Err(format!("x{} is both basic and in the objective", v));
        }
        if basic.len() + nonbasic.len() != total || nonbasic.iter().any(|&v| v >= total) {
            return Err("basic and non-basic variables do not cover every variable".to_string());
        }

        for row in &self.rows {
            if let Some(v) = row.expression.variables().find(|v| basic.contains(v)) {
                return Err(format!("basic x{} appears in the row of x{}", v, row.basic));
            }
        }

        Ok(())
    }
}

const ZERO_WIDTH: f64 = 1e-10;

fn write_terms(f: &mut fmt::Formatter<'_>, expression: &Expression) -> fmt::Result {
    for (variable, coefficient) in expression.terms() {
        if coefficient.abs() <= ZERO_WIDTH {
            write!(f, "          ")?;
        } else if coefficient > 0.0 {
            write!(f, "+ {:.2} x{} ", coefficient, variable)?;
        } else {
            write!(f, "- {:.2} x{} ", -coefficient, variable)?;
        }
    }
    Ok(())
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            write!(f, "\tx{} = {:.2} ", row.basic, row.scalar())?;
            write_terms(f, &row.expression)?;
            writeln!(f)?;
        }
        write!(f, "\n\tz  = {:.2} ", self.objective.scalar())?;
        write_terms(f, &self.objective)?;
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_problem() -> Problem {
        // maximize 3x + 2y
        //   x + y <= 4
        //   x     <= 3
        Problem::from_dense(&[1.0, 1.0, 1.0, 0.0], &[4.0, 3.0], &[3.0, 2.0]).unwrap()
    }

    #[test]
    fn test_initial_dictionary_uses_slack_basis() {
        let dictionary = Dictionary::new(&small_problem()).unwrap();

        assert_eq!(dictionary.basis(), vec![2, 3]);
        assert_eq!(dictionary.rows()[0].scalar(), 4.0);
        assert_eq!(dictionary.rows()[0].coefficient(0), -1.0);
        assert_eq!(dictionary.rows()[1].coefficient(1), 0.0);
        assert_eq!(dictionary.objective().coefficient(0), 3.0);
        assert_eq!(dictionary.objective_value(), 0.0);
        assert!(dictionary.check_invariants(1e-9).is_ok());
    }

    #[test]
    fn test_slacks_never_appear_in_rows() {
        let dictionary = Dictionary::new(&small_problem()).unwrap();
        for row in dictionary.rows() {
            assert_eq!(row.expression().variables().collect::<Vec<_>>(), vec![0, 1]);
        }
    }

    #[test]
    fn test_values_read_from_basic_rows() {
        let dictionary = Dictionary::new(&small_problem()).unwrap();
        assert_eq!(dictionary.decision_values(), vec![0.0, 0.0]);
        assert_eq!(dictionary.slack_values(), vec![4.0, 3.0]);
        assert_eq!(dictionary.value(3), 3.0);
        assert!(!dictionary.is_basic(0));
    }

    #[test]
    fn test_negative_rhs_rejected_at_construction() {
        let problem = Problem::from_dense(&[1.0], &[-1.0], &[1.0]).unwrap();
        assert!(matches!(
            Dictionary::new(&problem),
            Err(ProblemError::InfeasibleInput { row: 0, .. })
        ));
    }

    #[test]
    fn test_display_format() {
        let dictionary = Dictionary::new(&small_problem()).unwrap();
        let rendered = dictionary.to_string();
        let expected = "\tx2 = 4.00 - 1.00 x0 - 1.00 x1 \n\
                        \tx3 = 3.00 - 1.00 x0           \n\
                        \n\tz  = 0.00 + 3.00 x0 + 2.00 x1 \n";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_substitute_eliminates_variable() {
        // x2 = 4 - x0 - x1, substitute into z = 3 x0 + 2 x1 after solving for x0:
        // x0 = 4 - x1 - x2
        let mut solved = Expression::new(4.0);
        solved.set(1, -1.0);
        solved.set(2, -1.0);
        let row = Row::new(0, solved);

        let mut objective = Expression::new(0.0);
        objective.set(0, 3.0);
        objective.set(1, 2.0);
        objective.substitute(0, &row);

        assert!(!objective.contains(0));
        assert_eq!(objective.scalar(), 12.0);
        assert_eq!(objective.coefficient(1), -1.0);
        assert_eq!(objective.coefficient(2), -3.0);
    }

    #[test]
    fn test_invariant_violation_detected() {
        let mut dictionary = Dictionary::new(&small_problem()).unwrap();
        dictionary.objective_mut().set(2, 1.0);
        assert!(dictionary.check_invariants(1e-9).is_err());
    }
}
