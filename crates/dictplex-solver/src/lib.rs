//! Revised (dictionary) simplex method for standard-form linear programs:
//! maximize `c·x` subject to `A x <= b`, `x >= 0`, with `b >= 0`.

mod dictionary;
mod pivot;
mod problem;
pub mod rules;
mod simplex;
mod solution;

pub use dictionary::{Dictionary, Expression, Row, Variable};
pub use pivot::{pivot, PivotError};
pub use problem::{Constraint, Problem, ProblemError};
pub use rules::{EnteringRule, Leaving};
pub use simplex::{Simplex, SolveError, Solver, State, Step};
pub use solution::{Solution, SolutionStatus};
