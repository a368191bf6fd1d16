use thiserror::Error;

use crate::dictionary::{Dictionary, Variable};
use crate::pivot::{pivot, PivotError};
use crate::problem::{Problem, ProblemError};
use crate::rules::{self, EnteringRule};
use crate::solution::Solution;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Pivot(#[from] PivotError),
    #[error("No optimum reached after {0} iterations")]
    IterationLimit(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Optimal,
    /// `entering` has no blocking row.
    Unbounded { entering: Variable },
}

/// What a single call to [`Simplex::step`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Pivoted {
        iteration: usize,
        entering: Variable,
        leaving: Variable,
        ratio: f64,
    },
    Optimal,
    Unbounded {
        entering: Variable,
    },
}

/// The simplex iteration as an explicit state machine over one dictionary.
#[derive(Debug, Clone)]
pub struct Simplex {
    dictionary: Dictionary,
    state: State,
    iterations: usize,
    rule: EnteringRule,
    tolerance: f64,
}

impl Simplex {
    pub fn new(problem: &Problem, rule: EnteringRule, tolerance: f64) -> Result<Self, ProblemError> {
        Ok(Self::from_dictionary(Dictionary::new(problem)?, rule, tolerance))
    }

    /// Start from an arbitrary feasible dictionary.
    pub fn from_dictionary(dictionary: Dictionary, rule: EnteringRule, tolerance: f64) -> Self {
        Self {
            dictionary,
            state: State::Running,
            iterations: 0,
            rule,
            tolerance,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Number of pivots performed so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Advance by one transition. A terminal machine reports its terminal step
    /// again and does not change.
    pub fn step(&mut self) -> Result<Step, PivotError> {
        match self.state {
            State::Optimal => return Ok(Step::Optimal),
            State::Unbounded { entering } => return Ok(Step::Unbounded { entering }),
            State::Running => {}
        }

        let Some(entering) = self.entering() else {
            self.state = State::Optimal;
            log::info!(
                "optimal after {} iterations, objective {}",
                self.iterations,
                self.dictionary.objective_value()
            );
            return Ok(Step::Optimal);
        };

        let Some(leaving) = rules::leaving_variable(&self.dictionary, entering, self.tolerance) else {
            self.state = State::Unbounded { entering };
            log::info!("unbounded: x{} can grow without limit", entering);
            return Ok(Step::Unbounded { entering });
        };

        pivot(&mut self.dictionary, entering, leaving.variable, self.tolerance)?;
        self.iterations += 1;

        log::debug!(
            "iteration {}: x{} enters, x{} leaves (ratio {}), objective {}",
            self.iterations,
            entering,
            leaving.variable,
            leaving.ratio,
            self.dictionary.objective_value()
        );
        log::trace!("dictionary after iteration {}:\n{}", self.iterations, self.dictionary);

        Ok(Step::Pivoted {
            iteration: self.iterations,
            entering,
            leaving: leaving.variable,
            ratio: leaving.ratio,
        })
    }

    /// Whether the next [`Simplex::step`] would perform a pivot rather than
    /// reach a terminal state.
    pub fn will_pivot(&self) -> bool {
        self.state == State::Running
            && self
                .entering()
                .and_then(|entering| rules::leaving_variable(&self.dictionary, entering, self.tolerance))
                .is_some()
    }

    fn entering(&self) -> Option<Variable> {
        if rules::is_optimal(&self.dictionary, self.tolerance) {
            return None;
        }
        rules::entering_variable(&self.dictionary, self.rule, self.tolerance)
    }

    /// The terminal result, or `None` while still running.
    pub fn solution(&self) -> Option<Solution> {
        match self.state {
            State::Optimal => Some(Solution::optimal(&self.dictionary, self.iterations)),
            State::Unbounded { entering } => Some(Solution::unbounded(entering, self.iterations)),
            State::Running => None,
        }
    }
}

/// Dictionary simplex solver for standard-form problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum iterations before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Entering variable selection
    rule: EnteringRule,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            rule: EnteringRule::Dantzig,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_rule(mut self, rule: EnteringRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solve the problem, pivoting until optimal or unbounded
    pub fn solve(&self, problem: &Problem) -> Result<Solution, SolveError> {
        self.solve_with(problem, |_, _| {})
    }

    /// Like [`Solver::solve`], calling `observer` after every step.
    pub fn solve_with<F>(&self, problem: &Problem, mut observer: F) -> Result<Solution, SolveError>
    where
        F: FnMut(&Simplex, &Step),
    {
        let mut simplex = Simplex::new(problem, self.rule, self.tolerance)?;
        log::debug!(
            "solving {} variables, {} constraints with {:?}",
            problem.num_variables(),
            problem.num_constraints(),
            self.rule
        );

        loop {
            // The cap only stops pivots; a terminal dictionary is still classified.
            if simplex.iterations() >= self.max_iterations && simplex.will_pivot() {
                log::warn!("giving up after {} iterations", self.max_iterations);
                return Err(SolveError::IterationLimit(self.max_iterations));
            }

            let step = simplex.step()?;
            observer(&simplex, &step);

            if let Some(solution) = simplex.solution() {
                return Ok(solution);
            }
        }
    }
}
