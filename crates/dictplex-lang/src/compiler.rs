use std::collections::HashMap;
use std::path::Path;

use dictplex_solver::Problem;
use thiserror::Error;

use crate::ast::*;
use crate::parser::{ParseError, Parser};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Equality constraint {0} is not supported")]
    EqualityUnsupported(String),
    #[error("Duplicate constraint name: {0}")]
    DuplicateConstraint(String),
    #[error("Problem has no variables")]
    NoVariables,
}

/// Compiled representation of a problem ready for solving
#[derive(Debug, Clone)]
pub struct CompiledProblem {
    /// Optimization direction as written; the problem itself always maximizes
    pub sense: Sense,
    pub problem: Problem,
}

impl CompiledProblem {
    /// Objective value in the direction the source asked for.
    pub fn reported_objective(&self, solver_value: f64) -> f64 {
        match self.sense {
            Sense::Maximize => solver_value,
            Sense::Minimize => -solver_value,
        }
    }
}

/// Compiler for converting the AST into a standard-form problem
#[derive(Debug, Default)]
pub struct Compiler {
    /// Variable name to column, in order of first appearance
    columns: HashMap<String, usize>,
    variables: Vec<String>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and compile a source string
    pub fn compile_source(source: &str) -> Result<CompiledProblem, CompileError> {
        let program = Parser::parse(source)?;
        Compiler::new().compile(&program)
    }

    /// Read, parse and compile a file
    pub fn compile_file(path: impl AsRef<Path>) -> Result<CompiledProblem, CompileError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| CompileError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::compile_source(&source)
    }

    pub fn compile(mut self, program: &Program) -> Result<CompiledProblem, CompileError> {
        self.collect_variables(&program.objective.expr);
        for c in &program.constraints {
            self.collect_variables(&c.expr);
        }
        if self.variables.is_empty() {
            return Err(CompileError::NoVariables);
        }

        // Minimizing c·x is maximizing -c·x
        let sign = match program.objective.sense {
            Sense::Maximize => 1.0,
            Sense::Minimize => -1.0,
        };
        let objective: Vec<f64> = self.dense(&program.objective.expr).into_iter().map(|c| sign * c).collect();

        let mut problem = Problem::new(self.variables.clone());
        problem.set_objective(objective);

        let mut seen = HashMap::new();
        for (i, c) in program.constraints.iter().enumerate() {
            let name = c.name.clone().unwrap_or_else(|| format!("c{}", i));
            if seen.insert(name.clone(), i).is_some() {
                return Err(CompileError::DuplicateConstraint(name));
            }

            let coefficients = self.dense(&c.expr);
            match c.op {
                Comparison::Le => problem.add_constraint(name, coefficients, c.rhs),
                // a·x >= r  <=>  -a·x <= -r
                Comparison::Ge => problem.add_constraint(
                    name,
                    coefficients.into_iter().map(|v| -v).collect(),
                    -c.rhs,
                ),
                Comparison::Eq => return Err(CompileError::EqualityUnsupported(name)),
            }
        }

        Ok(CompiledProblem {
            sense: program.objective.sense,
            problem,
        })
    }

    fn collect_variables(&mut self, expr: &LinearExpr) {
        for term in &expr.terms {
            if !self.columns.contains_key(&term.variable) {
                self.columns.insert(term.variable.clone(), self.variables.len());
                self.variables.push(term.variable.clone());
            }
        }
    }

    /// Dense coefficient vector; repeated variables accumulate.
    fn dense(&self, expr: &LinearExpr) -> Vec<f64> {
        let mut coefficients = vec![0.0; self.variables.len()];
        for term in &expr.terms {
            if let Some(&column) = self.columns.get(&term.variable) {
                coefficients[column] += term.coefficient;
            }
        }
        coefficients
    }
}
