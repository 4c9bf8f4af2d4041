use crate::logic::{QuantifiedCnf, Valuation};
use anyhow::Result;

/// The result of a QBF (or DQBF) solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QbfSolvingResult {
    /// The formula is true.
    ///
    /// The valuation gives the values of the outermost existential variables returned by the solver,
    /// and the functions of the certificate if the solver produced one.
    Satisfiable(Valuation),
    /// The formula is false.
    Unsatisfiable,
    /// The solver gave up (timeout, memory limit, ...).
    Unknown,
}

impl QbfSolvingResult {
    /// Returns the valuation if the formula was proven true.
    pub fn unwrap_valuation(self) -> Option<Valuation> {
        match self {
            QbfSolvingResult::Satisfiable(valuation) => Some(valuation),
            _ => None,
        }
    }
}

/// A trait for solvers of quantified formulas in CNF.
///
/// The same interface is used for QBF solvers, dependency-QBF solvers and certifying solvers.
pub trait QbfSolver {
    /// Solves an instance, possibly through a preprocessor.
    fn solve(
        &self,
        instance: &QuantifiedCnf,
        preprocessor: Option<&dyn QbfPreprocessor>,
    ) -> Result<QbfSolvingResult>;
}

/// A trait for QBF preprocessors.
///
/// Preprocessors rewrite QDIMACS instances into equivalent ones.
/// They are expected to keep the numbering of the outermost existential variables.
pub trait QbfPreprocessor {
    /// Returns the preprocessed version of a QDIMACS instance.
    fn preprocess(&self, instance: String) -> Result<String>;
}
