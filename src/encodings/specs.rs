use super::{ExplicitEncoder, InputSymbolicEncoder, SymbolicEncoder};
use crate::{
    logic::{Formula, Proposition, Valuation},
    specification::Specification,
    synthesis::Solution,
    SynthesisError,
};
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// The available encodings of bounded synthesis problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum EncodingKind {
    /// Explicit states and input valuations; produces SAT instances.
    Explicit,
    /// Binary encoded states and functions of the inputs; produces dependency-QBF instances.
    Symbolic,
    /// Explicit states, universally quantified inputs; produces QBF instances.
    InputSymbolic,
}

/// The trait for encoders of bounded synthesis problems.
pub trait SynthesisEncoder {
    /// Returns the kind of this encoding.
    fn kind(&self) -> EncodingKind;

    /// Encodes the existence of an implementation with `bound` states.
    ///
    /// The returned formula is closed and its comparisons are expanded.
    fn encode(&self, bound: usize) -> Result<Formula, SynthesisError>;

    /// Translates back a valuation of the variables of the encoding into an implementation.
    fn extract_solution(
        &self,
        bound: usize,
        valuation: &Valuation,
    ) -> Result<Solution, SynthesisError>;
}

/// Builds the encoder of the given kind for a specification.
pub fn new_encoder(kind: EncodingKind, specification: &Specification) -> Box<dyn SynthesisEncoder + '_> {
    match kind {
        EncodingKind::Explicit => Box::new(ExplicitEncoder::new(specification)),
        EncodingKind::Symbolic => Box::new(SymbolicEncoder::new(specification)),
        EncodingKind::InputSymbolic => Box::new(InputSymbolicEncoder::new(specification)),
    }
}

/// Expands the comparisons of an encoded formula and checks it is closed.
pub(crate) fn finalize(formula: Formula, ranking_bits: usize) -> Result<Formula, SynthesisError> {
    let expanded = formula.expand_comparisons(ranking_bits)?;
    let free = expanded.free_variables();
    if !free.is_empty() {
        let mut names = free.iter().map(|p| p.name()).collect::<Vec<&str>>();
        names.sort_unstable();
        return Err(SynthesisError::EncodingFailed(format!(
            "free variables in encoded formula: {}",
            names.join(", ")
        )));
    }
    Ok(expanded)
}

/// Returns the value of a proposition assigned by a valuation.
///
/// Propositions occurring in no constraint may be left unassigned by solvers; they are read as `false`.
pub(crate) fn assigned_value(valuation: &Valuation, p: &Proposition) -> bool {
    valuation
        .get(p)
        .map(|f| f.as_constant() == Some(true))
        .unwrap_or(false)
}

/// Returns the function associated with a proposition by a valuation (`false` if it is unassigned).
pub(crate) fn assigned_function(valuation: &Valuation, p: &Proposition) -> Formula {
    valuation.get(p).cloned().unwrap_or(Formula::FALSE)
}
