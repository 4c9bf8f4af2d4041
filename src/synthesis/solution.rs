use crate::{
    logic::{minterm_of_index, valuation_of_index, Formula, Proposition},
    specification::Semantics,
    SynthesisError,
};

/// A transition system synthesized for a bound.
///
/// States are numbered from 0 (the initial state) to `bound - 1`.
/// Transitions and Mealy outputs are guarded by formulas over the inputs; Moore outputs are constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    semantics: Semantics,
    inputs: Vec<Proposition>,
    outputs: Vec<Proposition>,
    transitions: Vec<Vec<(usize, Formula)>>,
    output_guards: Vec<Vec<Formula>>,
}

impl Solution {
    pub(crate) fn new(
        bound: usize,
        semantics: Semantics,
        inputs: Vec<Proposition>,
        outputs: Vec<Proposition>,
    ) -> Self {
        let n_outputs = outputs.len();
        Self {
            semantics,
            inputs,
            outputs,
            transitions: vec![vec![]; bound],
            output_guards: vec![vec![Formula::FALSE; n_outputs]; bound],
        }
    }

    pub(crate) fn add_transition(&mut self, source: usize, target: usize, guard: Formula) {
        self.transitions[source].push((target, guard));
    }

    pub(crate) fn set_output_guard(&mut self, state: usize, output_index: usize, guard: Formula) {
        self.output_guards[state][output_index] = guard;
    }

    /// Returns the number of states.
    pub fn bound(&self) -> usize {
        self.transitions.len()
    }

    /// Returns the semantics of the system.
    pub fn semantics(&self) -> Semantics {
        self.semantics
    }

    /// Returns the input propositions.
    pub fn inputs(&self) -> &[Proposition] {
        &self.inputs
    }

    /// Returns the output propositions.
    pub fn outputs(&self) -> &[Proposition] {
        &self.outputs
    }

    /// Returns the outgoing transitions of a state, as pairs (target, guard).
    ///
    /// Transitions whose guard is unsatisfiable are omitted.
    pub fn transitions_from(&self, state: usize) -> &[(usize, Formula)] {
        &self.transitions[state]
    }

    /// Returns the guard under which an output is set in a state.
    pub fn output_guard(&self, state: usize, output_index: usize) -> &Formula {
        &self.output_guards[state][output_index]
    }

    /// Checks the system is complete: each input valuation enables at least one transition from each state.
    pub fn check_complete(&self) -> Result<(), SynthesisError> {
        for (s, transitions) in self.transitions.iter().enumerate() {
            for index in 0..(1 << self.inputs.len()) {
                let valuation = valuation_of_index(&self.inputs, index);
                if !transitions
                    .iter()
                    .any(|(_, g)| g.eval(&valuation).as_constant() == Some(true))
                {
                    return Err(SynthesisError::SolvingFailed(format!(
                        "state {} has no successor for input valuation {}",
                        s, index
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Builds a guard over the inputs from the set of input valuations (given by their indices) which enable it.
///
/// Returns `None` if no valuation enables the guard, `true` if all of them do, and otherwise the conjunction of the negated minterms of the disabled valuations.
pub(crate) fn guard_of_valuations(
    inputs: &[Proposition],
    enabled: &dyn Fn(usize) -> bool,
) -> Option<Formula> {
    let disabled = (0..(1 << inputs.len()))
        .filter(|i| !enabled(*i))
        .collect::<Vec<usize>>();
    if disabled.len() == 1 << inputs.len() {
        return None;
    }
    Some(Formula::and(
        disabled
            .into_iter()
            .map(|i| Formula::not(minterm_of_index(inputs, i))),
    ))
}

/// Simplifies a function over the inputs into `None` when it is false under every input valuation.
pub(crate) fn satisfiable_guard(inputs: &[Proposition], guard: Formula) -> Option<Formula> {
    let is_enabled = |i: usize| guard.eval(&valuation_of_index(inputs, i)).as_constant() == Some(true);
    if (0..(1 << inputs.len())).any(is_enabled) {
        Some(guard)
    } else {
        None
    }
}
