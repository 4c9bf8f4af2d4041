use crate::logic::{Formula, Proposition};
use std::{collections::BTreeSet, fmt::Display};

/// One step of a scenario: the set of active inputs and the set of active outputs.
///
/// Propositions which are not in the sets are inactive.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScenarioBranch {
    inputs: BTreeSet<Proposition>,
    outputs: BTreeSet<Proposition>,
}

impl ScenarioBranch {
    /// Builds a branch from its active inputs and outputs.
    pub fn new<I, O>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator<Item = Proposition>,
        O: IntoIterator<Item = Proposition>,
    {
        Self {
            inputs: inputs.into_iter().collect(),
            outputs: outputs.into_iter().collect(),
        }
    }

    /// Parses a branch label of the form `in1,in2;out1,out2`.
    ///
    /// The label is split at its first `;`; a missing output part means no output is active.
    /// Empty components are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// # use boundsyn::scenarios::ScenarioBranch;
    /// let branch = ScenarioBranch::from_label("r1,r2;g1");
    /// assert_eq!(2, branch.inputs().len());
    /// assert_eq!(1, branch.outputs().len());
    /// ```
    pub fn from_label(label: &str) -> Self {
        let (inputs, outputs) = label.split_once(';').unwrap_or((label, ""));
        let split = |s: &str| {
            s.split(',')
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(Proposition::from)
                .collect::<BTreeSet<Proposition>>()
        };
        Self {
            inputs: split(inputs),
            outputs: split(outputs),
        }
    }

    /// Returns the active inputs.
    pub fn inputs(&self) -> &BTreeSet<Proposition> {
        &self.inputs
    }

    /// Returns the active outputs.
    pub fn outputs(&self) -> &BTreeSet<Proposition> {
        &self.outputs
    }

    /// Returns the index of the input valuation of this branch, input `k` being bit `k`.
    pub fn input_index(&self, inputs: &[Proposition]) -> usize {
        inputs
            .iter()
            .enumerate()
            .filter(|(_, i)| self.inputs.contains(i))
            .fold(0, |acc, (k, _)| acc | (1 << k))
    }

    /// Returns the conjunction of literals stating the inputs take the values of this branch.
    pub fn inputs_match(&self, inputs: &[Proposition]) -> Formula {
        literals_match(inputs, &self.inputs, &|p| Formula::Atom(p.clone()))
    }

    /// Returns the conjunction of literals stating the outputs take the values of this branch.
    ///
    /// The `output_term` function gives the formula standing for each output.
    pub fn outputs_match(
        &self,
        outputs: &[Proposition],
        output_term: &dyn Fn(&Proposition) -> Formula,
    ) -> Formula {
        literals_match(outputs, &self.outputs, output_term)
    }
}

fn literals_match(
    all: &[Proposition],
    active: &BTreeSet<Proposition>,
    term: &dyn Fn(&Proposition) -> Formula,
) -> Formula {
    Formula::and(all.iter().map(|p| {
        if active.contains(p) {
            term(p)
        } else {
            Formula::not(term(p))
        }
    }))
}

impl Display for ScenarioBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let join = |s: &BTreeSet<Proposition>| {
            s.iter()
                .map(|p| p.name())
                .collect::<Vec<&str>>()
                .join(",")
        };
        write!(f, "{};{}", join(&self.inputs), join(&self.outputs))
    }
}
