//! Synthesis problems: an automaton, a semantics and example scenarios.

use crate::{
    automaton::Automaton,
    logic::Proposition,
    scenarios::{ScenarioBranch, ScenarioTrie},
};
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// The kind of implementation to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Semantics {
    /// Outputs depend on the current state and the current inputs.
    Mealy,
    /// Outputs depend on the current state only.
    Moore,
}

/// A synthesis problem: an automaton, the semantics of the implementation and optional scenarios.
#[derive(Debug, Clone)]
pub struct Specification {
    automaton: Automaton,
    semantics: Semantics,
    scenarios: ScenarioTrie,
}

impl Specification {
    /// Builds a specification without scenarios.
    pub fn new(automaton: Automaton, semantics: Semantics) -> Self {
        Self::new_with_scenarios(automaton, semantics, &[])
    }

    /// Builds a specification with scenarios the implementation must be able to produce.
    pub fn new_with_scenarios(
        automaton: Automaton,
        semantics: Semantics,
        scenarios: &[Vec<ScenarioBranch>],
    ) -> Self {
        Self {
            automaton,
            semantics,
            scenarios: ScenarioTrie::new(scenarios),
        }
    }

    /// Returns the automaton.
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Returns the semantics of the implementation.
    pub fn semantics(&self) -> Semantics {
        self.semantics
    }

    /// Returns the scenario trie.
    pub fn scenarios(&self) -> &ScenarioTrie {
        &self.scenarios
    }

    /// Returns the input propositions.
    pub fn inputs(&self) -> &[Proposition] {
        self.automaton.inputs()
    }

    /// Returns the output propositions.
    pub fn outputs(&self) -> &[Proposition] {
        self.automaton.outputs()
    }
}
