use super::scc::strongly_connected_components;
use crate::logic::{Formula, Proposition};
use anyhow::{anyhow, Result};
use std::collections::HashMap;

/// The identifier of an automaton state: its index in the automaton.
pub type StateId = usize;

/// A universal co-Büchi automaton over input and output propositions.
///
/// The automaton accepts the traces which satisfy the safety conditions of the visited states
/// and visit the rejecting states only finitely often.
/// Automata are built through [`AutomatonBuilder`]; they are immutable afterwards.
#[derive(Debug, Clone)]
pub struct Automaton {
    inputs: Vec<Proposition>,
    outputs: Vec<Proposition>,
    names: Vec<String>,
    name_to_id: HashMap<String, StateId>,
    initial: Vec<bool>,
    rejecting: Vec<bool>,
    safety: Vec<Option<Formula>>,
    transitions: Vec<Vec<(StateId, Formula)>>,
    components: Vec<usize>,
    non_rejecting_components: Vec<bool>,
}

impl Automaton {
    /// Returns the input propositions.
    pub fn inputs(&self) -> &[Proposition] {
        &self.inputs
    }

    /// Returns the output propositions.
    pub fn outputs(&self) -> &[Proposition] {
        &self.outputs
    }

    /// Returns the number of states.
    pub fn n_states(&self) -> usize {
        self.names.len()
    }

    /// Returns the number of transitions.
    pub fn n_transitions(&self) -> usize {
        self.transitions.iter().map(|t| t.len()).sum()
    }

    /// Iterates over the state ids.
    pub fn states(&self) -> impl Iterator<Item = StateId> {
        0..self.names.len()
    }

    /// Returns the name of a state.
    pub fn state_name(&self, q: StateId) -> &str {
        &self.names[q]
    }

    /// Returns the id of the state with the given name.
    pub fn state_id(&self, name: &str) -> Result<StateId> {
        self.name_to_id
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("no such state: {}", name))
    }

    /// Iterates over the initial states.
    pub fn initial_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states().filter(|q| self.initial[*q])
    }

    /// Returns `true` iff the state is initial.
    pub fn is_initial(&self, q: StateId) -> bool {
        self.initial[q]
    }

    /// Iterates over the rejecting states.
    pub fn rejecting_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states().filter(|q| self.rejecting[*q])
    }

    /// Returns `true` iff the state is rejecting.
    pub fn is_rejecting(&self, q: StateId) -> bool {
        self.rejecting[q]
    }

    /// Returns the safety condition of a state, if any.
    ///
    /// A missing safety condition is equivalent to `true`.
    pub fn safety_condition(&self, q: StateId) -> Option<&Formula> {
        self.safety[q].as_ref()
    }

    /// Returns the outgoing transitions of a state as pairs (target, guard).
    pub fn transitions_from(&self, q: StateId) -> &[(StateId, Formula)] {
        &self.transitions[q]
    }

    /// Iterates over all the transitions as triplets (source, target, guard).
    pub fn iter_transitions(&self) -> impl Iterator<Item = (StateId, StateId, &Formula)> + '_ {
        self.transitions
            .iter()
            .enumerate()
            .flat_map(|(q, ts)| ts.iter().map(move |(t, g)| (q, *t, g)))
    }

    /// Returns `true` iff both states belong to the same strongly connected component.
    pub fn is_in_same_scc(&self, q: StateId, q_prime: StateId) -> bool {
        self.components[q] == self.components[q_prime]
    }

    /// Returns `true` iff the state belongs to a strongly connected component without rejecting states.
    pub fn is_in_non_rejecting_scc(&self, q: StateId) -> bool {
        self.non_rejecting_components[self.components[q]]
    }

    /// Returns the number of strongly connected components.
    pub fn n_sccs(&self) -> usize {
        self.non_rejecting_components.len()
    }
}

/// A builder for [`Automaton`] objects.
///
/// States are referred to by their names; the strongly connected components are computed by [`AutomatonBuilder::build`].
///
/// # Example
///
/// ```
/// # use boundsyn::automaton::AutomatonBuilder;
/// # use boundsyn::logic::Formula;
/// let mut builder = AutomatonBuilder::new(vec!["r".into()], vec!["g".into()]);
/// builder.new_state("q0").unwrap();
/// builder.set_initial("q0").unwrap();
/// builder.new_transition("q0", "q0", Formula::TRUE).unwrap();
/// let automaton = builder.build();
/// assert_eq!(1, automaton.n_states());
/// assert!(automaton.is_in_non_rejecting_scc(0));
/// ```
#[derive(Debug, Default)]
pub struct AutomatonBuilder {
    inputs: Vec<Proposition>,
    outputs: Vec<Proposition>,
    names: Vec<String>,
    name_to_id: HashMap<String, StateId>,
    initial: Vec<bool>,
    rejecting: Vec<bool>,
    safety: Vec<Option<Formula>>,
    transitions: Vec<Vec<(StateId, Formula)>>,
}

impl AutomatonBuilder {
    /// Creates a builder for an automaton over the given propositions.
    pub fn new(inputs: Vec<Proposition>, outputs: Vec<Proposition>) -> Self {
        Self {
            inputs,
            outputs,
            ..Default::default()
        }
    }

    /// Adds a new state.
    ///
    /// An error is returned if a state with the same name already exists.
    pub fn new_state(&mut self, name: &str) -> Result<StateId> {
        if self.name_to_id.contains_key(name) {
            return Err(anyhow!("state {} is defined multiple times", name));
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.name_to_id.insert(name.to_string(), id);
        self.initial.push(false);
        self.rejecting.push(false);
        self.safety.push(None);
        self.transitions.push(vec![]);
        Ok(id)
    }

    fn id_of(&self, name: &str) -> Result<StateId> {
        self.name_to_id
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("no such state: {}", name))
    }

    /// Sets a state as initial; returns `false` if it already was.
    pub fn set_initial(&mut self, name: &str) -> Result<bool> {
        let id = self.id_of(name)?;
        Ok(!std::mem::replace(&mut self.initial[id], true))
    }

    /// Sets a state as rejecting; returns `false` if it already was.
    pub fn set_rejecting(&mut self, name: &str) -> Result<bool> {
        let id = self.id_of(name)?;
        Ok(!std::mem::replace(&mut self.rejecting[id], true))
    }

    /// Adds a safety condition to a state.
    ///
    /// Multiple safety conditions for the same state are conjoined.
    pub fn add_safety_condition(&mut self, name: &str, condition: Formula) -> Result<()> {
        let id = self.id_of(name)?;
        let new_condition = match self.safety[id].take() {
            Some(c) => Formula::and([c, condition]),
            None => condition,
        };
        self.safety[id] = Some(new_condition);
        Ok(())
    }

    /// Adds a guarded transition between two states.
    pub fn new_transition(&mut self, from: &str, to: &str, guard: Formula) -> Result<()> {
        let from_id = self.id_of(from)?;
        let to_id = self.id_of(to)?;
        self.transitions[from_id].push((to_id, guard));
        Ok(())
    }

    /// Returns the input propositions.
    pub fn inputs(&self) -> &[Proposition] {
        &self.inputs
    }

    /// Returns the output propositions.
    pub fn outputs(&self) -> &[Proposition] {
        &self.outputs
    }

    /// Builds the automaton, computing its strongly connected components.
    pub fn build(self) -> Automaton {
        let successors = self
            .transitions
            .iter()
            .map(|ts| ts.iter().map(|(t, _)| *t).collect())
            .collect::<Vec<Vec<usize>>>();
        let components = strongly_connected_components(&successors);
        let n_components = components.iter().map(|c| c + 1).max().unwrap_or(0);
        let mut non_rejecting_components = vec![true; n_components];
        components
            .iter()
            .zip(self.rejecting.iter())
            .filter(|(_, r)| **r)
            .for_each(|(c, _)| non_rejecting_components[*c] = false);
        Automaton {
            inputs: self.inputs,
            outputs: self.outputs,
            names: self.names,
            name_to_id: self.name_to_id,
            initial: self.initial,
            rejecting: self.rejecting,
            safety: self.safety,
            transitions: self.transitions,
            components,
            non_rejecting_components,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scc_automaton() -> Automaton {
        let mut builder = AutomatonBuilder::new(vec!["i".into()], vec!["o".into()]);
        for q in ["q0", "q1", "q2", "q3"] {
            builder.new_state(q).unwrap();
        }
        builder.set_initial("q0").unwrap();
        builder.set_rejecting("q2").unwrap();
        builder.new_transition("q0", "q1", Formula::TRUE).unwrap();
        builder.new_transition("q1", "q2", Formula::atom("i")).unwrap();
        builder.new_transition("q2", "q1", Formula::TRUE).unwrap();
        builder
            .new_transition("q2", "q3", Formula::not(Formula::atom("i")))
            .unwrap();
        builder.new_transition("q3", "q3", Formula::TRUE).unwrap();
        builder.build()
    }

    #[test]
    fn test_sccs() {
        let automaton = scc_automaton();
        assert_eq!(3, automaton.n_sccs());
        assert!(automaton.is_in_same_scc(1, 2));
        assert!(!automaton.is_in_same_scc(0, 1));
        assert!(!automaton.is_in_same_scc(2, 3));
        assert!(automaton.is_in_non_rejecting_scc(0));
        assert!(!automaton.is_in_non_rejecting_scc(1));
        assert!(!automaton.is_in_non_rejecting_scc(2));
        assert!(automaton.is_in_non_rejecting_scc(3));
    }

    #[test]
    fn test_accessors() {
        let automaton = scc_automaton();
        assert_eq!(4, automaton.n_states());
        assert_eq!(5, automaton.n_transitions());
        assert_eq!(vec![0], automaton.initial_states().collect::<Vec<_>>());
        assert_eq!(vec![2], automaton.rejecting_states().collect::<Vec<_>>());
        assert_eq!(2, automaton.state_id("q2").unwrap());
        assert_eq!("q3", automaton.state_name(3));
        assert!(automaton.state_id("q4").is_err());
        assert_eq!(2, automaton.transitions_from(2).len());
        assert!(automaton.safety_condition(0).is_none());
    }

    #[test]
    fn test_duplicate_state() {
        let mut builder = AutomatonBuilder::new(vec![], vec![]);
        builder.new_state("q0").unwrap();
        assert!(builder.new_state("q0").is_err());
    }

    #[test]
    fn test_unknown_state_in_transition() {
        let mut builder = AutomatonBuilder::new(vec![], vec![]);
        builder.new_state("q0").unwrap();
        assert!(builder.new_transition("q0", "q1", Formula::TRUE).is_err());
    }

    #[test]
    fn test_flags_twice() {
        let mut builder = AutomatonBuilder::new(vec![], vec![]);
        builder.new_state("q0").unwrap();
        assert!(builder.set_initial("q0").unwrap());
        assert!(!builder.set_initial("q0").unwrap());
    }

    #[test]
    fn test_safety_conditions_are_conjoined() {
        let mut builder = AutomatonBuilder::new(vec![], vec!["a".into(), "b".into()]);
        builder.new_state("q0").unwrap();
        builder
            .add_safety_condition("q0", Formula::atom("a"))
            .unwrap();
        builder
            .add_safety_condition("q0", Formula::atom("b"))
            .unwrap();
        let automaton = builder.build();
        assert_eq!(
            Some(&Formula::and([Formula::atom("a"), Formula::atom("b")])),
            automaton.safety_condition(0)
        );
    }
}
