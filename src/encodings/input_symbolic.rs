use super::{
    naming,
    ranking::{ranking_bits, successor_requirement},
    specs::{assigned_function, finalize},
    EncodingKind, SynthesisEncoder,
};
use crate::{
    automaton::StateId,
    logic::{ranking_bit, Formula, QuantifierKind, Valuation},
    specification::{Semantics, Specification},
    synthesis::{satisfiable_guard, Solution},
    SynthesisError,
};
use log::debug;

/// The input-symbolic encoding: implementation states are explicit while inputs are universally quantified.
///
/// Transitions and outputs are existential variables quantified under the inputs, so that solutions assign them functions of the inputs.
/// Under Moore semantics, outputs are quantified before the inputs.
pub struct InputSymbolicEncoder<'a> {
    specification: &'a Specification,
}

impl<'a> InputSymbolicEncoder<'a> {
    /// Builds an input-symbolic encoder for a specification.
    pub fn new(specification: &'a Specification) -> Self {
        Self { specification }
    }

    fn rename_outputs(&self, f: &Formula, s: usize) -> Formula {
        let outputs = self.specification.outputs();
        f.replace(&|p| {
            if outputs.contains(p) {
                Some(Formula::Atom(naming::moore_output(p, s)))
            } else {
                None
            }
        })
    }

    fn lambda_constraint(&self, bound: usize, s: usize, q: StateId) -> Formula {
        let automaton = self.specification.automaton();
        let source_ranking = Formula::indexed(naming::lambda_ranking(s, q), vec![]);
        let safety = automaton
            .safety_condition(q)
            .map(|c| self.rename_outputs(c, s))
            .unwrap_or(Formula::TRUE);
        let successors = automaton.transitions_from(q).iter().map(|(q_prime, guard)| {
            let requirement = Formula::and((0..bound).map(|t| {
                Formula::implies(
                    Formula::atom(naming::transition(s, t)),
                    successor_requirement(
                        automaton,
                        q,
                        *q_prime,
                        Formula::atom(naming::lambda(t, *q_prime)),
                        &source_ranking,
                        Formula::indexed(naming::lambda_ranking(t, *q_prime), vec![]),
                    ),
                )
            }));
            Formula::implies(self.rename_outputs(guard, s), requirement)
        });
        Formula::implies(
            Formula::atom(naming::lambda(s, q)),
            Formula::and(std::iter::once(safety).chain(successors)),
        )
    }

    fn scenario_constraints(&self, bound: usize) -> Vec<Formula> {
        let trie = self.specification.scenarios();
        let inputs = self.specification.inputs();
        let outputs = self.specification.outputs();
        let mut constraints = trie
            .node_ids()
            .map(|j| Formula::or((0..bound).map(|s| Formula::atom(naming::coverage(s, j)))))
            .collect::<Vec<Formula>>();
        for s in 0..bound {
            for j in trie.node_ids() {
                let branches = trie.children(j).map(|(branch, j_prime)| {
                    let outputs_match = branch
                        .outputs_match(outputs, &|o| Formula::Atom(naming::moore_output(o, s)));
                    let successor = Formula::or((0..bound).map(|t| {
                        Formula::and([
                            Formula::atom(naming::transition(s, t)),
                            Formula::atom(naming::coverage(t, j_prime)),
                        ])
                    }));
                    Formula::implies(
                        branch.inputs_match(inputs),
                        Formula::and([outputs_match, successor]),
                    )
                });
                constraints.push(Formula::implies(
                    Formula::atom(naming::coverage(s, j)),
                    Formula::and(branches),
                ));
            }
        }
        constraints
    }
}

impl SynthesisEncoder for InputSymbolicEncoder<'_> {
    fn kind(&self) -> EncodingKind {
        EncodingKind::InputSymbolic
    }

    fn encode(&self, bound: usize) -> Result<Formula, SynthesisError> {
        let automaton = self.specification.automaton();
        let trie = self.specification.scenarios();
        let n_bits = ranking_bits(automaton, bound);
        let mut constraints = vec![];
        if !trie.is_empty() {
            constraints.append(&mut self.scenario_constraints(bound));
        }
        for s in 0..bound {
            constraints.push(Formula::or(
                (0..bound).map(|t| Formula::atom(naming::transition(s, t))),
            ));
            for q in automaton.states() {
                constraints.push(self.lambda_constraint(bound, s, q));
            }
        }
        let mut lambdas = vec![];
        let mut coverage = vec![];
        let mut transitions = vec![];
        let mut outputs = vec![];
        for s in 0..bound {
            for q in automaton.states() {
                lambdas.push(naming::lambda(s, q));
                let family = naming::lambda_ranking(s, q);
                lambdas.extend((0..n_bits).map(|k| ranking_bit(&family, k)));
            }
            if !trie.is_empty() {
                coverage.extend(trie.node_ids().map(|j| naming::coverage(s, j)));
            }
            transitions.extend((0..bound).map(|t| naming::transition(s, t)));
            outputs.extend(
                self.specification
                    .outputs()
                    .iter()
                    .map(|o| naming::moore_output(o, s)),
            );
        }
        let (outer, inner) = match self.specification.semantics() {
            Semantics::Mealy => (
                [lambdas, coverage].concat(),
                [transitions, outputs].concat(),
            ),
            Semantics::Moore => ([lambdas, outputs, coverage].concat(), transitions),
        };
        let matrix = Formula::and(constraints);
        let formula = Formula::quantified(
            QuantifierKind::Exists,
            outer,
            None,
            Formula::quantified(
                QuantifierKind::Forall,
                self.specification.inputs().to_vec(),
                None,
                Formula::quantified(QuantifierKind::Exists, inner, None, matrix),
            ),
        );
        let mut initial = Valuation::default();
        automaton.initial_states().for_each(|q| {
            initial.insert(naming::lambda(0, q), Formula::TRUE);
        });
        if !trie.is_empty() {
            initial.insert(naming::coverage(0, trie.root()), Formula::TRUE);
        }
        debug!(
            "input-symbolic encoding for bound {}: {} ranking bits",
            bound, n_bits
        );
        finalize(formula.eval(&initial), n_bits)
    }

    fn extract_solution(
        &self,
        bound: usize,
        valuation: &Valuation,
    ) -> Result<Solution, SynthesisError> {
        let inputs = self.specification.inputs();
        let outputs = self.specification.outputs();
        let mut solution = Solution::new(
            bound,
            self.specification.semantics(),
            inputs.to_vec(),
            outputs.to_vec(),
        );
        for s in 0..bound {
            for t in 0..bound {
                let function = assigned_function(valuation, &naming::transition(s, t));
                if let Some(guard) = satisfiable_guard(inputs, function) {
                    solution.add_transition(s, t, guard);
                }
            }
            for (k, o) in outputs.iter().enumerate() {
                solution.set_output_guard(
                    s,
                    k,
                    assigned_function(valuation, &naming::moore_output(o, s)),
                );
            }
        }
        Ok(solution)
    }
}
