use super::{
    naming,
    ranking::{ranking_bits, ranking_comparison},
    specs::{assigned_function, finalize},
    EncodingKind, SynthesisEncoder,
};
use crate::{
    automaton::StateId,
    logic::{
        application_name, ranking_bit, valuation_of_index, Formula, Proposition,
        QuantifierKind, Valuation,
    },
    specification::{Semantics, Specification},
    synthesis::{satisfiable_guard, Solution},
    SynthesisError,
};
use log::debug;

/// The symbolic encoding: implementation states are binary encoded and every component of the system is a function of universally quantified variables.
///
/// The universal variables are, in this order, the current state bits, the inputs, the next state bits,
/// the indicators of the current automaton state and the indicators of the next automaton state.
/// Each existential family may only depend on a prefix of this order, which makes the result a dependency-QBF.
pub struct SymbolicEncoder<'a> {
    specification: &'a Specification,
}

/// Returns the number of bits needed to write the state indices of an implementation with `bound` states.
fn state_bits(bound: usize) -> usize {
    let mut n = 1;
    while (1 << n) < bound {
        n += 1;
    }
    n
}

/// Builds the formula stating the binary number written by `bits` equals `value`.
fn code_equals(bits: &[Formula], value: usize) -> Formula {
    Formula::and(bits.iter().enumerate().map(|(k, b)| {
        if (value >> k) & 1 == 1 {
            b.clone()
        } else {
            Formula::not(b.clone())
        }
    }))
}

impl<'a> SymbolicEncoder<'a> {
    /// Builds a symbolic encoder for a specification.
    pub fn new(specification: &'a Specification) -> Self {
        Self { specification }
    }

    fn state_vars(&self, k: usize) -> Vec<Proposition> {
        (0..k).map(naming::state_bit).collect()
    }

    fn next_state_vars(&self, k: usize) -> Vec<Proposition> {
        (0..k).map(naming::next_state_bit).collect()
    }

    fn automaton_vars(&self) -> Vec<Proposition> {
        self.specification
            .automaton()
            .states()
            .map(naming::automaton_state)
            .collect()
    }

    fn next_automaton_vars(&self) -> Vec<Proposition> {
        self.specification
            .automaton()
            .states()
            .map(naming::next_automaton_state)
            .collect()
    }

    fn output_args(&self, k: usize) -> Vec<Proposition> {
        match self.specification.semantics() {
            Semantics::Moore => self.state_vars(k),
            Semantics::Mealy => [self.state_vars(k), self.specification.inputs().to_vec()].concat(),
        }
    }

    fn transition_args(&self, k: usize) -> Vec<Proposition> {
        [self.state_vars(k), self.specification.inputs().to_vec()].concat()
    }

    fn universals(&self, k: usize) -> Vec<Proposition> {
        [
            self.state_vars(k),
            self.specification.inputs().to_vec(),
            self.next_state_vars(k),
            self.automaton_vars(),
            self.next_automaton_vars(),
        ]
        .concat()
    }

    fn with_outputs_applied(&self, f: &Formula, k: usize) -> Formula {
        let outputs = self.specification.outputs();
        let args = self.output_args(k);
        f.replace(&|p| {
            if outputs.contains(p) {
                Some(Formula::indexed(p.clone(), args.clone()))
            } else {
                None
            }
        })
    }

    /// The one-hot valuation of the automaton state indicators selecting `q`.
    fn is_automaton_state(&self, indicators: &[Proposition], q: StateId) -> Formula {
        Formula::and(indicators.iter().enumerate().map(|(j, p)| {
            if j == q {
                Formula::Atom(p.clone())
            } else {
                Formula::not(Formula::Atom(p.clone()))
            }
        }))
    }

    fn lambda_of(&self, indicators: &[Proposition], state: &[Proposition]) -> Formula {
        Formula::indexed(
            naming::lambda_family(),
            [indicators.to_vec(), state.to_vec()].concat(),
        )
    }

    fn ranking_of(&self, indicators: &[Proposition], state: &[Proposition]) -> Formula {
        Formula::indexed(
            naming::lambda_ranking_family(),
            [indicators.to_vec(), state.to_vec()].concat(),
        )
    }

    fn matrix(&self, bound: usize, k: usize) -> Formula {
        let automaton = self.specification.automaton();
        let s = self.state_vars(k);
        let sp = self.next_state_vars(k);
        let q = self.automaton_vars();
        let qp = self.next_automaton_vars();
        let atoms = |ps: &[Proposition]| ps.iter().cloned().map(Formula::Atom).collect::<Vec<_>>();
        let taus = (0..k)
            .map(|b| Formula::indexed(naming::transition_bit_family(b), self.transition_args(k)))
            .collect::<Vec<Formula>>();
        let mut preconditions = vec![];
        let mut constraints = vec![];
        for code in bound..(1 << k) {
            preconditions.push(Formula::not(code_equals(&atoms(&s), code)));
            preconditions.push(Formula::not(code_equals(&atoms(&sp), code)));
            constraints.push(Formula::not(code_equals(&taus, code)));
        }
        let initial = Formula::or(
            automaton
                .initial_states()
                .map(|q0| self.is_automaton_state(&q, q0)),
        );
        constraints.push(Formula::implies(
            Formula::and([code_equals(&atoms(&s), 0), initial]),
            self.lambda_of(&q, &s),
        ));
        let next_is_tau = Formula::and(
            atoms(&sp)
                .into_iter()
                .zip(taus.iter())
                .map(|(b, t)| Formula::iff(b, t.clone())),
        );
        for q_id in automaton.states() {
            let in_q = Formula::and([self.is_automaton_state(&q, q_id), self.lambda_of(&q, &s)]);
            if let Some(condition) = automaton.safety_condition(q_id) {
                constraints.push(Formula::implies(
                    in_q.clone(),
                    self.with_outputs_applied(condition, k),
                ));
            }
            for (q_prime, guard) in automaton.transitions_from(q_id) {
                let premise = Formula::and([
                    in_q.clone(),
                    self.is_automaton_state(&qp, *q_prime),
                    self.with_outputs_applied(guard, k),
                    next_is_tau.clone(),
                ]);
                let target = self.lambda_of(&qp, &sp);
                let conclusion = match ranking_comparison(automaton, q_id, *q_prime) {
                    Some(op) => Formula::and([
                        target,
                        Formula::compare(op, self.ranking_of(&qp, &sp), self.ranking_of(&q, &s)),
                    ]),
                    None => target,
                };
                constraints.push(Formula::implies(premise, conclusion));
            }
        }
        Formula::implies(Formula::and(preconditions), Formula::and(constraints))
    }
}

impl SynthesisEncoder for SymbolicEncoder<'_> {
    fn kind(&self) -> EncodingKind {
        EncodingKind::Symbolic
    }

    fn encode(&self, bound: usize) -> Result<Formula, SynthesisError> {
        let k = state_bits(bound);
        let n_bits = ranking_bits(self.specification.automaton(), bound);
        let universals = self.universals(k);
        let n_universals = universals.len();
        let n_inputs = self.specification.inputs().len();
        let output_arity = match self.specification.semantics() {
            Semantics::Moore => k,
            Semantics::Mealy => k + n_inputs,
        };
        let quantified = Formula::quantified(
            QuantifierKind::Forall,
            universals,
            None,
            self.matrix(bound, k),
        );
        let quantified = Formula::quantified(
            QuantifierKind::Exists,
            self.specification.outputs().to_vec(),
            Some(output_arity),
            quantified,
        );
        let quantified = Formula::quantified(
            QuantifierKind::Exists,
            (0..k).map(naming::transition_bit_family).collect(),
            Some(k + n_inputs),
            quantified,
        );
        let lambda_families = std::iter::once(naming::lambda_family())
            .chain((0..n_bits).map(|b| ranking_bit(&naming::lambda_ranking_family(), b)))
            .collect();
        let formula = Formula::quantified(
            QuantifierKind::Exists,
            lambda_families,
            Some(n_universals),
            quantified,
        );
        debug!(
            "symbolic encoding for bound {}: {} state bits, {} universal variables, {} ranking bits",
            bound, k, n_universals, n_bits
        );
        finalize(formula, n_bits)
    }

    /// Extracts a solution from the Skolem functions of the transition and output families.
    ///
    /// The valuation must assign the applications of these families, as given by a certificate of the solver.
    fn extract_solution(
        &self,
        bound: usize,
        valuation: &Valuation,
    ) -> Result<Solution, SynthesisError> {
        let k = state_bits(bound);
        let inputs = self.specification.inputs();
        let outputs = self.specification.outputs();
        let state_vars = self.state_vars(k);
        let tau_names = (0..k)
            .map(|b| application_name(&naming::transition_bit_family(b), &self.transition_args(k)))
            .collect::<Vec<Proposition>>();
        if let Some(missing) = tau_names.iter().find(|p| !valuation.contains(p)) {
            return Err(SynthesisError::SolvingFailed(format!(
                "no certificate for {}",
                missing
            )));
        }
        let mut solution = Solution::new(
            bound,
            self.specification.semantics(),
            inputs.to_vec(),
            outputs.to_vec(),
        );
        for s in 0..bound {
            let state_code = valuation_of_index(&state_vars, s);
            let taus = tau_names
                .iter()
                .map(|p| assigned_function(valuation, p).eval(&state_code))
                .collect::<Vec<Formula>>();
            for t in 0..bound {
                if let Some(guard) = satisfiable_guard(inputs, code_equals(&taus, t)) {
                    solution.add_transition(s, t, guard);
                }
            }
            for (index, o) in outputs.iter().enumerate() {
                let function = assigned_function(valuation, &application_name(o, &self.output_args(k)));
                solution.set_output_guard(s, index, function.eval(&state_code));
            }
        }
        Ok(solution)
    }
}
