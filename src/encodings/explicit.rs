use super::{
    naming,
    ranking::{ranking_bits, successor_requirement},
    specs::{assigned_value, finalize},
    EncodingKind, SynthesisEncoder,
};
use crate::{
    automaton::StateId,
    logic::{bit_string, ranking_bit, Formula, Proposition, QuantifierKind, Valuation},
    specification::{Semantics, Specification},
    synthesis::{guard_of_valuations, Solution},
    SynthesisError,
};
use log::debug;

/// The explicit encoding: implementation states and input valuations are enumerated.
///
/// The resulting formula is purely existential and targets SAT solvers.
/// Since every transition is indexed by an input valuation, the formula size grows as `2^|inputs|`.
pub struct ExplicitEncoder<'a> {
    specification: &'a Specification,
}

impl<'a> ExplicitEncoder<'a> {
    /// Builds an explicit encoder for a specification.
    pub fn new(specification: &'a Specification) -> Self {
        Self { specification }
    }

    fn n_valuations(&self) -> usize {
        1 << self.specification.inputs().len()
    }

    fn input_bits(&self, i: usize) -> String {
        bit_string(i, self.specification.inputs().len())
    }

    fn output(&self, o: &Proposition, s: usize, i: usize) -> Proposition {
        match self.specification.semantics() {
            Semantics::Mealy => naming::mealy_output(o, s, &self.input_bits(i)),
            Semantics::Moore => naming::moore_output(o, s),
        }
    }

    /// Replaces the inputs by their values in the valuation `i` and the outputs by the output propositions of state `s`.
    fn instantiate(&self, f: &Formula, s: usize, i: usize) -> Formula {
        let inputs = self.specification.inputs();
        let outputs = self.specification.outputs();
        f.replace(&|p| {
            if let Some(k) = inputs.iter().position(|x| x == p) {
                Some(Formula::Constant((i >> k) & 1 == 1))
            } else if outputs.contains(p) {
                Some(Formula::Atom(self.output(p, s, i)))
            } else {
                None
            }
        })
    }

    fn lambda_constraint(&self, bound: usize, s: usize, q: StateId) -> Formula {
        let automaton = self.specification.automaton();
        let source_ranking = Formula::indexed(naming::lambda_ranking(s, q), vec![]);
        let per_valuation = (0..self.n_valuations()).map(|i| {
            let safety = automaton
                .safety_condition(q)
                .map(|c| self.instantiate(c, s, i))
                .unwrap_or(Formula::TRUE);
            let successors = automaton.transitions_from(q).iter().map(|(q_prime, guard)| {
                let requirement = Formula::and((0..bound).map(|t| {
                    Formula::implies(
                        Formula::atom(naming::transition_under(s, &self.input_bits(i), t)),
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
                Formula::implies(self.instantiate(guard, s, i), requirement)
            });
            Formula::and(std::iter::once(safety).chain(successors))
        });
        Formula::implies(
            Formula::atom(naming::lambda(s, q)),
            Formula::and(per_valuation),
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
                    let i = branch.input_index(inputs);
                    let outputs_match =
                        branch.outputs_match(outputs, &|o| Formula::Atom(self.output(o, s, i)));
                    Formula::or((0..bound).map(|t| {
                        Formula::and([
                            Formula::atom(naming::transition_under(s, &self.input_bits(i), t)),
                            Formula::atom(naming::coverage(t, j_prime)),
                            outputs_match.clone(),
                        ])
                    }))
                });
                constraints.push(Formula::implies(
                    Formula::atom(naming::coverage(s, j)),
                    Formula::and(branches),
                ));
            }
        }
        constraints
    }

    fn existential_variables(&self, bound: usize, n_bits: usize) -> Vec<Proposition> {
        let automaton = self.specification.automaton();
        let trie = self.specification.scenarios();
        let mut vars = vec![];
        for s in 0..bound {
            for q in automaton.states() {
                vars.push(naming::lambda(s, q));
                let family = naming::lambda_ranking(s, q);
                vars.extend((0..n_bits).map(|k| ranking_bit(&family, k)));
            }
            for i in 0..self.n_valuations() {
                let bits = self.input_bits(i);
                vars.extend((0..bound).map(|t| naming::transition_under(s, &bits, t)));
            }
            for o in self.specification.outputs() {
                match self.specification.semantics() {
                    Semantics::Mealy => vars.extend(
                        (0..self.n_valuations()).map(|i| naming::mealy_output(o, s, &self.input_bits(i))),
                    ),
                    Semantics::Moore => vars.push(naming::moore_output(o, s)),
                }
            }
            if !trie.is_empty() {
                vars.extend(trie.node_ids().map(|j| naming::coverage(s, j)));
            }
        }
        vars
    }
}

impl SynthesisEncoder for ExplicitEncoder<'_> {
    fn kind(&self) -> EncodingKind {
        EncodingKind::Explicit
    }

    fn encode(&self, bound: usize) -> Result<Formula, SynthesisError> {
        let automaton = self.specification.automaton();
        let trie = self.specification.scenarios();
        let mut constraints = vec![];
        if !trie.is_empty() {
            constraints.append(&mut self.scenario_constraints(bound));
        }
        for s in 0..bound {
            for i in 0..self.n_valuations() {
                let bits = self.input_bits(i);
                constraints.push(Formula::or(
                    (0..bound).map(|t| Formula::atom(naming::transition_under(s, &bits, t))),
                ));
            }
        }
        for s in 0..bound {
            for q in automaton.states() {
                constraints.push(self.lambda_constraint(bound, s, q));
            }
        }
        let n_bits = ranking_bits(automaton, bound);
        let formula = Formula::quantified(
            QuantifierKind::Exists,
            self.existential_variables(bound, n_bits),
            None,
            Formula::and(constraints),
        );
        let mut initial = Valuation::default();
        automaton.initial_states().for_each(|q| {
            initial.insert(naming::lambda(0, q), Formula::TRUE);
        });
        if !trie.is_empty() {
            initial.insert(naming::coverage(0, trie.root()), Formula::TRUE);
        }
        debug!(
            "explicit encoding for bound {}: {} input valuations, {} ranking bits",
            bound,
            self.n_valuations(),
            n_bits
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
                let enabled = |i: usize| {
                    assigned_value(
                        valuation,
                        &naming::transition_under(s, &self.input_bits(i), t),
                    )
                };
                if let Some(guard) = guard_of_valuations(inputs, &enabled) {
                    solution.add_transition(s, t, guard);
                }
            }
            for (k, o) in outputs.iter().enumerate() {
                let guard = match self.specification.semantics() {
                    Semantics::Moore => {
                        Formula::Constant(assigned_value(valuation, &naming::moore_output(o, s)))
                    }
                    Semantics::Mealy => {
                        let enabled = |i: usize| {
                            assigned_value(
                                valuation,
                                &naming::mealy_output(o, s, &self.input_bits(i)),
                            )
                        };
                        guard_of_valuations(inputs, &enabled).unwrap_or(Formula::FALSE)
                    }
                };
                solution.set_output_guard(s, k, guard);
            }
        }
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        automaton::{Automaton, AutomatonBuilder},
        logic::{Comparison, PrenexFormula, QuantifiedCnf},
        sat::{default_solver, SolvingResult},
        scenarios::ScenarioBranch,
    };

    fn one_state_automaton() -> Automaton {
        let mut builder = AutomatonBuilder::new(vec!["i".into()], vec!["o".into()]);
        builder.new_state("q0").unwrap();
        builder.set_initial("q0").unwrap();
        builder.new_transition("q0", "q0", Formula::TRUE).unwrap();
        builder.build()
    }

    fn request_grant_automaton() -> Automaton {
        // G(r -> F g): q1 is entered on a pending request and left once granted
        let mut builder = AutomatonBuilder::new(vec!["r".into()], vec!["g".into()]);
        builder.new_state("q0").unwrap();
        builder.new_state("q1").unwrap();
        builder.set_initial("q0").unwrap();
        builder.set_rejecting("q1").unwrap();
        builder.new_transition("q0", "q0", Formula::TRUE).unwrap();
        builder
            .new_transition(
                "q0",
                "q1",
                Formula::and([Formula::atom("r"), Formula::not(Formula::atom("g"))]),
            )
            .unwrap();
        builder
            .new_transition("q1", "q1", Formula::not(Formula::atom("g")))
            .unwrap();
        builder.build()
    }

    fn solve(formula: &Formula) -> Option<Valuation> {
        let cnf = QuantifiedCnf::new(&PrenexFormula::new(formula).unwrap()).unwrap();
        let mut solver = default_solver();
        cnf.load_into(solver.as_mut());
        match solver.solve().unwrap() {
            SolvingResult::Satisfiable(assignment) => Some(cnf.valuation_of_assignment(&assignment)),
            SolvingResult::Unsatisfiable => None,
            SolvingResult::Unknown => panic!(),
        }
    }

    fn quantified_variables(formula: &Formula) -> Vec<Proposition> {
        match formula {
            Formula::Quantifier { variables, .. } => variables.clone(),
            _ => panic!("not a quantified formula"),
        }
    }

    fn matrix(formula: &Formula) -> Formula {
        match formula {
            Formula::Quantifier { scope, .. } => scope.as_ref().clone(),
            _ => panic!("not a quantified formula"),
        }
    }

    #[test]
    fn test_moore_one_state() {
        let specification = Specification::new(one_state_automaton(), Semantics::Moore);
        let encoder = ExplicitEncoder::new(&specification);
        let formula = encoder.encode(1).unwrap();
        assert!(formula.is_bounded());
        let valuation = solve(&formula).unwrap();
        let solution = encoder.extract_solution(1, &valuation).unwrap();
        assert_eq!(1, solution.bound());
        assert_eq!(&[(0, Formula::TRUE)], solution.transitions_from(0));
        assert!(solution.output_guard(0, 0).as_constant().is_some());
    }

    #[test]
    fn test_round_trip() {
        let specification = Specification::new(request_grant_automaton(), Semantics::Mealy);
        let encoder = ExplicitEncoder::new(&specification);
        let formula = encoder.encode(2).unwrap();
        let valuation = solve(&formula).unwrap();
        assert_eq!(Some(true), matrix(&formula).eval(&valuation).as_constant());
        let solution = encoder.extract_solution(2, &valuation).unwrap();
        solution.check_complete().unwrap();
        for s in 0..2 {
            assert!(solution.transitions_from(s).iter().all(|(t, _)| *t < 2));
        }
    }

    #[test]
    fn test_unrealizable_safety() {
        let mut builder = AutomatonBuilder::new(vec!["i".into()], vec!["o".into()]);
        builder.new_state("q0").unwrap();
        builder.set_initial("q0").unwrap();
        builder
            .add_safety_condition(
                "q0",
                Formula::iff(Formula::atom("o"), Formula::atom("i")),
            )
            .unwrap();
        builder.new_transition("q0", "q0", Formula::TRUE).unwrap();
        let automaton = builder.build();
        let moore = Specification::new(automaton.clone(), Semantics::Moore);
        assert!(solve(&ExplicitEncoder::new(&moore).encode(2).unwrap()).is_none());
        let mealy = Specification::new(automaton, Semantics::Mealy);
        let encoder = ExplicitEncoder::new(&mealy);
        let valuation = solve(&encoder.encode(1).unwrap()).unwrap();
        let solution = encoder.extract_solution(1, &valuation).unwrap();
        let guard = solution.output_guard(0, 0);
        for value in [false, true] {
            let v = [(Proposition::from("i"), Formula::Constant(value))]
                .into_iter()
                .collect::<Valuation>();
            assert_eq!(Some(value), guard.eval(&v).as_constant());
        }
    }

    #[test]
    fn test_semantics_distinction() {
        let moore = Specification::new(one_state_automaton(), Semantics::Moore);
        let mealy = Specification::new(one_state_automaton(), Semantics::Mealy);
        let moore_vars = quantified_variables(&ExplicitEncoder::new(&moore).encode(1).unwrap());
        let mealy_vars = quantified_variables(&ExplicitEncoder::new(&mealy).encode(1).unwrap());
        assert!(moore_vars.contains(&"o[0]".into()));
        assert!(!moore_vars.contains(&"o[0,0]".into()));
        assert!(mealy_vars.contains(&"o[0,0]".into()));
        assert!(mealy_vars.contains(&"o[0,1]".into()));
        assert!(!mealy_vars.contains(&"o[0]".into()));
    }

    #[test]
    fn test_initial_lambda_is_substituted() {
        let specification = Specification::new(one_state_automaton(), Semantics::Moore);
        let formula = ExplicitEncoder::new(&specification).encode(2).unwrap();
        let vars = quantified_variables(&formula);
        assert!(!vars.contains(&naming::lambda(0, 0)));
        assert!(vars.contains(&naming::lambda(1, 0)));
    }

    #[test]
    fn test_scenario_coverage() {
        let scenarios = vec![
            vec![ScenarioBranch::from_label("i;o"), ScenarioBranch::from_label(";")],
            vec![ScenarioBranch::from_label(";"), ScenarioBranch::from_label(";o")],
        ];
        let specification =
            Specification::new_with_scenarios(one_state_automaton(), Semantics::Moore, &scenarios);
        let trie = specification.scenarios();
        assert_eq!(2, trie.children(trie.root()).count());
        let encoder = ExplicitEncoder::new(&specification);
        let raw = encoder.scenario_constraints(2);
        assert_eq!(
            Formula::or([
                Formula::atom(naming::coverage(0, trie.root())),
                Formula::atom(naming::coverage(1, trie.root())),
            ]),
            raw[0]
        );
        let formula = encoder.encode(2).unwrap();
        let vars = quantified_variables(&formula);
        assert!(!vars.contains(&naming::coverage(0, trie.root())));
        assert!(vars.contains(&naming::coverage(1, trie.root())));
        // the initial state cannot output both o and !o
        assert!(solve(&formula).is_none());
    }

    #[test]
    fn test_scenario_forces_mealy_outputs() {
        let scenarios = vec![vec![ScenarioBranch::from_label("i;o")], vec![ScenarioBranch::from_label(";")]];
        let specification =
            Specification::new_with_scenarios(one_state_automaton(), Semantics::Mealy, &scenarios);
        let encoder = ExplicitEncoder::new(&specification);
        let valuation = solve(&encoder.encode(1).unwrap()).unwrap();
        let solution = encoder.extract_solution(1, &valuation).unwrap();
        assert_eq!(&Formula::atom("i"), solution.output_guard(0, 0));
        let moore = Specification::new_with_scenarios(one_state_automaton(), Semantics::Moore, &scenarios);
        assert!(solve(&ExplicitEncoder::new(&moore).encode(3).unwrap()).is_none());
    }

    #[test]
    fn test_ranking_comparisons_on_raw_formula() {
        let mut builder = AutomatonBuilder::new(vec![], vec![]);
        for q in ["q0", "q1", "q2", "q3"] {
            builder.new_state(q).unwrap();
        }
        builder.set_initial("q0").unwrap();
        builder.set_rejecting("q2").unwrap();
        builder.new_transition("q0", "q1", Formula::TRUE).unwrap();
        builder.new_transition("q1", "q2", Formula::TRUE).unwrap();
        builder.new_transition("q2", "q1", Formula::TRUE).unwrap();
        builder.new_transition("q2", "q3", Formula::TRUE).unwrap();
        builder.new_transition("q3", "q3", Formula::TRUE).unwrap();
        let specification = Specification::new(builder.build(), Semantics::Moore);
        let encoder = ExplicitEncoder::new(&specification);
        let bound = 3;
        let mut comparisons = vec![];
        for s in 0..bound {
            for q in 0..4 {
                encoder.lambda_constraint(bound, s, q).visit(&mut |f| {
                    if let Formula::Compare(op, lhs, rhs) = f {
                        comparisons.push((q, *op, lhs.to_string(), rhs.to_string()));
                    }
                });
            }
        }
        // 3 sources times 3 targets for each of the two transitions inside the rejecting SCC
        assert_eq!(18, comparisons.len());
        assert!(comparisons
            .iter()
            .filter(|(q, _, _, _)| *q == 1)
            .all(|(_, op, lhs, _)| *op == Comparison::Less && lhs.starts_with("λ#[") && lhs.ends_with(",2]()")));
        assert!(comparisons
            .iter()
            .filter(|(q, _, _, _)| *q == 2)
            .all(|(_, op, lhs, _)| *op == Comparison::LessOrEqual && lhs.ends_with(",1]()")));
        assert!(comparisons.iter().all(|(q, _, _, _)| *q == 1 || *q == 2));
    }
}
