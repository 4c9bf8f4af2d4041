use super::{Solution, SolverSet, SynthesisOptions, UnknownPolicy};
use crate::{
    encodings::{new_encoder, EncodingKind, SynthesisEncoder},
    logic::{Formula, PrenexFormula, Proposition, QuantifiedCnf, QuantifierBlock, Valuation},
    qbf::{QbfSolver, QbfSolvingResult},
    sat::SolvingResult,
    specification::Specification,
    SynthesisError,
};
use log::{debug, info, warn};

/// The outcome of the attempt at a single bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundOutcome {
    /// An implementation exists with this number of states; it is given if a solution was requested.
    Realizable(Option<Solution>),
    /// No implementation exists with this number of states.
    Unrealizable,
    /// The solver could not decide.
    Unknown,
}

/// The outcome of a bound search.
///
/// A search never concludes the specification is unrealizable: it only reports it did not find an implementation within its bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// An implementation was found.
    Realizable {
        /// The smallest bound (from the minimal one) for which an implementation exists.
        bound: usize,
        /// The implementation, if a solution was requested.
        solution: Option<Solution>,
    },
    /// No implementation exists with at most the maximal number of states.
    NotFound {
        /// The last bound tried.
        max_bound: usize,
    },
    /// The search was aborted since a solver could not decide.
    Unknown {
        /// The bound which could not be decided.
        bound: usize,
    },
}

/// A bound search looking for the smallest implementation of a specification.
///
/// # Example
///
/// ```
/// # use boundsyn::automaton::AutomatonBuilder;
/// # use boundsyn::logic::Formula;
/// # use boundsyn::specification::{Semantics, Specification};
/// # use boundsyn::synthesis::{BoundedSynthesis, SolverSet, SynthesisOptions, SynthesisOutcome};
/// let mut builder = AutomatonBuilder::new(vec!["i".into()], vec!["o".into()]);
/// builder.new_state("q0").unwrap();
/// builder.set_initial("q0").unwrap();
/// builder.new_transition("q0", "q0", Formula::TRUE).unwrap();
/// let specification = Specification::new(builder.build(), Semantics::Moore);
/// let solvers = SolverSet::default();
/// let search = BoundedSynthesis::new(&specification, SynthesisOptions::default(), &solvers).unwrap();
/// match search.search().unwrap() {
///     SynthesisOutcome::Realizable { bound, .. } => assert_eq!(1, bound),
///     _ => unreachable!(),
/// }
/// ```
pub struct BoundedSynthesis<'a> {
    encoder: Box<dyn SynthesisEncoder + 'a>,
    options: SynthesisOptions,
    solvers: &'a SolverSet,
}

fn to_cnf(formula: &Formula) -> Result<(PrenexFormula, QuantifiedCnf), SynthesisError> {
    let prenex = PrenexFormula::new(formula)?;
    let cnf = QuantifiedCnf::new(&prenex)?;
    debug!(
        "instance has {} quantifier blocks, {} variables and {} clauses",
        prenex.n_levels(),
        cnf.n_vars(),
        cnf.clauses().len()
    );
    Ok((prenex, cnf))
}

fn restrict(valuation: &Valuation, variables: &[Proposition]) -> Valuation {
    variables
        .iter()
        .filter_map(|p| valuation.get(p).map(|f| (p.clone(), f.clone())))
        .collect()
}

/// Returns the values of some variables, reading the ones absent from the matrix as `false`.
fn required_values<'v, I>(
    valuation: &Valuation,
    variables: I,
    matrix: &Formula,
    role: &str,
) -> Result<Valuation, SynthesisError>
where
    I: IntoIterator<Item = &'v Proposition>,
{
    let used = matrix.free_variables();
    let mut values = Valuation::default();
    for p in variables {
        match valuation.get(p) {
            Some(f) => {
                values.insert(p.clone(), f.clone());
            }
            None if !used.contains(p) => {
                values.insert(p.clone(), Formula::FALSE);
            }
            None => {
                return Err(SynthesisError::SolvingFailed(format!(
                    "the {} gave no value to {}",
                    role, p
                )))
            }
        }
    }
    Ok(values)
}

fn missing_solver(role: &str, kind: EncodingKind) -> SynthesisError {
    SynthesisError::SolvingFailed(format!(
        "the {} encoding needs a {}",
        kind.as_ref(),
        role
    ))
}

impl<'a> BoundedSynthesis<'a> {
    /// Builds a new bound search.
    ///
    /// Returns an error if a solver needed by the selected encoding is missing from the solver set.
    pub fn new(
        specification: &'a Specification,
        options: SynthesisOptions,
        solvers: &'a SolverSet,
    ) -> Result<Self, SynthesisError> {
        let kind = options.encoding;
        match kind {
            EncodingKind::Explicit => {}
            EncodingKind::Symbolic => {
                if solvers.dqbf_solver().is_none() {
                    return Err(missing_solver("DQBF solver", kind));
                }
            }
            EncodingKind::InputSymbolic => {
                if solvers.qbf_solver().is_none() {
                    return Err(missing_solver("QBF solver", kind));
                }
                if options.synthesize && solvers.qbf_certifier().is_none() {
                    return Err(missing_solver("QBF certifier to extract solutions", kind));
                }
            }
        }
        if options.min_bound == 0 {
            return Err(SynthesisError::SolvingFailed(
                "the minimal bound must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            encoder: new_encoder(kind, specification),
            options,
            solvers,
        })
    }

    /// Tries the bounds in increasing order until an implementation is found.
    ///
    /// Without a maximal bound, this function returns only when an implementation is found or a solver fails.
    pub fn search(&self) -> Result<SynthesisOutcome, SynthesisError> {
        let mut bound = self.options.min_bound;
        loop {
            if let Some(max) = self.options.max_bound {
                if bound > max {
                    info!("no implementation with at most {} states", max);
                    return Ok(SynthesisOutcome::NotFound { max_bound: max });
                }
            }
            match self.solve_bound(bound)? {
                BoundOutcome::Realizable(solution) => {
                    info!("found an implementation with {} states", bound);
                    return Ok(SynthesisOutcome::Realizable { bound, solution });
                }
                BoundOutcome::Unrealizable => {
                    info!("no implementation with {} states", bound);
                }
                BoundOutcome::Unknown => match self.options.unknown_policy {
                    UnknownPolicy::Abort => {
                        warn!("solver gave up at bound {}; aborting", bound);
                        return Ok(SynthesisOutcome::Unknown { bound });
                    }
                    UnknownPolicy::Advance => {
                        warn!("solver gave up at bound {}; trying the next one", bound)
                    }
                },
            }
            bound += 1;
        }
    }

    /// Checks whether an implementation exists with `bound` states.
    pub fn solve_bound(&self, bound: usize) -> Result<BoundOutcome, SynthesisError> {
        info!(
            "building the {} encoding for bound {}",
            self.encoder.kind().as_ref(),
            bound
        );
        let formula = self.encoder.encode(bound)?;
        match self.encoder.kind() {
            EncodingKind::Explicit => self.solve_explicit(bound, &formula),
            EncodingKind::Symbolic => self.solve_symbolic(bound, &formula),
            EncodingKind::InputSymbolic => self.solve_input_symbolic(bound, &formula),
        }
    }

    fn solve_explicit(&self, bound: usize, formula: &Formula) -> Result<BoundOutcome, SynthesisError> {
        let (_, cnf) = to_cnf(formula)?;
        let mut solver = self.solvers.sat_solver_factory().new_solver();
        cnf.load_into(solver.as_mut());
        match solver.solve().map_err(SynthesisError::solving_failed)? {
            SolvingResult::Satisfiable(assignment) => {
                if !self.options.synthesize {
                    return Ok(BoundOutcome::Realizable(None));
                }
                let valuation = cnf.valuation_of_assignment(&assignment);
                let solution = self.encoder.extract_solution(bound, &valuation)?;
                Ok(BoundOutcome::Realizable(Some(solution)))
            }
            SolvingResult::Unsatisfiable => Ok(BoundOutcome::Unrealizable),
            SolvingResult::Unknown => Ok(BoundOutcome::Unknown),
        }
    }

    fn solve_symbolic(&self, bound: usize, formula: &Formula) -> Result<BoundOutcome, SynthesisError> {
        let solver = self
            .solvers
            .dqbf_solver()
            .ok_or_else(|| missing_solver("DQBF solver", EncodingKind::Symbolic))?;
        let (_, cnf) = to_cnf(formula)?;
        match solver.solve(&cnf, None).map_err(SynthesisError::solving_failed)? {
            QbfSolvingResult::Satisfiable(valuation) => {
                if !self.options.synthesize {
                    return Ok(BoundOutcome::Realizable(None));
                }
                match self.encoder.extract_solution(bound, &valuation) {
                    Ok(solution) => Ok(BoundOutcome::Realizable(Some(solution))),
                    Err(e) => {
                        warn!("realizable with {} states, but {}", bound, e);
                        Ok(BoundOutcome::Realizable(None))
                    }
                }
            }
            QbfSolvingResult::Unsatisfiable => Ok(BoundOutcome::Unrealizable),
            QbfSolvingResult::Unknown => Ok(BoundOutcome::Unknown),
        }
    }

    fn solve_input_symbolic(
        &self,
        bound: usize,
        formula: &Formula,
    ) -> Result<BoundOutcome, SynthesisError> {
        let solver = self
            .solvers
            .qbf_solver()
            .ok_or_else(|| missing_solver("QBF solver", EncodingKind::InputSymbolic))?;
        let (prenex, cnf) = to_cnf(formula)?;
        let result = solver
            .solve(&cnf, self.solvers.qbf_preprocessor())
            .map_err(SynthesisError::solving_failed)?;
        let valuation = match result {
            QbfSolvingResult::Satisfiable(valuation) => valuation,
            QbfSolvingResult::Unsatisfiable => return Ok(BoundOutcome::Unrealizable),
            QbfSolvingResult::Unknown => return Ok(BoundOutcome::Unknown),
        };
        if !self.options.synthesize {
            return Ok(BoundOutcome::Realizable(None));
        }
        let certifier = self.solvers.qbf_certifier().ok_or_else(|| {
            missing_solver("QBF certifier to extract solutions", EncodingKind::InputSymbolic)
        })?;
        let solution = self.certify(bound, formula, &prenex, valuation, solver, certifier)?;
        Ok(BoundOutcome::Realizable(Some(solution)))
    }

    /// Computes the functions of the inner existential variables of a satisfiable input-symbolic instance.
    ///
    /// The top-level values given by the first (possibly preprocessed) call are completed by a call without preprocessing,
    /// then the remaining two-level instance is given to the certifier.
    /// Fails if a solver leaves a variable of the matrix without a value.
    fn certify(
        &self,
        bound: usize,
        formula: &Formula,
        prenex: &PrenexFormula,
        valuation: Valuation,
        solver: &dyn QbfSolver,
        certifier: &dyn QbfSolver,
    ) -> Result<Solution, SynthesisError> {
        let mut merged = restrict(&valuation, prenex.outermost_existentials());
        let reduced = formula.eval(&merged);
        let (reduced_prenex, reduced_cnf) = to_cnf(&reduced)?;
        let two_level = if reduced_prenex.outermost_existentials().is_empty() {
            reduced
        } else {
            debug!("completing the top-level assignment");
            let additional = match solver
                .solve(&reduced_cnf, None)
                .map_err(SynthesisError::solving_failed)?
            {
                QbfSolvingResult::Satisfiable(v) => required_values(
                    &v,
                    reduced_prenex.outermost_existentials(),
                    reduced_prenex.matrix(),
                    "QBF solver",
                )?,
                _ => {
                    return Err(SynthesisError::SolvingFailed(
                        "the QBF solver did not confirm the top-level assignment".to_string(),
                    ))
                }
            };
            let two_level = reduced.eval(&additional);
            merged.merge(additional);
            two_level
        };
        let (two_level_prenex, two_level_cnf) = to_cnf(&two_level)?;
        if two_level_prenex.n_levels() > 0 {
            debug!("certifying the two-level instance");
            let functions = match certifier
                .solve(&two_level_cnf, None)
                .map_err(SynthesisError::solving_failed)?
            {
                QbfSolvingResult::Satisfiable(functions) => functions,
                _ => {
                    return Err(SynthesisError::SolvingFailed(
                        "the QBF certifier did not confirm the instance".to_string(),
                    ))
                }
            };
            let existentials = two_level_prenex
                .prefix()
                .iter()
                .filter(|b| matches!(b, QuantifierBlock::Exists(_)))
                .flat_map(|b| b.variables());
            merged.merge(required_values(
                &functions,
                existentials,
                two_level_prenex.matrix(),
                "QBF certifier",
            )?);
        }
        let solution = self.encoder.extract_solution(bound, &merged)?;
        solution.check_complete()?;
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        automaton::{Automaton, AutomatonBuilder},
        logic::CnfBlock,
        qbf::{ExternalQbfSolver, QbfPreprocessor},
        sat::{default_solver, BufferedSatSolver, SatSolver, SatSolverFactory},
        scenarios::ScenarioBranch,
        specification::Semantics,
    };
    use anyhow::Result;
    use std::io::Cursor;

    fn free_automaton() -> Automaton {
        let mut builder = AutomatonBuilder::new(vec!["i".into()], vec!["o".into()]);
        builder.new_state("q0").unwrap();
        builder.set_initial("q0").unwrap();
        builder.new_transition("q0", "q0", Formula::TRUE).unwrap();
        builder.build()
    }

    fn copy_input_automaton() -> Automaton {
        let mut builder = AutomatonBuilder::new(vec!["i".into()], vec!["o".into()]);
        builder.new_state("q0").unwrap();
        builder.set_initial("q0").unwrap();
        builder
            .add_safety_condition("q0", Formula::iff(Formula::atom("o"), Formula::atom("i")))
            .unwrap();
        builder.new_transition("q0", "q0", Formula::TRUE).unwrap();
        builder.build()
    }

    fn options(encoding: EncodingKind) -> SynthesisOptions {
        SynthesisOptions {
            encoding,
            ..Default::default()
        }
    }

    #[test]
    fn test_explicit_search_finds_smallest_bound() {
        let scenarios = vec![vec![
            ScenarioBranch::from_label("i;o"),
            ScenarioBranch::from_label(";"),
        ]];
        let specification =
            Specification::new_with_scenarios(free_automaton(), Semantics::Moore, &scenarios);
        let solvers = SolverSet::default();
        let search =
            BoundedSynthesis::new(&specification, options(EncodingKind::Explicit), &solvers)
                .unwrap();
        match search.search().unwrap() {
            SynthesisOutcome::Realizable {
                bound,
                solution: Some(solution),
            } => {
                assert_eq!(2, bound);
                assert_eq!(2, solution.bound());
                solution.check_complete().unwrap();
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_explicit_search_max_bound() {
        let specification = Specification::new(copy_input_automaton(), Semantics::Moore);
        let solvers = SolverSet::default();
        let search = BoundedSynthesis::new(
            &specification,
            SynthesisOptions {
                max_bound: Some(3),
                ..Default::default()
            },
            &solvers,
        )
        .unwrap();
        assert_eq!(
            SynthesisOutcome::NotFound { max_bound: 3 },
            search.search().unwrap()
        );
    }

    #[test]
    fn test_realizability_only() {
        let specification = Specification::new(copy_input_automaton(), Semantics::Mealy);
        let solvers = SolverSet::default();
        let search = BoundedSynthesis::new(
            &specification,
            SynthesisOptions {
                synthesize: false,
                ..Default::default()
            },
            &solvers,
        )
        .unwrap();
        assert_eq!(
            SynthesisOutcome::Realizable {
                bound: 1,
                solution: None
            },
            search.search().unwrap()
        );
    }

    struct UnknownSatSolverFactory;

    impl SatSolverFactory for UnknownSatSolverFactory {
        fn new_solver(&self) -> Box<dyn SatSolver> {
            Box::new(BufferedSatSolver::new(Box::new(|_| {
                Ok(Box::new(Cursor::new("s UNKNOWN\n".as_bytes().to_vec())))
            })))
        }
    }

    #[test]
    fn test_unknown_policy() {
        let specification = Specification::new(free_automaton(), Semantics::Moore);
        let solvers = SolverSet::new(Box::new(UnknownSatSolverFactory));
        let abort = BoundedSynthesis::new(
            &specification,
            SynthesisOptions {
                min_bound: 2,
                ..Default::default()
            },
            &solvers,
        )
        .unwrap();
        assert_eq!(SynthesisOutcome::Unknown { bound: 2 }, abort.search().unwrap());
        let advance = BoundedSynthesis::new(
            &specification,
            SynthesisOptions {
                max_bound: Some(3),
                unknown_policy: UnknownPolicy::Advance,
                ..Default::default()
            },
            &solvers,
        )
        .unwrap();
        assert_eq!(
            SynthesisOutcome::NotFound { max_bound: 3 },
            advance.search().unwrap()
        );
    }

    #[test]
    fn test_missing_solvers() {
        let specification = Specification::new(free_automaton(), Semantics::Moore);
        let solvers = SolverSet::default();
        for kind in [EncodingKind::Symbolic, EncodingKind::InputSymbolic] {
            assert!(matches!(
                BoundedSynthesis::new(&specification, options(kind), &solvers),
                Err(SynthesisError::SolvingFailed(_))
            ));
        }
        assert!(BoundedSynthesis::new(
            &specification,
            SynthesisOptions {
                min_bound: 0,
                ..Default::default()
            },
            &solvers
        )
        .is_err());
    }

    #[test]
    fn test_symbolic_without_certificate() {
        let specification = Specification::new(free_automaton(), Semantics::Mealy);
        let solvers = SolverSet::default().with_dqbf_solver(Box::new(
            ExternalQbfSolver::new_with_solving_fn(Box::new(|text| {
                assert!(text.lines().any(|l| l.starts_with("d ")));
                Ok(("s cnf 1\n".to_string(), None))
            })),
        ));
        let search =
            BoundedSynthesis::new(&specification, options(EncodingKind::Symbolic), &solvers)
                .unwrap();
        assert_eq!(
            BoundOutcome::Realizable(None),
            search.solve_bound(1).unwrap()
        );
        let unsat = SolverSet::default().with_dqbf_solver(Box::new(
            ExternalQbfSolver::new_with_solving_fn(Box::new(|_| Ok(("s cnf 0\n".to_string(), None)))),
        ));
        let search =
            BoundedSynthesis::new(&specification, options(EncodingKind::Symbolic), &unsat)
                .unwrap();
        assert_eq!(BoundOutcome::Unrealizable, search.solve_bound(1).unwrap());
    }

    /// A QBF solver for instances without universal variables, backed by a SAT solver.
    struct PropositionalQbfSolver;

    impl QbfSolver for PropositionalQbfSolver {
        fn solve(
            &self,
            instance: &QuantifiedCnf,
            _: Option<&dyn QbfPreprocessor>,
        ) -> Result<QbfSolvingResult> {
            assert!(instance
                .prefix()
                .iter()
                .all(|b| matches!(b, CnfBlock::Exists(_))));
            let mut solver = default_solver();
            instance.load_into(solver.as_mut());
            Ok(match solver.solve()? {
                SolvingResult::Satisfiable(a) => {
                    QbfSolvingResult::Satisfiable(instance.valuation_of_assignment(&a))
                }
                SolvingResult::Unsatisfiable => QbfSolvingResult::Unsatisfiable,
                SolvingResult::Unknown => QbfSolvingResult::Unknown,
            })
        }
    }

    #[test]
    fn test_input_symbolic_without_inputs() {
        let mut builder = AutomatonBuilder::new(vec![], vec!["o".into()]);
        builder.new_state("q0").unwrap();
        builder.set_initial("q0").unwrap();
        builder.add_safety_condition("q0", Formula::atom("o")).unwrap();
        builder.new_transition("q0", "q0", Formula::TRUE).unwrap();
        let specification = Specification::new(builder.build(), Semantics::Mealy);
        let solvers = SolverSet::default()
            .with_qbf_solver(Box::new(PropositionalQbfSolver))
            .with_qbf_certifier(Box::new(PropositionalQbfSolver));
        let search =
            BoundedSynthesis::new(&specification, options(EncodingKind::InputSymbolic), &solvers)
                .unwrap();
        match search.search().unwrap() {
            SynthesisOutcome::Realizable {
                bound: 1,
                solution: Some(solution),
            } => {
                assert_eq!(&Formula::TRUE, solution.output_guard(0, 0));
                assert_eq!(&[(0, Formula::TRUE)], solution.transitions_from(0));
            }
            _ => panic!(),
        }
    }

    /// A QBF solver assigning `true` to every variable of the first existential block.
    fn top_level_solver() -> ExternalQbfSolver {
        ExternalQbfSolver::new_with_solving_fn(Box::new(|text| {
            let block = text.lines().find(|l| l.starts_with("e ")).unwrap_or("e 0");
            let values = block.split_whitespace().skip(1).collect::<Vec<&str>>();
            Ok((format!("s cnf 1\nV {}\n", values.join(" ")), None))
        }))
    }

    fn canned_qbf_solver(output: &'static str) -> ExternalQbfSolver {
        ExternalQbfSolver::new_with_solving_fn(Box::new(move |_| Ok((output.to_string(), None))))
    }

    #[test]
    fn test_input_symbolic_certification() {
        // the first call assigns the top-level block; the certifier then answers with o := i
        let specification = Specification::new(copy_input_automaton(), Semantics::Mealy);
        let solvers = SolverSet::default()
            .with_qbf_solver(Box::new(top_level_solver()))
            .with_qbf_certifier(Box::new(ExternalQbfSolver::new_with_solving_fn(Box::new(
                |text| {
                    let prefix = text
                        .lines()
                        .filter(|l| l.starts_with("a ") || l.starts_with("e ") || l.starts_with("d "))
                        .map(|l| &l[..1])
                        .collect::<Vec<&str>>();
                    assert_eq!(vec!["a", "e"], prefix);
                    let universal = text.lines().find(|l| l.starts_with("a ")).unwrap().to_string();
                    let input = universal.split_whitespace().nth(1).unwrap().to_string();
                    let existential = text.lines().find(|l| l.starts_with("e ")).unwrap().to_string();
                    let vars = existential.split_whitespace().collect::<Vec<&str>>();
                    // o[0] is declared after τ[0,0]
                    Ok((
                        format!(
                            "s cnf 1\naag 1 1 0 2 0\n2\n1\n2\ni0 {}\no0 {}\no1 {}\n",
                            input, vars[1], vars[2]
                        ),
                        None,
                    ))
                },
            ))));
        let search =
            BoundedSynthesis::new(&specification, options(EncodingKind::InputSymbolic), &solvers)
                .unwrap();
        match search.solve_bound(1).unwrap() {
            BoundOutcome::Realizable(Some(solution)) => {
                assert_eq!(&Formula::atom("i"), solution.output_guard(0, 0));
                assert_eq!(&[(0, Formula::TRUE)], solution.transitions_from(0));
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_input_symbolic_missing_top_level_values() {
        let mut builder = AutomatonBuilder::new(vec!["i".into()], vec!["o".into()]);
        builder.new_state("q0").unwrap();
        builder.set_initial("q0").unwrap();
        builder.add_safety_condition("q0", Formula::atom("o")).unwrap();
        builder.new_transition("q0", "q0", Formula::TRUE).unwrap();
        let specification = Specification::new(builder.build(), Semantics::Moore);
        let solvers = SolverSet::default()
            .with_qbf_solver(Box::new(canned_qbf_solver("s cnf 1\n")))
            .with_qbf_certifier(Box::new(canned_qbf_solver("s cnf 1\n")));
        let search =
            BoundedSynthesis::new(&specification, options(EncodingKind::InputSymbolic), &solvers)
                .unwrap();
        assert!(matches!(
            search.solve_bound(1),
            Err(SynthesisError::SolvingFailed(_))
        ));
    }

    #[test]
    fn test_input_symbolic_missing_certificate() {
        let specification = Specification::new(copy_input_automaton(), Semantics::Mealy);
        let solvers = SolverSet::default()
            .with_qbf_solver(Box::new(top_level_solver()))
            .with_qbf_certifier(Box::new(canned_qbf_solver("s cnf 1\n")));
        let search =
            BoundedSynthesis::new(&specification, options(EncodingKind::InputSymbolic), &solvers)
                .unwrap();
        assert!(matches!(
            search.solve_bound(1),
            Err(SynthesisError::SolvingFailed(_))
        ));
    }
}
