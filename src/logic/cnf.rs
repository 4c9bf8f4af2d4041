use super::{Formula, PrenexFormula, Proposition, QuantifierBlock, Valuation};
use crate::{
    sat::{Assignment, Literal, SatSolver, Variable},
    SynthesisError,
};
use std::{collections::HashMap, io::Write};

/// A block of the prefix of a [`QuantifiedCnf`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CnfBlock {
    /// Existentially quantified variables.
    Exists(Vec<Variable>),
    /// Universally quantified variables.
    Forall(Vec<Variable>),
    /// Existentially quantified variables with explicit dependency sets.
    Dependent(Vec<(Variable, Vec<Variable>)>),
}

/// A quantified formula in conjunctive normal form, ready to be written in the (Q/DQ)DIMACS formats.
///
/// The variables of the prefix are numbered first, in order of appearance;
/// the auxiliary variables introduced by the Tseitin transformation come next and belong to the innermost existential block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantifiedCnf {
    prefix: Vec<CnfBlock>,
    clauses: Vec<Vec<Literal>>,
    names: Vec<Proposition>,
    variables: HashMap<Proposition, Variable>,
    n_vars: usize,
}

impl QuantifiedCnf {
    /// Translates a prenex formula into CNF.
    ///
    /// Every atom of the matrix must be quantified by the prefix.
    pub fn new(formula: &PrenexFormula) -> Result<Self, SynthesisError> {
        let mut table = VariableTable::default();
        let mut prefix = Vec::with_capacity(formula.prefix().len());
        for block in formula.prefix() {
            prefix.push(match block {
                QuantifierBlock::Exists(vars) => CnfBlock::Exists(
                    vars.iter()
                        .map(|v| table.declare(v))
                        .collect::<Result<_, _>>()?,
                ),
                QuantifierBlock::Forall(vars) => CnfBlock::Forall(
                    vars.iter()
                        .map(|v| table.declare(v))
                        .collect::<Result<_, _>>()?,
                ),
                QuantifierBlock::Dependent(vars) => {
                    let mut dependent = Vec::with_capacity(vars.len());
                    for (v, deps) in vars {
                        let var = table.declare(v)?;
                        let deps = deps
                            .iter()
                            .map(|d| {
                                table.variables.get(d).copied().ok_or_else(|| {
                                    SynthesisError::EncodingFailed(format!(
                                        "unknown dependency {} for variable {}",
                                        d, v
                                    ))
                                })
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        dependent.push((var, deps));
                    }
                    CnfBlock::Dependent(dependent)
                }
            });
        }
        let VariableTable { names, variables } = table;
        let n_named = names.len();
        let mut encoder = TseitinEncoder {
            variables: &variables,
            n_vars: n_named,
            true_var: None,
            clauses: vec![],
        };
        encoder.encode_root(formula.matrix())?;
        let n_vars = encoder.n_vars;
        let clauses = encoder.clauses;
        if n_vars > n_named {
            let aux = (n_named + 1..=n_vars).map(Variable::from);
            match prefix.last_mut() {
                Some(CnfBlock::Exists(vars)) => vars.extend(aux),
                _ => prefix.push(CnfBlock::Exists(aux.collect())),
            }
        }
        Ok(Self {
            prefix,
            clauses,
            names,
            variables,
            n_vars,
        })
    }

    /// Returns the quantifier prefix.
    pub fn prefix(&self) -> &[CnfBlock] {
        &self.prefix
    }

    /// Returns the clauses.
    pub fn clauses(&self) -> &[Vec<Literal>] {
        &self.clauses
    }

    /// Returns the number of variables, including the auxiliary ones.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Returns the proposition associated with a variable, or `None` for auxiliary variables.
    pub fn name_of(&self, v: Variable) -> Option<&Proposition> {
        self.names.get(usize::from(v) - 1)
    }

    /// Returns the variable associated with a proposition.
    pub fn variable_of(&self, p: &Proposition) -> Option<Variable> {
        self.variables.get(p).copied()
    }

    /// Returns `true` iff all the variables are existentially quantified.
    pub fn is_propositional(&self) -> bool {
        self.prefix.iter().all(|b| matches!(b, CnfBlock::Exists(_)))
    }

    /// Returns `true` iff some variables have explicit dependency sets.
    pub fn has_dependencies(&self) -> bool {
        self.prefix
            .iter()
            .any(|b| matches!(b, CnfBlock::Dependent(_)))
    }

    /// Adds the clauses of this formula to a SAT solver.
    pub fn load_into(&self, solver: &mut dyn SatSolver) {
        solver.reserve(self.n_vars);
        self.clauses
            .iter()
            .for_each(|cl| solver.add_clause(cl.clone()));
    }

    /// Builds the valuation of the named variables assigned by a SAT model.
    pub fn valuation_of_assignment(&self, assignment: &Assignment) -> Valuation {
        self.valuation_of_literals(assignment.iter().filter_map(|(v, value)| {
            value.map(|b| {
                let l = Literal::from(v as isize);
                if b {
                    l
                } else {
                    l.negate()
                }
            })
        }))
    }

    /// Builds the valuation of the named variables from a list of true literals.
    ///
    /// Auxiliary and unknown variables are ignored.
    pub fn valuation_of_literals<I>(&self, literals: I) -> Valuation
    where
        I: IntoIterator<Item = Literal>,
    {
        literals
            .into_iter()
            .filter_map(|l| {
                self.name_of(l.var())
                    .map(|p| (p.clone(), Formula::Constant(l.is_positive())))
            })
            .collect()
    }

    /// Writes this formula in the DIMACS family of formats.
    ///
    /// Propositional formulas are written in DIMACS, formulas with explicit dependencies in DQDIMACS, other ones in QDIMACS.
    pub fn write<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: Write + ?Sized,
    {
        writeln!(writer, "p cnf {} {}", self.n_vars, self.clauses.len())?;
        if !self.is_propositional() {
            for block in &self.prefix {
                match block {
                    CnfBlock::Exists(vars) => write_block(writer, 'e', vars)?,
                    CnfBlock::Forall(vars) => write_block(writer, 'a', vars)?,
                    CnfBlock::Dependent(vars) => {
                        for (v, deps) in vars {
                            write!(writer, "d {}", v)?;
                            for d in deps {
                                write!(writer, " {}", d)?;
                            }
                            writeln!(writer, " 0")?;
                        }
                    }
                }
            }
        }
        for cl in &self.clauses {
            for l in cl {
                write!(writer, "{} ", l)?;
            }
            writeln!(writer, "0")?;
        }
        Ok(())
    }

    /// Returns the text of this formula in the DIMACS family of formats (see [`QuantifiedCnf::write`]).
    pub fn to_dimacs_string(&self) -> String {
        let mut buffer = Vec::new();
        self.write(&mut buffer)
            .expect("writing to a vector does not fail");
        String::from_utf8_lossy(&buffer).to_string()
    }
}

#[derive(Default)]
struct VariableTable {
    names: Vec<Proposition>,
    variables: HashMap<Proposition, Variable>,
}

impl VariableTable {
    fn declare(&mut self, p: &Proposition) -> Result<Variable, SynthesisError> {
        if self.variables.contains_key(p) {
            return Err(SynthesisError::EncodingFailed(format!(
                "variable {} is quantified more than once",
                p
            )));
        }
        self.names.push(p.clone());
        let v = Variable::from(self.names.len());
        self.variables.insert(p.clone(), v);
        Ok(v)
    }
}

fn write_block<W>(writer: &mut W, kind: char, vars: &[Variable]) -> std::io::Result<()>
where
    W: Write + ?Sized,
{
    if vars.is_empty() {
        return Ok(());
    }
    write!(writer, "{}", kind)?;
    for v in vars {
        write!(writer, " {}", v)?;
    }
    writeln!(writer, " 0")
}

struct TseitinEncoder<'a> {
    variables: &'a HashMap<Proposition, Variable>,
    n_vars: usize,
    true_var: Option<Literal>,
    clauses: Vec<Vec<Literal>>,
}

impl TseitinEncoder<'_> {
    fn encode_root(&mut self, f: &Formula) -> Result<(), SynthesisError> {
        match f {
            Formula::Constant(true) => {}
            Formula::Constant(false) => self.clauses.push(vec![]),
            Formula::And(fs) => {
                for g in fs {
                    self.encode_root(g)?;
                }
            }
            Formula::Or(fs) => {
                let cl = fs
                    .iter()
                    .map(|g| self.literal(g))
                    .collect::<Result<Vec<_>, _>>()?;
                self.clauses.push(cl);
            }
            Formula::Implies(p, c) => {
                let cl = vec![self.literal(p)?.negate(), self.literal(c)?];
                self.clauses.push(cl);
            }
            _ => {
                let l = self.literal(f)?;
                self.clauses.push(vec![l]);
            }
        }
        Ok(())
    }

    fn fresh(&mut self) -> Literal {
        self.n_vars += 1;
        Literal::from(self.n_vars as isize)
    }

    fn literal(&mut self, f: &Formula) -> Result<Literal, SynthesisError> {
        Ok(match f {
            Formula::Constant(b) => {
                let t = match self.true_var {
                    Some(t) => t,
                    None => {
                        let t = self.fresh();
                        self.clauses.push(vec![t]);
                        self.true_var = Some(t);
                        t
                    }
                };
                if *b {
                    t
                } else {
                    t.negate()
                }
            }
            Formula::Atom(p) => self
                .variables
                .get(p)
                .map(|v| Literal::from(*v))
                .ok_or_else(|| {
                    SynthesisError::EncodingFailed(format!("free variable {} in matrix", p))
                })?,
            Formula::Not(g) => self.literal(g)?.negate(),
            Formula::And(fs) => {
                let lits = fs
                    .iter()
                    .map(|g| self.literal(g))
                    .collect::<Result<Vec<_>, _>>()?;
                let gate = self.fresh();
                let mut long = vec![gate];
                for l in lits {
                    self.clauses.push(vec![gate.negate(), l]);
                    long.push(l.negate());
                }
                self.clauses.push(long);
                gate
            }
            Formula::Or(fs) => {
                let lits = fs
                    .iter()
                    .map(|g| self.literal(g))
                    .collect::<Result<Vec<_>, _>>()?;
                let gate = self.fresh();
                let mut long = vec![gate.negate()];
                for l in lits {
                    self.clauses.push(vec![gate, l.negate()]);
                    long.push(l);
                }
                self.clauses.push(long);
                gate
            }
            Formula::Implies(p, c) => {
                let (lp, lc) = (self.literal(p)?, self.literal(c)?);
                let gate = self.fresh();
                self.clauses.push(vec![gate.negate(), lp.negate(), lc]);
                self.clauses.push(vec![gate, lp]);
                self.clauses.push(vec![gate, lc.negate()]);
                gate
            }
            Formula::Iff(l, r) => {
                let (ll, lr) = (self.literal(l)?, self.literal(r)?);
                let gate = self.fresh();
                self.clauses.push(vec![gate.negate(), ll.negate(), lr]);
                self.clauses.push(vec![gate.negate(), ll, lr.negate()]);
                self.clauses.push(vec![gate, ll, lr]);
                self.clauses.push(vec![gate, ll.negate(), lr.negate()]);
                gate
            }
            Formula::Indexed(_, _) | Formula::Compare(_, _, _) | Formula::Quantifier { .. } => {
                return Err(SynthesisError::EncodingFailed(format!(
                    "unexpected node in matrix: {}",
                    f
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        logic::QuantifierKind,
        sat::{default_solver, SolvingResult},
    };

    fn exists(vars: &[&str], scope: Formula) -> Formula {
        Formula::quantified(
            QuantifierKind::Exists,
            vars.iter().map(|v| Proposition::from(*v)).collect(),
            None,
            scope,
        )
    }

    fn cnf_of(f: &Formula) -> QuantifiedCnf {
        QuantifiedCnf::new(&PrenexFormula::new(f).unwrap()).unwrap()
    }

    #[test]
    fn test_clauses_at_root() {
        let f = exists(
            &["a", "b"],
            Formula::and([
                Formula::or([Formula::atom("a"), Formula::atom("b")]),
                Formula::not(Formula::atom("a")),
            ]),
        );
        let cnf = cnf_of(&f);
        assert_eq!("p cnf 2 2\n1 2 0\n-1 0\n", cnf.to_dimacs_string());
        assert!(cnf.is_propositional());
    }

    #[test]
    fn test_qdimacs_prefix() {
        let f = exists(
            &["a"],
            Formula::quantified(
                QuantifierKind::Forall,
                vec!["i".into()],
                None,
                exists(
                    &["b"],
                    Formula::iff(Formula::atom("b"), Formula::atom("i")),
                ),
            ),
        );
        let cnf = cnf_of(&f);
        assert_eq!(
            "p cnf 4 5\ne 1 0\na 2 0\ne 3 4 0\n-4 -3 2 0\n-4 3 -2 0\n4 3 2 0\n4 -3 -2 0\n4 0\n",
            cnf.to_dimacs_string()
        );
        assert_eq!(Some(&Proposition::from("i")), cnf.name_of(2.into()));
        assert_eq!(None, cnf.name_of(4.into()));
    }

    #[test]
    fn test_dqdimacs_prefix() {
        let f = Formula::quantified(
            QuantifierKind::Exists,
            vec!["f".into()],
            Some(1),
            Formula::quantified(
                QuantifierKind::Forall,
                vec!["x".into(), "y".into()],
                None,
                Formula::iff(Formula::indexed("f", vec!["x".into()]), Formula::atom("y")),
            ),
        );
        let cnf = cnf_of(&f);
        assert!(cnf.has_dependencies());
        let text = cnf.to_dimacs_string();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!("a 1 2 0", lines[1]);
        assert_eq!("d 3 1 0", lines[2]);
        assert_eq!("e 4 0", lines[3]);
    }

    #[test]
    fn test_free_variable() {
        let f = exists(&["a"], Formula::or([Formula::atom("a"), Formula::atom("b")]));
        assert!(matches!(
            QuantifiedCnf::new(&PrenexFormula::new(&f).unwrap()),
            Err(SynthesisError::EncodingFailed(_))
        ));
    }

    #[test]
    fn test_tseitin_is_equisatisfiable() {
        let a = || Formula::atom("a");
        let b = || Formula::atom("b");
        let c = || Formula::atom("c");
        let f = exists(
            &["a", "b", "c"],
            Formula::and([
                Formula::iff(a(), Formula::not(b())),
                Formula::implies(Formula::and([a(), c()]), b()),
                Formula::or([Formula::and([a(), c()]), Formula::and([b(), c()])]),
            ]),
        );
        let cnf = cnf_of(&f);
        let mut solver = default_solver();
        cnf.load_into(solver.as_mut());
        let assignment = match solver.solve().unwrap() {
            SolvingResult::Satisfiable(a) => a,
            _ => panic!(),
        };
        let valuation = cnf.valuation_of_assignment(&assignment);
        assert_eq!(3, valuation.len());
        let matrix = match &f {
            Formula::Quantifier { scope, .. } => scope.as_ref().clone(),
            _ => unreachable!(),
        };
        assert_eq!(Some(true), matrix.eval(&valuation).as_constant());
        assert_eq!(Some(false), valuation.value_of(&"a".into()));
    }

    #[test]
    fn test_constant_false_matrix() {
        let f = Formula::and([Formula::FALSE]);
        let cnf = cnf_of(&f);
        let mut solver = default_solver();
        cnf.load_into(solver.as_mut());
        assert_eq!(SolvingResult::Unsatisfiable, solver.solve().unwrap());
    }
}
