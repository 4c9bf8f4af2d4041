use super::Valuation;
use crate::SynthesisError;
use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
};

/// A named Boolean variable.
///
/// Propositions are compared by name.
/// They are used both as plain atoms and as the names of indexed families.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Proposition(String);

impl Proposition {
    /// Builds a proposition from its name.
    pub fn new<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Self(name.into())
    }

    /// Returns the name of the proposition.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Proposition {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Proposition {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Display for Proposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of a quantifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantifierKind {
    /// Existential quantification.
    Exists,
    /// Universal quantification.
    Forall,
}

/// The comparison operators available between ranking terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// Strictly less than.
    Less,
    /// Less than or equal to.
    LessOrEqual,
}

/// A formula over propositions and indexed families.
///
/// Formulas should be built through the associated functions ([`Formula::and`], [`Formula::implies`], ...)
/// which fold constants as they go.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    /// A Boolean constant.
    Constant(bool),
    /// A proposition.
    Atom(Proposition),
    /// An application of an indexed family to a list of propositions.
    Indexed(Proposition, Vec<Proposition>),
    /// A negation.
    Not(Box<Formula>),
    /// A conjunction (the empty conjunction is `true`).
    And(Vec<Formula>),
    /// A disjunction (the empty disjunction is `false`).
    Or(Vec<Formula>),
    /// An implication.
    Implies(Box<Formula>, Box<Formula>),
    /// An equivalence.
    Iff(Box<Formula>, Box<Formula>),
    /// A numeric comparison between two ranking terms.
    ///
    /// Both operands are [`Formula::Indexed`] terms naming a family of bits.
    Compare(Comparison, Box<Formula>, Box<Formula>),
    /// A quantified sub-formula.
    ///
    /// When `arity` is set, the quantified variables are families which may only depend on the first `arity` universal variables of the enclosed universal block.
    Quantifier {
        /// The kind of quantifier.
        kind: QuantifierKind,
        /// The quantified variables.
        variables: Vec<Proposition>,
        /// The dependency arity, if any.
        arity: Option<usize>,
        /// The scope of the quantifier.
        scope: Box<Formula>,
    },
}

impl Formula {
    /// The `true` constant.
    pub const TRUE: Formula = Formula::Constant(true);

    /// The `false` constant.
    pub const FALSE: Formula = Formula::Constant(false);

    /// Builds an atom.
    pub fn atom<P>(p: P) -> Self
    where
        P: Into<Proposition>,
    {
        Formula::Atom(p.into())
    }

    /// Builds an indexed term.
    pub fn indexed<P>(family: P, args: Vec<Proposition>) -> Self
    where
        P: Into<Proposition>,
    {
        Formula::Indexed(family.into(), args)
    }

    /// Builds the negation of a formula.
    #[allow(clippy::should_implement_trait)]
    pub fn not(f: Formula) -> Self {
        match f {
            Formula::Constant(b) => Formula::Constant(!b),
            Formula::Not(inner) => *inner,
            _ => Formula::Not(Box::new(f)),
        }
    }

    /// Builds a conjunction, flattening nested conjunctions and folding constants.
    pub fn and<I>(operands: I) -> Self
    where
        I: IntoIterator<Item = Formula>,
    {
        let mut flat = Vec::new();
        for f in operands {
            match f {
                Formula::Constant(true) => {}
                Formula::Constant(false) => return Formula::FALSE,
                Formula::And(inner) => flat.extend(inner),
                _ => flat.push(f),
            }
        }
        match flat.len() {
            0 => Formula::TRUE,
            1 => flat.pop().unwrap(),
            _ => Formula::And(flat),
        }
    }

    /// Builds a disjunction, flattening nested disjunctions and folding constants.
    pub fn or<I>(operands: I) -> Self
    where
        I: IntoIterator<Item = Formula>,
    {
        let mut flat = Vec::new();
        for f in operands {
            match f {
                Formula::Constant(false) => {}
                Formula::Constant(true) => return Formula::TRUE,
                Formula::Or(inner) => flat.extend(inner),
                _ => flat.push(f),
            }
        }
        match flat.len() {
            0 => Formula::FALSE,
            1 => flat.pop().unwrap(),
            _ => Formula::Or(flat),
        }
    }

    /// Builds an implication.
    pub fn implies(premise: Formula, conclusion: Formula) -> Self {
        match (premise, conclusion) {
            (Formula::Constant(false), _) | (_, Formula::Constant(true)) => Formula::TRUE,
            (Formula::Constant(true), c) => c,
            (p, Formula::Constant(false)) => Formula::not(p),
            (p, c) => Formula::Implies(Box::new(p), Box::new(c)),
        }
    }

    /// Builds an equivalence.
    pub fn iff(lhs: Formula, rhs: Formula) -> Self {
        match (lhs, rhs) {
            (Formula::Constant(true), f) | (f, Formula::Constant(true)) => f,
            (Formula::Constant(false), f) | (f, Formula::Constant(false)) => Formula::not(f),
            (l, r) => Formula::Iff(Box::new(l), Box::new(r)),
        }
    }

    /// Builds a comparison between two ranking terms.
    pub fn compare(comparison: Comparison, lhs: Formula, rhs: Formula) -> Self {
        Formula::Compare(comparison, Box::new(lhs), Box::new(rhs))
    }

    /// Builds a quantified formula.
    ///
    /// Quantifying no variables, or quantifying a constant, returns the scope itself.
    pub fn quantified(
        kind: QuantifierKind,
        variables: Vec<Proposition>,
        arity: Option<usize>,
        scope: Formula,
    ) -> Self {
        if variables.is_empty() || matches!(scope, Formula::Constant(_)) {
            return scope;
        }
        Formula::Quantifier {
            kind,
            variables,
            arity,
            scope: Box::new(scope),
        }
    }

    /// Returns the value of this formula if it is a constant.
    pub fn as_constant(&self) -> Option<bool> {
        match self {
            Formula::Constant(b) => Some(*b),
            _ => None,
        }
    }

    /// Substitutes the propositions assigned by the valuation and simplifies the result.
    ///
    /// Quantified variables which are assigned are removed from their quantifier.
    /// Indexed terms are left untouched.
    pub fn eval(&self, valuation: &Valuation) -> Formula {
        self.replace(&|p| valuation.get(p).cloned())
    }

    /// Replaces atoms for which the provided function returns a formula.
    ///
    /// Quantified variables for which a replacement is returned are dropped from their quantifier.
    pub fn replace(&self, replacement: &dyn Fn(&Proposition) -> Option<Formula>) -> Formula {
        match self {
            Formula::Constant(_) | Formula::Indexed(_, _) => self.clone(),
            Formula::Atom(p) => replacement(p).unwrap_or_else(|| self.clone()),
            Formula::Not(f) => Formula::not(f.replace(replacement)),
            Formula::And(fs) => Formula::and(fs.iter().map(|f| f.replace(replacement))),
            Formula::Or(fs) => Formula::or(fs.iter().map(|f| f.replace(replacement))),
            Formula::Implies(p, c) => {
                Formula::implies(p.replace(replacement), c.replace(replacement))
            }
            Formula::Iff(l, r) => Formula::iff(l.replace(replacement), r.replace(replacement)),
            Formula::Compare(op, l, r) => {
                Formula::compare(*op, l.replace(replacement), r.replace(replacement))
            }
            Formula::Quantifier {
                kind,
                variables,
                arity,
                scope,
            } => {
                let kept = variables
                    .iter()
                    .filter(|v| replacement(v).is_none())
                    .cloned()
                    .collect();
                Formula::quantified(*kind, kept, *arity, scope.replace(replacement))
            }
        }
    }

    /// Replaces every comparison by a bit-level circuit over `n_bits` bits.
    ///
    /// The bits of a ranking term `f(args)` are the terms `f_0(args)`, ..., `f_{n-1}(args)` (see [`ranking_bit`]), bit 0 being the least significant.
    /// Terms without arguments become atoms.
    pub fn expand_comparisons(&self, n_bits: usize) -> Result<Formula, SynthesisError> {
        Ok(match self {
            Formula::Constant(_) | Formula::Atom(_) | Formula::Indexed(_, _) => self.clone(),
            Formula::Not(f) => Formula::not(f.expand_comparisons(n_bits)?),
            Formula::And(fs) => Formula::and(
                fs.iter()
                    .map(|f| f.expand_comparisons(n_bits))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Formula::Or(fs) => Formula::or(
                fs.iter()
                    .map(|f| f.expand_comparisons(n_bits))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Formula::Implies(p, c) => {
                Formula::implies(p.expand_comparisons(n_bits)?, c.expand_comparisons(n_bits)?)
            }
            Formula::Iff(l, r) => {
                Formula::iff(l.expand_comparisons(n_bits)?, r.expand_comparisons(n_bits)?)
            }
            Formula::Compare(op, l, r) => {
                let lhs = term_bits(l, n_bits)?;
                let rhs = term_bits(r, n_bits)?;
                match op {
                    Comparison::Less => less_than(&lhs, &rhs),
                    Comparison::LessOrEqual => {
                        Formula::or([less_than(&lhs, &rhs), equal(&lhs, &rhs)])
                    }
                }
            }
            Formula::Quantifier {
                kind,
                variables,
                arity,
                scope,
            } => Formula::quantified(
                *kind,
                variables.clone(),
                *arity,
                scope.expand_comparisons(n_bits)?,
            ),
        })
    }

    /// Returns the propositions occurring free in this formula.
    ///
    /// For indexed terms, both the family name and the arguments are considered.
    pub fn free_variables(&self) -> HashSet<Proposition> {
        let mut bound = HashMap::new();
        let mut free = HashSet::new();
        collect_free_variables(self, &mut bound, &mut free);
        free
    }

    /// Returns `true` iff no proposition occurs free in this formula.
    pub fn is_bounded(&self) -> bool {
        self.free_variables().is_empty()
    }

    /// Calls the provided function on each node of this formula, in pre-order.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a Formula)) {
        f(self);
        match self {
            Formula::Constant(_) | Formula::Atom(_) | Formula::Indexed(_, _) => {}
            Formula::Not(g) => g.visit(f),
            Formula::And(gs) | Formula::Or(gs) => gs.iter().for_each(|g| g.visit(f)),
            Formula::Implies(l, r) | Formula::Iff(l, r) | Formula::Compare(_, l, r) => {
                l.visit(f);
                r.visit(f);
            }
            Formula::Quantifier { scope, .. } => scope.visit(f),
        }
    }
}

fn collect_free_variables(
    formula: &Formula,
    bound: &mut HashMap<Proposition, usize>,
    free: &mut HashSet<Proposition>,
) {
    let mut check = |p: &Proposition| {
        if !bound.contains_key(p) {
            free.insert(p.clone());
        }
    };
    match formula {
        Formula::Constant(_) => {}
        Formula::Atom(p) => check(p),
        Formula::Indexed(family, args) => {
            check(family);
            args.iter().for_each(check);
        }
        Formula::Not(f) => collect_free_variables(f, bound, free),
        Formula::And(fs) | Formula::Or(fs) => fs
            .iter()
            .for_each(|f| collect_free_variables(f, bound, free)),
        Formula::Implies(l, r) | Formula::Iff(l, r) | Formula::Compare(_, l, r) => {
            collect_free_variables(l, bound, free);
            collect_free_variables(r, bound, free);
        }
        Formula::Quantifier {
            variables, scope, ..
        } => {
            variables
                .iter()
                .for_each(|v| *bound.entry(v.clone()).or_insert(0) += 1);
            collect_free_variables(scope, bound, free);
            variables.iter().for_each(|v| {
                let n = bound.get_mut(v).unwrap();
                *n -= 1;
                if *n == 0 {
                    bound.remove(v);
                }
            });
        }
    }
}

/// Returns the name of the bit `k` of a ranking family.
pub fn ranking_bit(family: &Proposition, k: usize) -> Proposition {
    Proposition::new(format!("{}_{}", family, k))
}

fn term_bits(term: &Formula, n_bits: usize) -> Result<Vec<Formula>, SynthesisError> {
    match term {
        Formula::Indexed(family, args) => Ok((0..n_bits)
            .map(|k| {
                let bit = ranking_bit(family, k);
                if args.is_empty() {
                    Formula::Atom(bit)
                } else {
                    Formula::Indexed(bit, args.clone())
                }
            })
            .collect()),
        _ => Err(SynthesisError::EncodingFailed(format!(
            "comparison operand {} is not an indexed term",
            term
        ))),
    }
}

fn less_than(lhs: &[Formula], rhs: &[Formula]) -> Formula {
    Formula::or((0..lhs.len()).rev().map(|k| {
        Formula::and(
            [Formula::not(lhs[k].clone()), rhs[k].clone()]
                .into_iter()
                .chain((k + 1..lhs.len()).map(|j| Formula::iff(lhs[j].clone(), rhs[j].clone()))),
        )
    }))
}

fn equal(lhs: &[Formula], rhs: &[Formula]) -> Formula {
    Formula::and(
        lhs.iter()
            .zip(rhs.iter())
            .map(|(l, r)| Formula::iff(l.clone(), r.clone())),
    )
}

fn fmt_nary(
    f: &mut std::fmt::Formatter<'_>,
    operands: &[Formula],
    op: &str,
    empty: &str,
) -> std::fmt::Result {
    if operands.is_empty() {
        return write!(f, "{}", empty);
    }
    write!(f, "(")?;
    for (i, o) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", o)?;
    }
    write!(f, ")")
}

impl Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Formula::Constant(b) => write!(f, "{}", b),
            Formula::Atom(p) => write!(f, "{}", p),
            Formula::Indexed(family, args) => write!(
                f,
                "{}({})",
                family,
                args.iter()
                    .map(|a| a.name())
                    .collect::<Vec<&str>>()
                    .join(", ")
            ),
            Formula::Not(g) => write!(f, "!{}", g),
            Formula::And(gs) => fmt_nary(f, gs, "&", "true"),
            Formula::Or(gs) => fmt_nary(f, gs, "|", "false"),
            Formula::Implies(l, r) => write!(f, "({} -> {})", l, r),
            Formula::Iff(l, r) => write!(f, "({} <-> {})", l, r),
            Formula::Compare(op, l, r) => {
                let op = match op {
                    Comparison::Less => "<",
                    Comparison::LessOrEqual => "<=",
                };
                write!(f, "({} {} {})", l, op, r)
            }
            Formula::Quantifier {
                kind,
                variables,
                arity,
                scope,
            } => {
                let q = match kind {
                    QuantifierKind::Exists => "exists",
                    QuantifierKind::Forall => "forall",
                };
                write!(f, "{}", q)?;
                if let Some(n) = arity {
                    write!(f, "[{}]", n)?;
                }
                for v in variables {
                    write!(f, " {}", v)?;
                }
                write!(f, ". {}", scope)
            }
        }
    }
}
