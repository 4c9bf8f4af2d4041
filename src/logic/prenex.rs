use super::{Formula, Proposition, QuantifierKind};
use crate::SynthesisError;
use std::collections::{HashMap, HashSet};

/// A block of quantified variables of a prenex formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantifierBlock {
    /// Existentially quantified variables.
    Exists(Vec<Proposition>),
    /// Universally quantified variables.
    Forall(Vec<Proposition>),
    /// Existentially quantified variables, each one with its own dependency set.
    Dependent(Vec<(Proposition, Vec<Proposition>)>),
}

impl QuantifierBlock {
    /// Returns the variables quantified by this block.
    pub fn variables(&self) -> Vec<&Proposition> {
        match self {
            QuantifierBlock::Exists(vars) | QuantifierBlock::Forall(vars) => vars.iter().collect(),
            QuantifierBlock::Dependent(vars) => vars.iter().map(|(v, _)| v).collect(),
        }
    }
}

/// A formula in prenex form: a quantifier prefix followed by a quantifier-free matrix.
///
/// Indexed families are not allowed in the matrix.
/// When the source formula has dependency-restricted families, each application of a family is replaced by a fresh variable depending on the application arguments,
/// and functional consistency constraints are added between the applications of a same family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrenexFormula {
    prefix: Vec<QuantifierBlock>,
    matrix: Formula,
}

struct QuantifierLevel<'a> {
    kind: QuantifierKind,
    variables: &'a [Proposition],
    arity: Option<usize>,
}

/// Returns the name of the variable replacing the application of a family to some arguments.
pub fn application_name(family: &Proposition, args: &[Proposition]) -> Proposition {
    Proposition::new(format!(
        "{}({})",
        family,
        args.iter()
            .map(|a| a.name())
            .collect::<Vec<&str>>()
            .join(",")
    ))
}

impl PrenexFormula {
    /// Computes the prenex form of a formula.
    ///
    /// The formula must be a chain of quantifiers ending in a quantifier-free, comparison-free matrix.
    pub fn new(formula: &Formula) -> Result<Self, SynthesisError> {
        let mut levels = vec![];
        let mut current = formula;
        while let Formula::Quantifier {
            kind,
            variables,
            arity,
            scope,
        } = current
        {
            levels.push(QuantifierLevel {
                kind: *kind,
                variables,
                arity: *arity,
            });
            current = scope;
        }
        check_matrix(current)?;
        if levels.iter().all(|l| l.arity.is_none()) {
            Self::new_without_dependencies(&levels, current)
        } else {
            Self::new_with_dependencies(&levels, current)
        }
    }

    fn new_without_dependencies(
        levels: &[QuantifierLevel],
        matrix: &Formula,
    ) -> Result<Self, SynthesisError> {
        let mut indexed = None;
        matrix.visit(&mut |f| {
            if let Formula::Indexed(family, _) = f {
                indexed.get_or_insert_with(|| family.clone());
            }
        });
        if let Some(family) = indexed {
            return Err(SynthesisError::EncodingFailed(format!(
                "family {} is applied but not quantified with a dependency arity",
                family
            )));
        }
        let mut prefix: Vec<QuantifierBlock> = vec![];
        for level in levels {
            let vars = level.variables.to_vec();
            match (prefix.last_mut(), level.kind) {
                (Some(QuantifierBlock::Exists(prev)), QuantifierKind::Exists)
                | (Some(QuantifierBlock::Forall(prev)), QuantifierKind::Forall) => {
                    prev.extend(vars)
                }
                (_, QuantifierKind::Exists) => prefix.push(QuantifierBlock::Exists(vars)),
                (_, QuantifierKind::Forall) => prefix.push(QuantifierBlock::Forall(vars)),
            }
        }
        Ok(Self {
            prefix,
            matrix: matrix.clone(),
        })
    }

    fn new_with_dependencies(
        levels: &[QuantifierLevel],
        matrix: &Formula,
    ) -> Result<Self, SynthesisError> {
        let universals = levels
            .iter()
            .filter(|l| l.kind == QuantifierKind::Forall)
            .flat_map(|l| l.variables.iter().cloned())
            .collect::<Vec<Proposition>>();
        let mut families = HashMap::new();
        let mut plain = vec![];
        let mut n_seen_universals = 0;
        for level in levels {
            match (level.kind, level.arity) {
                (QuantifierKind::Forall, _) => n_seen_universals += level.variables.len(),
                (QuantifierKind::Exists, Some(n)) => {
                    if n > universals.len() {
                        return Err(SynthesisError::EncodingFailed(format!(
                            "dependency arity {} exceeds the {} universal variables",
                            n,
                            universals.len()
                        )));
                    }
                    level.variables.iter().for_each(|f| {
                        families.insert(f.clone(), n);
                    });
                }
                (QuantifierKind::Exists, None) => level.variables.iter().for_each(|v| {
                    plain.push((v.clone(), universals[..n_seen_universals].to_vec()));
                }),
            }
        }
        let mut applications = Applications {
            universals: &universals,
            families: &families,
            per_family: vec![],
            family_indices: HashMap::new(),
        };
        let replaced = applications.replace(matrix)?;
        let mut consistency = vec![];
        let mut dependent = plain;
        for (family, apps) in applications.per_family.iter() {
            for (i, args_i) in apps.iter().enumerate() {
                dependent.push((application_name(family, args_i), args_i.clone()));
                for args_j in apps.iter().skip(i + 1) {
                    consistency.push(Formula::implies(
                        Formula::and(
                            args_i
                                .iter()
                                .zip(args_j.iter())
                                .map(|(a, b)| {
                                    Formula::iff(Formula::Atom(a.clone()), Formula::Atom(b.clone()))
                                }),
                        ),
                        Formula::iff(
                            Formula::Atom(application_name(family, args_i)),
                            Formula::Atom(application_name(family, args_j)),
                        ),
                    ));
                }
            }
        }
        let mut prefix = vec![QuantifierBlock::Forall(universals.clone())];
        if !dependent.is_empty() {
            prefix.push(QuantifierBlock::Dependent(dependent));
        }
        Ok(Self {
            prefix,
            matrix: Formula::and(std::iter::once(replaced).chain(consistency)),
        })
    }

    /// Returns the quantifier prefix.
    pub fn prefix(&self) -> &[QuantifierBlock] {
        &self.prefix
    }

    /// Returns the quantifier-free matrix.
    pub fn matrix(&self) -> &Formula {
        &self.matrix
    }

    /// Returns `true` iff some variables of the prefix have explicit dependency sets.
    pub fn has_dependencies(&self) -> bool {
        self.prefix
            .iter()
            .any(|b| matches!(b, QuantifierBlock::Dependent(_)))
    }

    /// Returns the variables of the outermost block if it is existential.
    pub fn outermost_existentials(&self) -> &[Proposition] {
        match self.prefix.first() {
            Some(QuantifierBlock::Exists(vars)) => vars,
            _ => &[],
        }
    }

    /// Returns the number of quantifier alternations plus one (0 for an empty prefix).
    pub fn n_levels(&self) -> usize {
        self.prefix.len()
    }
}

fn check_matrix(matrix: &Formula) -> Result<(), SynthesisError> {
    let mut error = None;
    matrix.visit(&mut |f| match f {
        Formula::Quantifier { .. } if error.is_none() => {
            error = Some("a quantifier is nested inside the matrix")
        }
        Formula::Compare(_, _, _) if error.is_none() => {
            error = Some("a comparison was not expanded before prenex normalization")
        }
        _ => {}
    });
    match error {
        Some(e) => Err(SynthesisError::EncodingFailed(e.to_string())),
        None => Ok(()),
    }
}

struct Applications<'a> {
    universals: &'a [Proposition],
    families: &'a HashMap<Proposition, usize>,
    per_family: Vec<(Proposition, Vec<Vec<Proposition>>)>,
    family_indices: HashMap<Proposition, usize>,
}

impl Applications<'_> {
    fn replace(&mut self, formula: &Formula) -> Result<Formula, SynthesisError> {
        Ok(match formula {
            Formula::Constant(_) | Formula::Atom(_) => formula.clone(),
            Formula::Indexed(family, args) => {
                self.register(family, args)?;
                Formula::Atom(application_name(family, args))
            }
            Formula::Not(f) => Formula::not(self.replace(f)?),
            Formula::And(fs) => Formula::and(
                fs.iter()
                    .map(|f| self.replace(f))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Formula::Or(fs) => Formula::or(
                fs.iter()
                    .map(|f| self.replace(f))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Formula::Implies(p, c) => Formula::implies(self.replace(p)?, self.replace(c)?),
            Formula::Iff(l, r) => Formula::iff(self.replace(l)?, self.replace(r)?),
            Formula::Compare(_, _, _) | Formula::Quantifier { .. } => unreachable!(),
        })
    }

    fn register(&mut self, family: &Proposition, args: &[Proposition]) -> Result<(), SynthesisError> {
        let arity = *self.families.get(family).ok_or_else(|| {
            SynthesisError::EncodingFailed(format!(
                "family {} is applied but not quantified with a dependency arity",
                family
            ))
        })?;
        let visible = self.universals[..arity].iter().collect::<HashSet<_>>();
        if let Some(a) = args.iter().find(|a| !visible.contains(a)) {
            return Err(SynthesisError::EncodingFailed(format!(
                "family {} is applied to {}, which is not among the universal variables it may depend on",
                family, a
            )));
        }
        let index = match self.family_indices.get(family) {
            Some(i) => *i,
            None => {
                self.per_family.push((family.clone(), vec![]));
                self.family_indices
                    .insert(family.clone(), self.per_family.len() - 1);
                self.per_family.len() - 1
            }
        };
        let apps = &mut self.per_family[index].1;
        if let Some(first) = apps.first() {
            if first.len() != args.len() {
                return Err(SynthesisError::EncodingFailed(format!(
                    "family {} is applied to lists of arguments of different lengths",
                    family
                )));
            }
        }
        if !apps.iter().any(|a| a == args) {
            apps.push(args.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Proposition {
        Proposition::from(s)
    }

    fn exists(vars: &[&str], arity: Option<usize>, scope: Formula) -> Formula {
        Formula::quantified(
            QuantifierKind::Exists,
            vars.iter().map(|v| p(v)).collect(),
            arity,
            scope,
        )
    }

    fn forall(vars: &[&str], scope: Formula) -> Formula {
        Formula::quantified(
            QuantifierKind::Forall,
            vars.iter().map(|v| p(v)).collect(),
            None,
            scope,
        )
    }

    #[test]
    fn test_merge_adjacent_blocks() {
        let f = exists(
            &["a"],
            None,
            exists(
                &["b"],
                None,
                forall(
                    &["i"],
                    exists(
                        &["c"],
                        None,
                        Formula::and([Formula::atom("a"), Formula::atom("b"), Formula::atom("c")]),
                    ),
                ),
            ),
        );
        let prenex = PrenexFormula::new(&f).unwrap();
        assert_eq!(
            &[
                QuantifierBlock::Exists(vec![p("a"), p("b")]),
                QuantifierBlock::Forall(vec![p("i")]),
                QuantifierBlock::Exists(vec![p("c")]),
            ],
            prenex.prefix()
        );
        assert_eq!(&[p("a"), p("b")], prenex.outermost_existentials());
        assert!(!prenex.has_dependencies());
    }

    #[test]
    fn test_ackermann_expansion() {
        let matrix = Formula::and([
            Formula::indexed("f", vec![p("x")]),
            Formula::not(Formula::indexed("f", vec![p("y")])),
        ]);
        let f = exists(&["f"], Some(2), forall(&["x", "y"], matrix));
        let prenex = PrenexFormula::new(&f).unwrap();
        assert!(prenex.has_dependencies());
        assert_eq!(
            &[
                QuantifierBlock::Forall(vec![p("x"), p("y")]),
                QuantifierBlock::Dependent(vec![
                    (p("f(x)"), vec![p("x")]),
                    (p("f(y)"), vec![p("y")]),
                ]),
            ],
            prenex.prefix()
        );
        let mut consistency_found = false;
        prenex.matrix().visit(&mut |g| {
            if let Formula::Implies(premise, _) = g {
                assert_eq!(
                    &Formula::iff(Formula::atom("x"), Formula::atom("y")),
                    premise.as_ref()
                );
                consistency_found = true;
            }
        });
        assert!(consistency_found);
    }

    #[test]
    fn test_dependency_out_of_arity() {
        let f = exists(
            &["f"],
            Some(1),
            forall(&["x", "y"], Formula::indexed("f", vec![p("y")])),
        );
        assert!(matches!(
            PrenexFormula::new(&f),
            Err(SynthesisError::EncodingFailed(_))
        ));
    }

    #[test]
    fn test_unquantified_family() {
        let f = forall(&["x"], Formula::indexed("f", vec![p("x")]));
        assert!(matches!(
            PrenexFormula::new(&f),
            Err(SynthesisError::EncodingFailed(_))
        ));
    }

    #[test]
    fn test_nested_quantifier_in_matrix() {
        let f = Formula::and([
            Formula::atom("a"),
            exists(&["b"], None, Formula::atom("b")),
        ]);
        assert!(PrenexFormula::new(&f).is_err());
    }
}
