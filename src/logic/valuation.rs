use super::{Formula, Proposition};
use std::collections::{hash_map, HashMap};

/// A mapping from propositions to formulas.
///
/// Direct assignments map propositions to constants.
/// Certified Skolem functions map propositions to formulas over the universal variables they depend on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Valuation(HashMap<Proposition, Formula>);

impl Valuation {
    /// Sets the formula associated with a proposition, returning the previous one if any.
    pub fn insert(&mut self, p: Proposition, value: Formula) -> Option<Formula> {
        self.0.insert(p, value)
    }

    /// Returns the formula associated with a proposition.
    pub fn get(&self, p: &Proposition) -> Option<&Formula> {
        self.0.get(p)
    }

    /// Returns the constant value associated with a proposition, if the associated formula is a constant.
    pub fn value_of(&self, p: &Proposition) -> Option<bool> {
        self.0.get(p).and_then(|f| f.as_constant())
    }

    /// Returns `true` iff the proposition is associated with a formula.
    pub fn contains(&self, p: &Proposition) -> bool {
        self.0.contains_key(p)
    }

    /// Returns the number of propositions in this valuation.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` iff this valuation is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the pairs (proposition, formula).
    pub fn iter(&self) -> hash_map::Iter<'_, Proposition, Formula> {
        self.0.iter()
    }

    /// Adds all the entries of another valuation, replacing the ones already set.
    pub fn merge(&mut self, other: Valuation) {
        self.0.extend(other.0)
    }
}

impl FromIterator<(Proposition, Formula)> for Valuation {
    fn from_iter<T: IntoIterator<Item = (Proposition, Formula)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Valuation {
    type Item = (Proposition, Formula);
    type IntoIter = hash_map::IntoIter<Proposition, Formula>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Returns the valuation of the propositions encoded by an integer.
///
/// Proposition `k` is set to the bit `k` of `index`.
pub fn valuation_of_index(propositions: &[Proposition], index: usize) -> Valuation {
    propositions
        .iter()
        .enumerate()
        .map(|(k, p)| (p.clone(), Formula::Constant((index >> k) & 1 == 1)))
        .collect()
}

/// Returns the conjunction of literals which holds only for the valuation encoded by an integer (see [`valuation_of_index`]).
pub fn minterm_of_index(propositions: &[Proposition], index: usize) -> Formula {
    Formula::and(propositions.iter().enumerate().map(|(k, p)| {
        let atom = Formula::Atom(p.clone());
        if (index >> k) & 1 == 1 {
            atom
        } else {
            Formula::not(atom)
        }
    }))
}

/// Returns the string of `n_bits` digits encoding an integer, starting by bit 0.
pub fn bit_string(index: usize, n_bits: usize) -> String {
    (0..n_bits)
        .map(|k| if (index >> k) & 1 == 1 { '1' } else { '0' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> Vec<Proposition> {
        vec!["a".into(), "b".into()]
    }

    #[test]
    fn test_valuation_of_index() {
        let v = valuation_of_index(&props(), 2);
        assert_eq!(Some(false), v.value_of(&"a".into()));
        assert_eq!(Some(true), v.value_of(&"b".into()));
    }

    #[test]
    fn test_minterm_holds_only_for_its_index() {
        for i in 0..4 {
            for j in 0..4 {
                let value = minterm_of_index(&props(), i)
                    .eval(&valuation_of_index(&props(), j))
                    .as_constant()
                    .unwrap();
                assert_eq!(i == j, value);
            }
        }
    }

    #[test]
    fn test_bit_string() {
        assert_eq!("100", bit_string(1, 3));
        assert_eq!("011", bit_string(6, 3));
        assert_eq!("", bit_string(0, 0));
    }

    #[test]
    fn test_merge() {
        let mut v = valuation_of_index(&props(), 0);
        v.merge(valuation_of_index(&["b".into(), "c".into()], 3));
        assert_eq!(3, v.len());
        assert_eq!(Some(true), v.value_of(&"b".into()));
    }
}
