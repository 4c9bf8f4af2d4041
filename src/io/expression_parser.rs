use crate::logic::{Formula, Proposition};
use anyhow::{anyhow, Context, Result};
use pest::{iterators::Pair, Parser};
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "io/guard.pest"]
struct GuardGrammar;

/// Parses a Boolean expression over a set of known propositions.
///
/// From the lowest to the highest precedence, the operators are `<->`, `->` (right associative), `|`, `&` and `!`.
/// Atoms are `true`, `false`, the known propositions, and parenthesized expressions.
pub(crate) struct ExpressionParser<'a> {
    known: &'a dyn Fn(&str) -> bool,
}

impl<'a> ExpressionParser<'a> {
    pub(crate) fn new(known: &'a dyn Fn(&str) -> bool) -> Self {
        Self { known }
    }

    /// Parses an expression, returning the formula and the propositions it uses.
    pub(crate) fn parse(&self, text: &str) -> Result<(Formula, Vec<Proposition>)> {
        let mut pairs = GuardGrammar::parse(Rule::expression, text)
            .with_context(|| format!(r#"while parsing expression "{}""#, text.trim()))?;
        let root = pairs
            .next()
            .and_then(|e| e.into_inner().next())
            .ok_or_else(|| anyhow!("empty expression"))?;
        let mut used = vec![];
        let formula = self.parse_pair(root, &mut used)?;
        Ok((formula, used))
    }

    fn parse_pair(&self, pair: Pair<Rule>, used: &mut Vec<Proposition>) -> Result<Formula> {
        match pair.as_rule() {
            Rule::iff => self
                .parse_operands(pair, used)?
                .into_iter()
                .reduce(Formula::iff)
                .ok_or_else(|| anyhow!("missing operand of <->")),
            Rule::implies => self
                .parse_operands(pair, used)?
                .into_iter()
                .rev()
                .reduce(|conclusion, premise| Formula::implies(premise, conclusion))
                .ok_or_else(|| anyhow!("missing operand of ->")),
            Rule::disjunction => Ok(Formula::or(self.parse_operands(pair, used)?)),
            Rule::conjunction => Ok(Formula::and(self.parse_operands(pair, used)?)),
            Rule::negation => {
                let mut negated = false;
                let mut operand = None;
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::not => negated = !negated,
                        _ => operand = Some(self.parse_pair(p, used)?),
                    }
                }
                let f = operand.ok_or_else(|| anyhow!("missing operand of !"))?;
                Ok(if negated { Formula::not(f) } else { f })
            }
            Rule::constant => Ok(Formula::Constant(pair.as_str() == "true")),
            Rule::name => {
                let n = pair.as_str();
                if !(self.known)(n) {
                    return Err(anyhow!("undeclared proposition {}", n));
                }
                let p = Proposition::from(n);
                if !used.contains(&p) {
                    used.push(p.clone());
                }
                Ok(Formula::Atom(p))
            }
            r => Err(anyhow!("unexpected {:?} in expression", r)),
        }
    }

    fn parse_operands(&self, pair: Pair<Rule>, used: &mut Vec<Proposition>) -> Result<Vec<Formula>> {
        pair.into_inner().map(|p| self.parse_pair(p, used)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::Valuation;

    fn known(name: &str) -> bool {
        ["a", "b", "c", "true_a"].contains(&name)
    }

    fn parse(text: &str) -> Result<Formula> {
        ExpressionParser::new(&known).parse(text).map(|(f, _)| f)
    }

    fn eval(f: &Formula, a: bool, b: bool, c: bool) -> bool {
        let valuation = [("a", a), ("b", b), ("c", c)]
            .into_iter()
            .map(|(p, v)| (Proposition::from(p), Formula::Constant(v)))
            .collect::<Valuation>();
        f.eval(&valuation).as_constant().unwrap()
    }

    fn check_semantics(text: &str, expected: &dyn Fn(bool, bool, bool) -> bool) {
        let f = parse(text).unwrap();
        for i in 0..8 {
            let (a, b, c) = (i & 1 == 1, i & 2 == 2, i & 4 == 4);
            assert_eq!(expected(a, b, c), eval(&f, a, b, c), "{} on {}", text, i);
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(Formula::TRUE, parse("true").unwrap());
        assert_eq!(Formula::FALSE, parse(" ( false ) ").unwrap());
        assert_eq!(Formula::FALSE, parse("!true").unwrap());
        assert_eq!(Formula::atom("true_a"), parse("true_a").unwrap());
    }

    #[test]
    fn test_precedence() {
        check_semantics("a | b & c", &|a, b, c| a || (b && c));
        check_semantics("!a & b", &|a, b, _| !a && b);
        check_semantics("!!a", &|a, _, _| a);
        check_semantics("a & b <-> c", &|a, b, c| (a && b) == c);
        check_semantics("a -> b <-> c", &|a, b, c| (!a || b) == c);
        check_semantics("a | b -> c", &|a, b, c| !(a || b) || c);
    }

    #[test]
    fn test_implication_is_right_associative() {
        check_semantics("a -> b -> c", &|a, b, c| !a || !b || c);
        check_semantics("(a -> b) -> c", &|a, b, c| !(!a || b) || c);
    }

    #[test]
    fn test_used_propositions() {
        let (_, used) = ExpressionParser::new(&known)
            .parse("b & !(b | a)")
            .unwrap();
        assert_eq!(vec![Proposition::from("b"), Proposition::from("a")], used);
    }

    #[test]
    fn test_errors() {
        for text in ["", "a &", "(a", "a)", "a b", "d", "a + b", "!", "a <- b"] {
            assert!(parse(text).is_err(), "{}", text);
        }
    }
}
