use crate::logic::{CnfBlock, Formula, QuantifiedCnf, Valuation};
use crate::sat::Variable;
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;

/// A certificate given as an ASCII AIGER circuit.
///
/// The inputs of the circuit are universal variables of the instance and its outputs are the Skolem functions of existential variables.
/// The symbol table, if any, names each input and output by its DIMACS variable.
/// Otherwise, the inputs are the universal variables in prefix order and the outputs the existential variables which follow the first universal block.
#[derive(Debug, Default)]
pub(crate) struct AigerCertificate {
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    gates: HashMap<usize, (usize, usize)>,
    input_symbols: HashMap<usize, usize>,
    output_symbols: HashMap<usize, usize>,
}

fn parse_usize(word: Option<&str>, what: &str) -> Result<usize> {
    let w = word.ok_or_else(|| anyhow!("missing {}", what))?;
    w.parse::<usize>()
        .with_context(|| format!(r#"while parsing {} "{}""#, what, w))
}

impl AigerCertificate {
    /// Parses a certificate from the lines following (and including) its `aag` header.
    pub(crate) fn parse<'a, I>(mut lines: I) -> Result<Self>
    where
        I: Iterator<Item = &'a str>,
    {
        let header = lines.next().ok_or_else(|| anyhow!("missing AIGER header"))?;
        let mut words = header.split_whitespace();
        if words.next() != Some("aag") {
            return Err(anyhow!(r#"expected an "aag" header, got "{}""#, header));
        }
        let _max_var = parse_usize(words.next(), "maximal variable index")?;
        let n_inputs = parse_usize(words.next(), "number of inputs")?;
        let n_latches = parse_usize(words.next(), "number of latches")?;
        let n_outputs = parse_usize(words.next(), "number of outputs")?;
        let n_gates = parse_usize(words.next(), "number of AND gates")?;
        if n_latches != 0 {
            return Err(anyhow!("certificates must not contain latches"));
        }
        let mut certificate = AigerCertificate::default();
        let mut next_line = |what: &str| lines.next().ok_or_else(|| anyhow!("missing {}", what));
        for _ in 0..n_inputs {
            let line = next_line("input")?;
            certificate
                .inputs
                .push(parse_usize(line.split_whitespace().next(), "input literal")?);
        }
        for _ in 0..n_outputs {
            let line = next_line("output")?;
            certificate
                .outputs
                .push(parse_usize(line.split_whitespace().next(), "output literal")?);
        }
        for _ in 0..n_gates {
            let line = next_line("AND gate")?;
            let mut words = line.split_whitespace();
            let lhs = parse_usize(words.next(), "AND gate literal")?;
            let rhs0 = parse_usize(words.next(), "AND gate operand")?;
            let rhs1 = parse_usize(words.next(), "AND gate operand")?;
            certificate.gates.insert(lhs, (rhs0, rhs1));
        }
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('c') {
                break;
            }
            let (position, name) = line
                .split_once(' ')
                .ok_or_else(|| anyhow!(r#"malformed symbol "{}""#, line))?;
            let index = parse_usize(position.get(1..), "symbol position")?;
            let var = parse_usize(Some(name.trim()), "symbol name")?;
            match position.chars().next() {
                Some('i') => certificate.input_symbols.insert(index, var),
                Some('o') => certificate.output_symbols.insert(index, var),
                _ => return Err(anyhow!(r#"unexpected symbol "{}""#, line)),
            };
        }
        Ok(certificate)
    }

    /// Translates the circuit into a valuation assigning each certified existential variable its function.
    pub(crate) fn to_valuation(&self, instance: &QuantifiedCnf) -> Result<Valuation> {
        let positional_inputs = instance
            .prefix()
            .iter()
            .filter_map(|b| match b {
                CnfBlock::Forall(vars) => Some(vars.clone()),
                _ => None,
            })
            .flatten()
            .collect::<Vec<Variable>>();
        let positional_outputs = instance
            .prefix()
            .iter()
            .skip_while(|b| !matches!(b, CnfBlock::Forall(_)))
            .flat_map(|b| match b {
                CnfBlock::Exists(vars) => vars.clone(),
                CnfBlock::Dependent(vars) => vars.iter().map(|(v, _)| *v).collect(),
                CnfBlock::Forall(_) => vec![],
            })
            .collect::<Vec<Variable>>();
        let variable_at = |symbols: &HashMap<usize, usize>, positional: &[Variable], i: usize| {
            symbols
                .get(&i)
                .filter(|v| **v > 0)
                .map(|v| Variable::from(*v))
                .or_else(|| positional.get(i).copied())
                .ok_or_else(|| anyhow!("cannot match certificate position {} to a variable", i))
        };
        let mut input_formulas = HashMap::new();
        for (i, lit) in self.inputs.iter().enumerate() {
            let var = variable_at(&self.input_symbols, &positional_inputs, i)?;
            let name = instance
                .name_of(var)
                .ok_or_else(|| anyhow!("certificate input {} is not a named variable", var))?;
            input_formulas.insert(lit >> 1, Formula::Atom(name.clone()));
        }
        let mut memo = HashMap::new();
        let mut valuation = Valuation::default();
        for (i, lit) in self.outputs.iter().enumerate() {
            let var = variable_at(&self.output_symbols, &positional_outputs, i)?;
            let function = self.formula_of(*lit, &input_formulas, &mut memo, 0)?;
            if let Some(name) = instance.name_of(var) {
                valuation.insert(name.clone(), function);
            }
        }
        Ok(valuation)
    }

    fn formula_of(
        &self,
        lit: usize,
        inputs: &HashMap<usize, Formula>,
        memo: &mut HashMap<usize, Formula>,
        depth: usize,
    ) -> Result<Formula> {
        if depth > self.gates.len() {
            return Err(anyhow!("cyclic AND gates in certificate"));
        }
        let index = lit >> 1;
        let positive = if index == 0 {
            Formula::FALSE
        } else if let Some(f) = inputs.get(&index) {
            f.clone()
        } else if let Some(f) = memo.get(&index) {
            f.clone()
        } else {
            let (rhs0, rhs1) = self
                .gates
                .get(&(index << 1))
                .ok_or_else(|| anyhow!("undefined AIGER literal {}", lit))?;
            let f = Formula::and([
                self.formula_of(*rhs0, inputs, memo, depth + 1)?,
                self.formula_of(*rhs1, inputs, memo, depth + 1)?,
            ]);
            memo.insert(index, f.clone());
            f
        };
        Ok(if lit & 1 == 1 {
            Formula::not(positive)
        } else {
            positive
        })
    }
}
