use super::{
    specs::{dispatch_warnings, strip_comment},
    warning_result::WarningResult,
    WarningHandler,
};
use crate::{automaton::Automaton, scenarios::ScenarioBranch};
use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, BufReader, Read};

fn read_branch(automaton: &Automaton, label: &str) -> Result<WarningResult<ScenarioBranch, String>> {
    let branch = ScenarioBranch::from_label(label);
    if let Some(p) = branch
        .inputs()
        .iter()
        .find(|p| !automaton.inputs().contains(p))
    {
        return Err(anyhow!(r#"undeclared input {} in branch "{}""#, p, label));
    }
    if let Some(p) = branch
        .outputs()
        .iter()
        .find(|p| !automaton.outputs().contains(p))
    {
        return Err(anyhow!(r#"undeclared output {} in branch "{}""#, p, label));
    }
    let has_repetition = label
        .split(|c: char| c == ',' || c == ';')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .count()
        != branch.inputs().len() + branch.outputs().len();
    Ok(WarningResult::warn_if(branch, has_repetition, || {
        format!(r#"branch "{}" contains repeated propositions"#, label)
    }))
}

/// A reader for the example traces a synthesized system must be able to produce.
///
/// Each non-empty line is a trace, given as a sequence of branches separated by whitespace.
/// A branch is written `in1,in2;out1,out2`, listing its active inputs and outputs;
/// if the `;` is missing, no output is active.
/// Everything after a `#` is a comment.
///
/// # Example
///
/// ```
/// # use boundsyn::io::{AutomatonReader, ScenarioReader};
/// let automaton_text = "inputs: r\noutputs: g\nstate q0 initial\ntransition q0 -> q0: true\n";
/// let automaton = AutomatonReader::default().read(&mut automaton_text.as_bytes()).unwrap();
/// let scenarios = ScenarioReader::default()
///     .read(&mut "r;g ;\n;g\n".as_bytes(), &automaton)
///     .unwrap();
/// assert_eq!(2, scenarios.len());
/// assert_eq!(2, scenarios[0].len());
/// ```
#[derive(Default)]
pub struct ScenarioReader {
    warning_handlers: Vec<WarningHandler>,
}

impl ScenarioReader {
    /// Reads the traces, checking their propositions are declared by the automaton.
    pub fn read(
        &self,
        reader: &mut dyn Read,
        automaton: &Automaton,
    ) -> Result<Vec<Vec<ScenarioBranch>>> {
        let mut scenarios = vec![];
        let br = BufReader::new(reader);
        for (i, line) in br.lines().enumerate() {
            let context = || format!("while reading line with index {}", i);
            let full_line = line.with_context(context)?;
            let l = strip_comment(&full_line);
            if l.trim().is_empty() {
                continue;
            }
            let mut scenario = vec![];
            for label in l.split_whitespace() {
                let branch = read_branch(automaton, label)
                    .with_context(context)?
                    .consume_warnings(|w| dispatch_warnings(&self.warning_handlers, 1 + i, w));
                scenario.push(branch);
            }
            scenarios.push(scenario);
        }
        Ok(scenarios)
    }

    /// Adds a callback function to call when warnings are raised while reading the traces.
    pub fn add_warning_handler(&mut self, h: WarningHandler) {
        self.warning_handlers.push(h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{automaton::AutomatonBuilder, logic::Formula};
    use std::{cell::RefCell, rc::Rc};

    fn automaton() -> Automaton {
        let mut builder = AutomatonBuilder::new(vec!["a".into(), "b".into()], vec!["x".into()]);
        builder.new_state("q").unwrap();
        builder.set_initial("q").unwrap();
        builder.new_transition("q", "q", Formula::TRUE).unwrap();
        builder.build()
    }

    #[test]
    fn test_read() {
        let text = "# two traces\na,b;x ;x\n\n  a # only one step\n";
        let scenarios = ScenarioReader::default()
            .read(&mut text.as_bytes(), &automaton())
            .unwrap();
        assert_eq!(
            vec![
                vec![
                    ScenarioBranch::new(["a".into(), "b".into()], ["x".into()]),
                    ScenarioBranch::new([], ["x".into()]),
                ],
                vec![ScenarioBranch::new(["a".into()], [])],
            ],
            scenarios
        );
    }

    #[test]
    fn test_undeclared_names() {
        for text in ["c;x", "a;y", "x;a"] {
            assert!(ScenarioReader::default()
                .read(&mut text.as_bytes(), &automaton())
                .is_err());
        }
    }

    #[test]
    fn test_repeated_propositions() {
        let warnings = Rc::new(RefCell::new(vec![]));
        let mut reader = ScenarioReader::default();
        let w = Rc::clone(&warnings);
        reader.add_warning_handler(Box::new(move |l, m| w.borrow_mut().push((l, m))));
        reader
            .read(&mut "\na;x a,a;x".as_bytes(), &automaton())
            .unwrap();
        assert_eq!(
            vec![(
                2,
                r#"branch "a,a;x" contains repeated propositions"#.to_string()
            )],
            *warnings.borrow()
        );
    }
}
