use super::{
    expression_parser::ExpressionParser,
    specs::{dispatch_warnings, strip_comment, NAME_PATTERN},
    warning_result::WarningResult,
    WarningHandler,
};
use crate::{
    automaton::{Automaton, AutomatonBuilder},
    logic::{Formula, Proposition},
};
use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::{
    collections::HashSet,
    io::{BufRead, BufReader, Read},
};

lazy_static! {
    static ref NAME: Regex = Regex::new(&format!("^{}$", NAME_PATTERN)).unwrap();
    static ref DECLARATION_LINE_PATTERN: Regex =
        Regex::new(r"^\s*(inputs|outputs)\s*:(.*)$").unwrap();
    static ref STATE_LINE_PATTERN: Regex = Regex::new(&format!(
        r"^\s*state\s+({})((?:\s+{})*)\s*$",
        NAME_PATTERN, NAME_PATTERN
    ))
    .unwrap();
    static ref SAFETY_LINE_PATTERN: Regex =
        Regex::new(&format!(r"^\s*safety\s+({})\s*:(.*)$", NAME_PATTERN)).unwrap();
    static ref TRANSITION_LINE_PATTERN: Regex = Regex::new(&format!(
        r"^\s*transition\s+({})\s*->\s*({})\s*:(.*)$",
        NAME_PATTERN, NAME_PATTERN
    ))
    .unwrap();
}

const RESERVED_NAMES: [&str; 2] = ["true", "false"];

fn read_declared_names(list: &str) -> Result<WarningResult<Vec<Proposition>, String>> {
    let mut names: Vec<Proposition> = vec![];
    let mut warnings = vec![];
    for name in list.split(|c: char| c == ',' || c.is_whitespace()) {
        if name.is_empty() {
            continue;
        }
        if !NAME.is_match(name) || RESERVED_NAMES.contains(&name) {
            return Err(anyhow!(r#"invalid proposition name "{}""#, name));
        }
        let p = Proposition::from(name);
        if names.contains(&p) {
            warnings.push(format!("proposition {} is declared twice", name));
        } else {
            names.push(p);
        }
    }
    Ok(if warnings.is_empty() {
        WarningResult::Ok(names)
    } else {
        WarningResult::Warned(names, warnings)
    })
}

#[derive(Default)]
struct Declarations {
    inputs: Option<(usize, Vec<Proposition>)>,
    outputs: Option<(usize, Vec<Proposition>)>,
}

impl Declarations {
    fn declare(&mut self, kind: &str, line: usize, names: Vec<Proposition>) -> Result<()> {
        let slot = if kind == "inputs" {
            &mut self.inputs
        } else {
            &mut self.outputs
        };
        if slot.is_some() {
            return Err(anyhow!("{} are declared multiple times", kind));
        }
        *slot = Some((line, names));
        if let (Some((_, inputs)), Some((_, outputs))) = (&self.inputs, &self.outputs) {
            if let Some(p) = inputs.iter().find(|p| outputs.contains(p)) {
                return Err(anyhow!("{} is declared both as an input and an output", p));
            }
        }
        Ok(())
    }

    fn into_builder(self) -> (AutomatonBuilder, Vec<(usize, Proposition)>) {
        let (inputs_line, inputs) = self.inputs.unwrap_or_default();
        let (outputs_line, outputs) = self.outputs.unwrap_or_default();
        let declared = inputs
            .iter()
            .map(|p| (inputs_line, p.clone()))
            .chain(outputs.iter().map(|p| (outputs_line, p.clone())))
            .collect();
        (AutomatonBuilder::new(inputs, outputs), declared)
    }
}

/// A reader for co-Büchi automata given in a line-based text format.
///
/// # Automaton format
///
/// The propositions are declared first, by `inputs:` and `outputs:` lines listing their names.
/// Then come the states, with their optional `initial` and `rejecting` flags,
/// the safety conditions of the states, and their guarded transitions.
/// Conditions and guards are Boolean expressions over the declared propositions
/// (see the operators below); multiple safety conditions of a state are conjoined.
/// Everything after a `#` is a comment.
///
/// ```text
/// # a request/grant arbiter
/// inputs: r1 r2
/// outputs: g1 g2
/// state q0 initial
/// state q1 rejecting
/// safety q0: !(g1 & g2)
/// transition q0 -> q0: true
/// transition q0 -> q1: r1 & !g1
/// transition q1 -> q1: !g1
/// ```
///
/// From the lowest to the highest precedence, the operators are `<->`, `->` (right associative), `|`, `&` and `!`.
///
/// Setting a flag twice or declaring a proposition that is never used raises a warning.
///
/// # Example
///
/// ```
/// # use boundsyn::io::AutomatonReader;
/// let text = "inputs: r\noutputs: g\nstate q0 initial\ntransition q0 -> q0: r -> g\n";
/// let automaton = AutomatonReader::default().read(&mut text.as_bytes()).unwrap();
/// assert_eq!(1, automaton.n_states());
/// assert_eq!(1, automaton.n_transitions());
/// ```
#[derive(Default)]
pub struct AutomatonReader {
    warning_handlers: Vec<WarningHandler>,
}

impl AutomatonReader {
    /// Reads an [`Automaton`].
    ///
    /// In case warnings are raised, the callback functions registered by [add_warning_handler](Self::add_warning_handler) are triggered.
    pub fn read(&self, reader: &mut dyn Read) -> Result<Automaton> {
        let mut declarations = Some(Declarations::default());
        let mut builder: Option<AutomatonBuilder> = None;
        let mut declared = vec![];
        let mut used = HashSet::new();
        let br = BufReader::new(reader);
        for (i, line) in br.lines().enumerate() {
            let context = || format!("while reading line with index {}", i);
            let warning_consumer =
                |warnings: Vec<String>| dispatch_warnings(&self.warning_handlers, 1 + i, warnings);
            let full_line = line.with_context(context)?;
            let l = strip_comment(&full_line);
            if l.trim().is_empty() {
                continue;
            }
            if let Some(c) = DECLARATION_LINE_PATTERN.captures(l) {
                let d = declarations
                    .as_mut()
                    .ok_or_else(|| anyhow!("propositions must be declared before the states"))
                    .with_context(context)?;
                let names = read_declared_names(&c[2])
                    .with_context(context)?
                    .consume_warnings(warning_consumer);
                d.declare(&c[1], 1 + i, names).with_context(context)?;
                continue;
            }
            let b = builder.get_or_insert_with(|| {
                let (b, d) = declarations.take().unwrap_or_default().into_builder();
                declared = d;
                b
            });
            if let Some(c) = STATE_LINE_PATTERN.captures(l) {
                self.read_state_line(b, &c[1], &c[2])
                    .with_context(context)?
                    .consume_warnings(warning_consumer);
                continue;
            }
            if let Some(c) = SAFETY_LINE_PATTERN.captures(l) {
                let condition = read_expression(b, &c[2], &mut used).with_context(context)?;
                b.add_safety_condition(&c[1], condition)
                    .with_context(context)?;
                continue;
            }
            if let Some(c) = TRANSITION_LINE_PATTERN.captures(l) {
                let guard = read_expression(b, &c[3], &mut used).with_context(context)?;
                b.new_transition(&c[1], &c[2], guard)
                    .with_context(context)?;
                continue;
            }
            return Err(anyhow!("syntax error in line \"{}\"", full_line)).with_context(context);
        }
        let builder = builder.ok_or_else(|| anyhow!("the automaton has no state"))?;
        for (line, p) in declared.iter().filter(|(_, p)| !used.contains(p)) {
            dispatch_warnings(
                &self.warning_handlers,
                *line,
                vec![format!("proposition {} is never used", p)],
            );
        }
        let automaton = builder.build();
        if automaton.n_states() == 0 {
            return Err(anyhow!("the automaton has no state"));
        }
        if automaton.initial_states().next().is_none() {
            return Err(anyhow!("the automaton has no initial state"));
        }
        Ok(automaton)
    }

    fn read_state_line(
        &self,
        builder: &mut AutomatonBuilder,
        name: &str,
        flags: &str,
    ) -> Result<WarningResult<(), String>> {
        builder.new_state(name)?;
        let mut result = WarningResult::Ok(());
        for flag in flags.split_whitespace() {
            let newly_set = match flag {
                "initial" => builder.set_initial(name)?,
                "rejecting" => builder.set_rejecting(name)?,
                _ => return Err(anyhow!(r#"unknown state flag "{}""#, flag)),
            };
            let flag_result = WarningResult::warn_if((), !newly_set, || {
                format!("flag {} is set twice for state {}", flag, name)
            });
            result = match result.zip(flag_result) {
                WarningResult::Ok(_) => WarningResult::Ok(()),
                WarningResult::Warned(_, w) => WarningResult::Warned((), w),
            };
        }
        Ok(result)
    }

    /// Adds a callback function to call when warnings are raised while reading an automaton.
    pub fn add_warning_handler(&mut self, h: WarningHandler) {
        self.warning_handlers.push(h);
    }
}

fn read_expression(
    builder: &AutomatonBuilder,
    text: &str,
    used: &mut HashSet<Proposition>,
) -> Result<Formula> {
    let known = |name: &str| {
        builder
            .inputs()
            .iter()
            .chain(builder.outputs().iter())
            .any(|p| p.name() == name)
    };
    let (formula, propositions) = ExpressionParser::new(&known)
        .parse(text)
        .with_context(|| format!(r#"while parsing expression "{}""#, text.trim()))?;
    used.extend(propositions);
    Ok(formula)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    const ARBITER: &str = r#"
        # a request/grant arbiter
        inputs: r1 r2
        outputs: g1 g2
        state q0 initial
        state q1 rejecting
        safety q0: !(g1 & g2)
        transition q0 -> q0: true
        transition q0 -> q1: r1 & !g1 # pending request
        transition q1 -> q1: !g1
    "#;

    fn read_with_warnings(text: &str) -> (Result<Automaton>, Vec<(usize, String)>) {
        let warnings = Rc::new(RefCell::new(vec![]));
        let mut reader = AutomatonReader::default();
        let w = Rc::clone(&warnings);
        reader.add_warning_handler(Box::new(move |l, m| w.borrow_mut().push((l, m))));
        let result = reader.read(&mut text.as_bytes());
        let warnings = warnings.borrow().clone();
        (result, warnings)
    }

    #[test]
    fn test_patterns() {
        assert!(STATE_LINE_PATTERN.is_match("state q0"));
        assert!(STATE_LINE_PATTERN.is_match("  state q_1 initial rejecting "));
        assert!(!STATE_LINE_PATTERN.is_match("state"));
        assert!(!STATE_LINE_PATTERN.is_match("state 0q"));
        assert!(!STATE_LINE_PATTERN.is_match("stateq0"));
        assert!(SAFETY_LINE_PATTERN.is_match("safety q0: g"));
        assert!(!SAFETY_LINE_PATTERN.is_match("safety q0 g"));
        assert!(TRANSITION_LINE_PATTERN.is_match("transition q0->q1:true"));
        assert!(!TRANSITION_LINE_PATTERN.is_match("transition q0 q1: true"));
        assert!(DECLARATION_LINE_PATTERN.is_match("inputs:"));
        assert!(!DECLARATION_LINE_PATTERN.is_match("input: r"));
    }

    #[test]
    fn test_read_arbiter() {
        let (result, warnings) = read_with_warnings(ARBITER);
        let automaton = result.unwrap();
        assert_eq!(
            vec![Proposition::from("r1"), Proposition::from("r2")],
            automaton.inputs()
        );
        assert_eq!(2, automaton.outputs().len());
        assert_eq!(2, automaton.n_states());
        assert_eq!(3, automaton.n_transitions());
        assert!(automaton.is_initial(automaton.state_id("q0").unwrap()));
        assert!(automaton.is_rejecting(automaton.state_id("q1").unwrap()));
        assert!(automaton.safety_condition(0).is_some());
        assert!(automaton.safety_condition(1).is_none());
        assert_eq!(
            vec![(3, "proposition r2 is never used".to_string())],
            warnings
        );
    }

    #[test]
    fn test_duplicated_flag() {
        let (result, warnings) = read_with_warnings("state q0 initial initial\n");
        assert!(result.is_ok());
        assert_eq!(
            vec![(1, "flag initial is set twice for state q0".to_string())],
            warnings
        );
    }

    #[test]
    fn test_duplicated_declaration() {
        let (result, warnings) = read_with_warnings("inputs: a, a\nstate q initial\n");
        assert_eq!(1, result.unwrap().inputs().len());
        assert_eq!(2, warnings.len());
    }

    #[test]
    fn test_safety_conditions_are_conjoined() {
        let text = "outputs: g h\nstate q initial\nsafety q: g\nsafety q: h\n";
        let automaton = AutomatonReader::default()
            .read(&mut text.as_bytes())
            .unwrap();
        assert_eq!(
            &Formula::and([Formula::atom("g"), Formula::atom("h")]),
            automaton.safety_condition(0).unwrap()
        );
    }

    #[test]
    fn test_errors() {
        for text in [
            "",
            "inputs: a\n",
            "state q0\n",
            "state q0 initial\ninputs: a\n",
            "inputs: a\ninputs: b\nstate q initial\n",
            "inputs: a\noutputs: a\nstate q initial\n",
            "inputs: true\nstate q initial\n",
            "state q initial final\n",
            "state q initial\nstate q\n",
            "state q initial\ntransition q -> p: true\n",
            "state q initial\ntransition q -> q: a\n",
            "state q initial\nsafety q: (\n",
            "state q initial\nthis is not a line\n",
        ] {
            assert!(
                AutomatonReader::default()
                    .read(&mut text.as_bytes())
                    .is_err(),
                "{:?}",
                text
            );
        }
    }

    #[test]
    fn test_error_context() {
        let text = "state q initial\ntransition q -> p: true\n";
        let err = AutomatonReader::default()
            .read(&mut text.as_bytes())
            .unwrap_err();
        assert_eq!("while reading line with index 1", err.to_string());
    }
}
