use super::{aiger_certificate::AigerCertificate, QbfPreprocessor, QbfSolver, QbfSolvingResult};
use crate::{logic::QuantifiedCnf, sat::exec_solver, sat::Literal};
use anyhow::{anyhow, Context, Result};
use log::debug;
use std::io::Cursor;

/// The type of functions given to [`ExternalQbfSolver`] to solve an instance.
///
/// The function receives the text of the instance and returns the standard output of the solver and its exit code.
pub type QbfSolvingFn = dyn Fn(String) -> Result<(String, Option<i32>)>;

/// A QBF solver which execution is made by a system command.
///
/// The instance is written to the standard input of the command, in QDIMACS (or DQDIMACS if some variables have explicit dependencies).
/// The result is read from the standard output (`s cnf 0|1` or `s SATISFIABLE|UNSATISFIABLE` lines)
/// or from the exit code (10 or 20) if no result line is printed.
/// `V` and `v` lines give the values of the outermost existential variables,
/// and an optional ASCII AIGER certificate gives the Skolem functions of the other existential variables.
pub struct ExternalQbfSolver {
    solving_fn: Box<QbfSolvingFn>,
}

impl ExternalQbfSolver {
    /// Builds a new external QBF solver given the program to run and its options.
    pub fn new(program: String, options: Vec<String>) -> Self {
        Self::new_with_solving_fn(Box::new(move |instance| {
            let output = exec_solver(Cursor::new(instance.into_bytes()), &program, &options)?;
            Ok((
                String::from_utf8_lossy(&output.stdout).to_string(),
                output.exit_code,
            ))
        }))
    }

    /// Builds a new QBF solver delegating the solving to a function.
    pub fn new_with_solving_fn(solving_fn: Box<QbfSolvingFn>) -> Self {
        Self { solving_fn }
    }
}

impl QbfSolver for ExternalQbfSolver {
    fn solve(
        &self,
        instance: &QuantifiedCnf,
        preprocessor: Option<&dyn QbfPreprocessor>,
    ) -> Result<QbfSolvingResult> {
        let mut text = instance.to_dimacs_string();
        if let Some(p) = preprocessor {
            text = p.preprocess(text).context("while preprocessing a QBF instance")?;
        }
        debug!(
            "solving a QBF instance with {} variables and {} clauses",
            instance.n_vars(),
            instance.clauses().len()
        );
        let (output, exit_code) = (self.solving_fn)(text)?;
        read_solver_output(&output, exit_code, instance)
            .context("while reading the output of a QBF solver")
    }
}

enum Status {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

fn read_status_line(line: &str) -> Result<Option<Status>> {
    let words = line.split_whitespace().collect::<Vec<&str>>();
    match words.as_slice() {
        ["s", "cnf", result, ..] => match *result {
            "1" => Ok(Some(Status::Satisfiable)),
            "0" => Ok(Some(Status::Unsatisfiable)),
            "-1" => Ok(Some(Status::Unknown)),
            _ => Err(anyhow!(r#"unexpected result "{}""#, result)),
        },
        ["s", "SATISFIABLE"] => Ok(Some(Status::Satisfiable)),
        ["s", "UNSATISFIABLE"] => Ok(Some(Status::Unsatisfiable)),
        ["s", "UNKNOWN"] => Ok(Some(Status::Unknown)),
        ["s", ..] => Err(anyhow!(r#"unexpected status line "{}""#, line)),
        _ => Ok(None),
    }
}

fn read_values_line(line: &str, literals: &mut Vec<Literal>) -> Result<()> {
    for w in line.split_whitespace().skip(1) {
        let value = w
            .parse::<isize>()
            .with_context(|| format!(r#"while parsing literal "{}""#, w))?;
        if value != 0 {
            literals.push(Literal::from(value));
        }
    }
    Ok(())
}

pub(crate) fn read_solver_output(
    output: &str,
    exit_code: Option<i32>,
    instance: &QuantifiedCnf,
) -> Result<QbfSolvingResult> {
    let mut status = None;
    let mut literals = vec![];
    let mut certificate = None;
    let mut lines = output.lines().enumerate();
    while let Some((i, line)) = lines.next() {
        let context = || format!("while reading line with index {}", i);
        if line.starts_with("aag ") {
            let remaining = std::iter::once(line).chain(lines.by_ref().map(|(_, l)| l));
            certificate = Some(AigerCertificate::parse(remaining).with_context(context)?);
            break;
        }
        if line.starts_with('V') || line.starts_with("v ") {
            read_values_line(line, &mut literals).with_context(context)?;
        } else if let Some(s) = read_status_line(line).with_context(context)? {
            status = Some(s);
        }
    }
    let status = match (status, exit_code) {
        (Some(s), _) => s,
        (None, Some(10)) => Status::Satisfiable,
        (None, Some(20)) => Status::Unsatisfiable,
        (None, code) => {
            return Err(anyhow!(
                "no result in solver output (exit code: {})",
                code.map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string())
            ))
        }
    };
    Ok(match status {
        Status::Satisfiable => {
            let mut valuation = instance.valuation_of_literals(literals);
            if let Some(c) = certificate {
                valuation.merge(c.to_valuation(instance)?);
            }
            QbfSolvingResult::Satisfiable(valuation)
        }
        Status::Unsatisfiable => QbfSolvingResult::Unsatisfiable,
        Status::Unknown => QbfSolvingResult::Unknown,
    })
}
