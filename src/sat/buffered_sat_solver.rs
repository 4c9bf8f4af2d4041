use super::{Assignment, Literal, SatSolver, SolvingListener, SolvingResult};
use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, BufReader, Cursor, Read};

/// The type of functions given to [`BufferedSatSolver`] to solve a DIMACS instance.
///
/// The function receives the instance as a reader and returns a reader to the solver output.
pub type SolvingFn = dyn Fn(DimacsInstanceRead) -> Result<Box<dyn Read>>;

/// A reader over a DIMACS instance made of a preamble, the clauses and the assumptions.
pub struct DimacsInstanceRead {
    preamble: Cursor<String>,
    clauses: Cursor<String>,
    assumptions: Cursor<String>,
}

impl Read for DimacsInstanceRead {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let r = self.preamble.read(buf)?;
        if r > 0 {
            return Ok(r);
        }
        let r = self.clauses.read(buf)?;
        if r > 0 {
            return Ok(r);
        }
        self.assumptions.read(buf)
    }
}

const DEFAULT_BUFFER_CAP: usize = 1 << 20;

/// A SAT solver which stores the clauses as a DIMACS string and delegates the solving to a function.
pub struct BufferedSatSolver {
    n_vars: usize,
    n_clauses: usize,
    clauses: String,
    solving_fn: Box<SolvingFn>,
    listeners: Vec<Box<dyn SolvingListener>>,
}

impl BufferedSatSolver {
    /// Builds a new buffered solver given the function in charge of the solving.
    pub fn new(solving_fn: Box<SolvingFn>) -> Self {
        Self {
            n_vars: 0,
            n_clauses: 0,
            clauses: String::with_capacity(DEFAULT_BUFFER_CAP),
            solving_fn,
            listeners: Vec::new(),
        }
    }
}

impl SatSolver for BufferedSatSolver {
    fn add_clause(&mut self, cl: Vec<Literal>) {
        cl.iter().for_each(|l| {
            self.n_vars = usize::max(self.n_vars, usize::from(l.var()));
            self.clauses.push_str(&format!("{} ", l));
        });
        self.clauses.push_str("0\n");
        self.n_clauses += 1;
    }

    fn solve(&mut self) -> Result<SolvingResult> {
        self.solve_under_assumptions(&[])
    }

    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> Result<SolvingResult> {
        self.listeners
            .iter()
            .for_each(|l| l.solving_start(self.n_vars(), self.n_clauses));
        let preamble = format!(
            "p cnf {} {}\n",
            self.n_vars,
            self.n_clauses + assumptions.len()
        );
        let assumptions = assumptions.iter().fold(String::new(), |mut acc, a| {
            acc.push_str(&format!("{} 0\n", a));
            acc
        });
        let instance_reader = DimacsInstanceRead {
            assumptions: Cursor::new(assumptions),
            clauses: Cursor::new(self.clauses.clone()),
            preamble: Cursor::new(preamble),
        };
        let context = "error while reading solving function output in BufferedSatSolver";
        let solver_output = BufReader::new((self.solving_fn)(instance_reader).context(context)?);
        let solving_result = read_dimacs_output(solver_output, self.n_vars).context(context)?;
        self.listeners
            .iter()
            .for_each(|l| l.solving_end(&solving_result));
        Ok(solving_result)
    }

    fn n_vars(&self) -> usize {
        self.n_vars
    }

    fn add_listener(&mut self, listener: Box<dyn SolvingListener>) {
        self.listeners.push(listener);
    }

    fn reserve(&mut self, new_max_id: usize) {
        if new_max_id > self.n_vars {
            self.n_vars = new_max_id;
        }
    }
}

fn read_dimacs_output<R>(solver_output: R, n_vars: usize) -> Result<SolvingResult>
where
    R: BufRead,
{
    let mut status = None;
    let mut assignment = vec![None; n_vars];
    let mut assignment_line_seen = false;
    let mut assignment_line_end = false;
    for line in solver_output.lines() {
        let line = line?;
        let mut set_status = |b| {
            if status.is_some() {
                return Err(anyhow!("multiple status lines"));
            }
            status = Some(b);
            Ok(())
        };
        if line == "s SATISFIABLE" {
            set_status(true)?;
        } else if line == "s UNSATISFIABLE" {
            set_status(false)?;
        } else if line == "s UNKNOWN" {
        } else if let Some(values) = line.strip_prefix("v ") {
            assignment_line_seen = true;
            for w in values.split_ascii_whitespace() {
                let n = w
                    .parse::<isize>()
                    .map_err(|_| anyhow!(r#""{}" is not a literal"#, w))?;
                if n == 0 {
                    if assignment_line_end {
                        return Err(anyhow!("multiple zeroes on value line"));
                    }
                    assignment_line_end = true;
                } else {
                    let v = n.unsigned_abs() - 1;
                    if v >= n_vars {
                        return Err(anyhow!("a variable in value line is out of bounds"));
                    }
                    assignment[v] = Some(n > 0);
                }
            }
        } else if !line.starts_with("c ") && line != "c" && line != "v" && !line.is_empty() {
            return Err(anyhow!(r#"unexpected line "{}""#, line));
        }
    }
    Ok(match status {
        Some(true) if assignment_line_seen => SolvingResult::Satisfiable(Assignment::new(assignment)),
        Some(true) | None => SolvingResult::Unknown,
        Some(false) => SolvingResult::Unsatisfiable,
    })
}
