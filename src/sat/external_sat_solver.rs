use super::{
    buffered_sat_solver::BufferedSatSolver, Literal, SatSolver, SatSolverFactory, SolvingListener,
    SolvingResult,
};
use anyhow::{anyhow, Context, Result};
use std::{
    io::{Cursor, Read, Write},
    process::{Command, Stdio},
    rc::Rc,
};

/// A SAT solver which execution is made by a system command.
///
/// The system command is composed by an executable program, and a potential list of CLI arguments.
///
/// The SAT solver must read from the standard input (if it does not by default, this may be possible with the right CLI arguments).
/// The input and output formats must follow the ones from the SAT competitions.
pub struct ExternalSatSolver {
    buffered_sat_solver: BufferedSatSolver,
}

impl ExternalSatSolver {
    /// Builds a new external SAT solver.
    ///
    /// The `program` argument is the path from a directory in execution path to the software to execute.
    /// The `options` parameter is the CLI options to provide to the software under execution.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use boundsyn::sat::{ExternalSatSolver, Literal, SatSolver};
    /// let mut solver = ExternalSatSolver::new(
    ///     "/home/me/my_solver".to_string(),
    ///     vec!["-i".to_string(), "/dev/stdin".to_string()],
    /// );
    /// solver.add_clause(vec![Literal::from(-1), Literal::from(-2)]);
    /// solver.add_clause(vec![Literal::from(-1), Literal::from(2)]);
    /// let model = solver.solve().unwrap().unwrap_model().unwrap();
    /// assert_eq!(Some(true), model.value_of(1));
    /// ```
    pub fn new(program: String, options: Vec<String>) -> Self {
        Self {
            buffered_sat_solver: BufferedSatSolver::new(Box::new(move |r| {
                let output = exec_solver(r, &program, &options)?;
                Ok(Box::new(Cursor::new(output.stdout)))
            })),
        }
    }
}

impl SatSolver for ExternalSatSolver {
    fn add_clause(&mut self, cl: Vec<Literal>) {
        self.buffered_sat_solver.add_clause(cl)
    }

    fn solve(&mut self) -> Result<SolvingResult> {
        self.buffered_sat_solver.solve()
    }

    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> Result<SolvingResult> {
        self.buffered_sat_solver
            .solve_under_assumptions(assumptions)
    }

    fn n_vars(&self) -> usize {
        self.buffered_sat_solver.n_vars()
    }

    fn add_listener(&mut self, listener: Box<dyn SolvingListener>) {
        self.buffered_sat_solver.add_listener(listener);
    }

    fn reserve(&mut self, new_max_id: usize) {
        self.buffered_sat_solver.reserve(new_max_id)
    }
}

type ListenerFactoryFn = dyn Fn() -> Box<dyn SolvingListener>;

/// A factory for [`ExternalSatSolver`] instances.
pub struct ExternalSatSolverFactory {
    program: String,
    options: Vec<String>,
    listener_factories: Vec<Rc<ListenerFactoryFn>>,
}

impl ExternalSatSolverFactory {
    /// Builds a new factory given the program and its options.
    pub fn new(program: String, options: Vec<String>) -> Self {
        Self {
            program,
            options,
            listener_factories: vec![],
        }
    }

    /// Adds a function building a listener for each new solver.
    pub fn add_solver_listener(&mut self, listener_factory: Box<ListenerFactoryFn>) {
        self.listener_factories.push(Rc::from(listener_factory));
    }
}

impl SatSolverFactory for ExternalSatSolverFactory {
    fn new_solver(&self) -> Box<dyn SatSolver> {
        let mut solver = ExternalSatSolver::new(self.program.clone(), self.options.clone());
        self.listener_factories
            .iter()
            .for_each(|f| solver.add_listener((f)()));
        Box::new(solver)
    }
}

/// The output of an external solver process.
pub(crate) struct ProcessOutput {
    pub(crate) stdout: Vec<u8>,
    pub(crate) exit_code: Option<i32>,
}

/// Runs a program, writing the content of the reader to its standard input.
///
/// The input is written by a dedicated thread while the standard output is collected.
pub(crate) fn exec_solver<R>(mut reader: R, program: &str, options: &[String]) -> Result<ProcessOutput>
where
    R: Read + Send + 'static,
{
    let context = || format!(r#"while executing "{}""#, program);
    let mut child = Command::new(program)
        .args(options)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .with_context(context)?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("failed to open the standard input"))
        .with_context(context)?;
    let writer = std::thread::spawn(move || -> std::io::Result<()> {
        let mut buffer = [0; 1 << 16];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            if stdin.write_all(&buffer[..n]).is_err() {
                break;
            }
        }
        stdin.flush()
    });
    let output = child.wait_with_output().with_context(context)?;
    if let Ok(Err(e)) = writer.join() {
        log::debug!("solver {} closed its input early: {}", program, e);
    }
    Ok(ProcessOutput {
        stdout: output.stdout,
        exit_code: output.status.code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause;

    fn get_echo_command(content: &str) -> Option<(String, Vec<String>)> {
        if cfg!(target_family = "unix") {
            Some(("echo".to_string(), vec![content.to_string()]))
        } else {
            None
        }
    }

    #[test]
    fn test_solve_output() {
        let (program, options) = match get_echo_command("s SATISFIABLE\nv 1 2 0\n") {
            Some(cmd) => cmd,
            None => return,
        };
        let mut s = ExternalSatSolver::new(program, options);
        s.add_clause(clause![1, 2]);
        let model = s.solve().unwrap().unwrap_model().unwrap();
        assert!(model.value_of(1).unwrap());
        assert!(model.value_of(2).unwrap());
        assert_eq!(2, s.n_vars());
    }

    #[test]
    fn test_solve_under_assumptions_output() {
        let (program, options) = match get_echo_command("s UNSATISFIABLE\n") {
            Some(cmd) => cmd,
            None => return,
        };
        let factory = ExternalSatSolverFactory::new(program, options);
        let mut s = factory.new_solver();
        s.add_clause(clause![1, 2]);
        let model = s
            .solve_under_assumptions(&[Literal::from(-1), Literal::from(-2)])
            .unwrap()
            .unwrap_model();
        assert!(model.is_none());
    }

    #[test]
    fn test_missing_program() {
        let mut s = ExternalSatSolver::new("/this/solver/does/not/exist".to_string(), vec![]);
        s.add_clause(clause![1]);
        assert!(s.solve().is_err());
    }
}
