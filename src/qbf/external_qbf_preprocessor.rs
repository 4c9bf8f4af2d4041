use super::QbfPreprocessor;
use crate::sat::exec_solver;
use anyhow::{anyhow, Result};
use std::io::Cursor;

/// A QBF preprocessor which execution is made by a system command.
///
/// The instance is written to the standard input of the command and the preprocessed instance is read from its standard output.
/// Options preserving the numbering of the outermost existential variables should be given when solutions must be extracted.
pub struct ExternalQbfPreprocessor {
    program: String,
    options: Vec<String>,
}

impl ExternalQbfPreprocessor {
    /// Builds a new preprocessor given the program to run and its options.
    pub fn new(program: String, options: Vec<String>) -> Self {
        Self { program, options }
    }
}

impl QbfPreprocessor for ExternalQbfPreprocessor {
    fn preprocess(&self, instance: String) -> Result<String> {
        let output = exec_solver(
            Cursor::new(instance.into_bytes()),
            &self.program,
            &self.options,
        )?;
        let text = String::from_utf8_lossy(&output.stdout).to_string();
        if !text.lines().any(|l| l.starts_with("p cnf")) {
            return Err(anyhow!(
                r#"no instance in the output of preprocessor "{}""#,
                self.program
            ));
        }
        Ok(text)
    }
}
