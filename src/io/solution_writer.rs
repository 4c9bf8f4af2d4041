use crate::synthesis::{Solution, SynthesisOutcome};
use anyhow::{Context, Result};
use std::io::Write;

/// A writer for the outcomes of bound searches.
///
/// The first line gives the status of the search:
///   * `REALIZABLE <bound>` if an implementation with `<bound>` states was found,
///   * `NOT FOUND <max_bound>` if no implementation has at most `<max_bound>` states,
///   * `UNKNOWN <bound>` if the search stopped on an undecided bound.
///
/// If the implementation was extracted, the following lines describe it,
/// one block per state listing its guarded transitions and the guards of its outputs.
///
/// ```text
/// REALIZABLE 2
/// state 0 (initial)
///   -> 0: !r
///   -> 1: r
///   g: false
/// state 1
///   -> 0: true
///   g: true
/// ```
#[derive(Default)]
pub struct SolutionWriter;

impl SolutionWriter {
    /// Writes the outcome of a search, including the implementation if there is one.
    pub fn write_outcome(&self, writer: &mut dyn Write, outcome: &SynthesisOutcome) -> Result<()> {
        let context = "while writing the outcome of a search";
        match outcome {
            SynthesisOutcome::Realizable { bound, solution } => {
                writeln!(writer, "REALIZABLE {}", bound).context(context)?;
                if let Some(s) = solution {
                    self.write_solution(writer, s)?;
                }
            }
            SynthesisOutcome::NotFound { max_bound } => {
                writeln!(writer, "NOT FOUND {}", max_bound).context(context)?
            }
            SynthesisOutcome::Unknown { bound } => {
                writeln!(writer, "UNKNOWN {}", bound).context(context)?
            }
        }
        writer.flush().context(context)
    }

    /// Writes the states of an implementation with their transitions and output guards.
    pub fn write_solution(&self, writer: &mut dyn Write, solution: &Solution) -> Result<()> {
        let context = "while writing a solution";
        for state in 0..solution.bound() {
            if state == 0 {
                writeln!(writer, "state {} (initial)", state).context(context)?;
            } else {
                writeln!(writer, "state {}", state).context(context)?;
            }
            for (target, guard) in solution.transitions_from(state) {
                writeln!(writer, "  -> {}: {}", target, guard).context(context)?;
            }
            for (index, output) in solution.outputs().iter().enumerate() {
                writeln!(
                    writer,
                    "  {}: {}",
                    output,
                    solution.output_guard(state, index)
                )
                .context(context)?;
            }
        }
        writer.flush().context(context)
    }
}
