//! Co-Büchi automata given as input of the synthesis process.

#[allow(clippy::module_inception)]
mod automaton;
pub use automaton::Automaton;
pub use automaton::AutomatonBuilder;
pub use automaton::StateId;

mod scc;
