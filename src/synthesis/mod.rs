//! The bound search and the synthesized implementations.

mod bounded_synthesis;
pub use bounded_synthesis::BoundOutcome;
pub use bounded_synthesis::BoundedSynthesis;
pub use bounded_synthesis::SynthesisOutcome;

mod solution;
pub(crate) use solution::guard_of_valuations;
pub(crate) use solution::satisfiable_guard;
pub use solution::Solution;

mod solver_set;
pub use solver_set::SolverSet;

mod synthesis_options;
pub use synthesis_options::SynthesisOptions;
pub use synthesis_options::UnknownPolicy;
