//! Objects used to read automata and scenarios, and to write the outcomes of bound searches.

mod automaton_reader;
pub use automaton_reader::AutomatonReader;

mod expression_parser;

mod scenario_reader;
pub use scenario_reader::ScenarioReader;

mod solution_writer;
pub use solution_writer::SolutionWriter;

mod specs;
pub use specs::WarningHandler;

mod warning_result;
