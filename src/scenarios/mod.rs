//! Example traces the synthesized system must be able to produce.

mod scenario_branch;
pub use scenario_branch::ScenarioBranch;

mod scenario_trie;
pub use scenario_trie::NodeId;
pub use scenario_trie::ScenarioTrie;
