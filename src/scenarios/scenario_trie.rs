use super::ScenarioBranch;
use std::collections::BTreeMap;

/// The identifier of a trie node: its index in the trie arena.
pub type NodeId = usize;

#[derive(Debug, Default, Clone)]
struct TrieNode {
    children: BTreeMap<ScenarioBranch, NodeId>,
}

/// A trie sharing the common prefixes of a set of scenarios.
///
/// The root (node 0) stands for the empty trace.
/// Once the scenarios are inserted, the leaves are merged into a single tail node.
/// Removed nodes leave holes in the arena, so node ids are stable but not contiguous.
#[derive(Debug, Clone)]
pub struct ScenarioTrie {
    nodes: Vec<Option<TrieNode>>,
}

impl ScenarioTrie {
    /// Builds the trie of the given scenarios and merges its tails.
    ///
    /// # Example
    ///
    /// ```
    /// # use boundsyn::scenarios::{ScenarioBranch, ScenarioTrie};
    /// let trie = ScenarioTrie::new(&[
    ///     vec![ScenarioBranch::from_label("a;x")],
    ///     vec![ScenarioBranch::from_label("a;y")],
    /// ]);
    /// assert_eq!(2, trie.children(trie.root()).count());
    /// ```
    pub fn new(scenarios: &[Vec<ScenarioBranch>]) -> Self {
        let mut trie = ScenarioTrie {
            nodes: vec![Some(TrieNode::default())],
        };
        scenarios.iter().for_each(|s| trie.insert(s));
        trie.merge_tails();
        trie
    }

    fn insert(&mut self, scenario: &[ScenarioBranch]) {
        let mut current = self.root();
        for branch in scenario {
            let existing = self.node(current).children.get(branch).copied();
            current = match existing {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Some(TrieNode::default()));
                    self.node_mut(current).children.insert(branch.clone(), child);
                    child
                }
            };
        }
    }

    fn merge_tails(&mut self) {
        let leaves = self
            .node_ids()
            .filter(|id| *id != self.root() && self.node(*id).children.is_empty())
            .collect::<Vec<NodeId>>();
        if leaves.is_empty() {
            return;
        }
        let tail = self.nodes.len();
        self.nodes.push(Some(TrieNode::default()));
        for leaf in leaves.iter() {
            self.nodes[*leaf] = None;
        }
        for node in self.nodes.iter_mut().flatten() {
            for child in node.children.values_mut() {
                if is_removed(&leaves, *child) {
                    *child = tail;
                }
            }
        }
    }

    fn node(&self, id: NodeId) -> &TrieNode {
        self.nodes[id]
            .as_ref()
            .unwrap_or_else(|| panic!("no trie node with id {}", id))
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TrieNode {
        self.nodes[id]
            .as_mut()
            .unwrap_or_else(|| panic!("no trie node with id {}", id))
    }

    /// Returns the id of the root node.
    pub fn root(&self) -> NodeId {
        0
    }

    /// Returns `true` iff no scenario step was inserted.
    pub fn is_empty(&self) -> bool {
        self.node(self.root()).children.is_empty()
    }

    /// Iterates over the ids of the nodes of the trie.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|_| i))
    }

    /// Returns the number of nodes of the trie.
    pub fn n_nodes(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Iterates over the outgoing branches of a node, as pairs (branch, child).
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (&ScenarioBranch, NodeId)> + '_ {
        self.node(id).children.iter().map(|(b, c)| (b, *c))
    }
}

fn is_removed(removed: &[NodeId], id: NodeId) -> bool {
    removed.binary_search(&id).is_ok()
}
