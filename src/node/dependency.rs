use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Mutex;

/// Directed graph with a depth-first cycle check.
///
/// Edges are append-only; the graph is never pruned and grows for the
/// process lifetime.
#[derive(Debug, Default)]
pub struct DependencyGraph<N> {
    edges: HashMap<N, Vec<N>>,
}

impl<N: Eq + Hash + Copy> DependencyGraph<N> {
    pub fn new() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    pub fn add_edge(&mut self, from: N, to: N) {
        self.edges.entry(from).or_default().push(to);
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|targets| targets.len()).sum()
    }

    /// True if any component of the graph contains a cycle. A back-edge into
    /// a node still on the recursion stack is the cycle signal.
    pub fn is_cyclic(&self) -> bool {
        let mut visited = HashSet::new();
        let mut stack = HashSet::new();
        for node in self.edges.keys() {
            if !visited.contains(node) && self.dfs(*node, &mut visited, &mut stack) {
                return true;
            }
        }
        false
    }

    fn dfs(&self, node: N, visited: &mut HashSet<N>, stack: &mut HashSet<N>) -> bool {
        visited.insert(node);
        stack.insert(node);
        for &neighbor in self.edges.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
            if !visited.contains(&neighbor) {
                if self.dfs(neighbor, visited, stack) {
                    return true;
                }
            } else if stack.contains(&neighbor) {
                return true;
            }
        }
        stack.remove(&node);
        false
    }
}

/// A vertex in a node's step-dependency history. Transaction ids and hop ids
/// are distinct kinds, so a transaction sharing a number with a hop position
/// never reads as a self-loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepNode {
    Transaction(u64),
    Hop(u32),
}

/// Per-node serializability gate. Records one `Transaction -> Hop` edge for
/// every hop the node processes and answers cycle queries over the whole
/// accumulated history.
pub struct DependencyTracker {
    graph: Mutex<DependencyGraph<StepNode>>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self {
            graph: Mutex::new(DependencyGraph::new()),
        }
    }

    pub fn record(&self, transaction_id: u64, hop_id: u32) {
        let mut graph = self.graph.lock().unwrap();
        graph.add_edge(StepNode::Transaction(transaction_id), StepNode::Hop(hop_id));
    }

    pub fn has_cycle(&self) -> bool {
        self.graph.lock().unwrap().is_cyclic()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.lock().unwrap().edge_count()
    }
}

impl Default for DependencyTracker {
    fn default() -> Self {
        Self::new()
    }
}
