//! Ordering of converters by their declared predecessors
//!
//! A provider may name converters that must run before it. The order is a
//! topological sort (Kahn's algorithm); among converters with no ordering
//! constraint between them, registration order wins, so the result is
//! stable across runs.
//!
//! # Example
//!
//! ```
//! use conv_core::ordering::ConverterGraph;
//!
//! let mut graph = ConverterGraph::new();
//! graph.add_node("rename-modules");
//! graph.add_node("bump-version");
//! graph.add_edge("rename-modules", "bump-version");
//!
//! let order = graph.topological_sort().unwrap();
//! assert_eq!(order, vec!["bump-version", "rename-modules"]);
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::{Error, Result};

/// Directed graph of converter ids.
///
/// Edges point from a converter to one that must precede it.
#[derive(Debug, Clone, Default)]
pub struct ConverterGraph {
    /// Node ids in registration order
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    /// `edges[i]` holds the indices node `i` waits for
    edges: Vec<HashSet<usize>>,
}

impl ConverterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a converter. Adding an id twice keeps the first position and
    /// returns `false`.
    pub fn add_node(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(id);
        self.edges.push(HashSet::new());
        true
    }

    /// Declare that `from` runs after `to`.
    ///
    /// Edges naming an unregistered converter are ignored: a provider may
    /// list predecessors that are not installed.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&from_idx), Some(&to_idx)) => {
                self.edges[from_idx].insert(to_idx);
            }
            _ => tracing::debug!(from, to, "ignoring ordering edge to unknown converter"),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(HashSet::len).sum()
    }

    /// Direct predecessors of a converter, in registration order.
    pub fn predecessors_of(&self, id: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut preceding: Vec<usize> = self.edges[idx].iter().copied().collect();
        preceding.sort_unstable();
        preceding.into_iter().map(|i| self.nodes[i].as_str()).collect()
    }

    /// Sort converters so each one comes after everything it waits for.
    ///
    /// # Errors
    ///
    /// Returns `Error::DependencyCycle` naming every converter that could
    /// not be placed.
    pub fn topological_sort(&self) -> Result<Vec<&str>> {
        let mut pending: Vec<usize> = self.edges.iter().map(HashSet::len).collect();

        // Lowest registration index first
        let mut ready: BTreeSet<usize> = (0..self.nodes.len()).filter(|&i| pending[i] == 0).collect();

        let mut result = Vec::with_capacity(self.nodes.len());
        while let Some(current) = ready.pop_first() {
            result.push(self.nodes[current].as_str());
            for (node, waits_for) in self.edges.iter().enumerate() {
                if waits_for.contains(&current) {
                    pending[node] -= 1;
                    if pending[node] == 0 {
                        ready.insert(node);
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            let participants = self
                .nodes
                .iter()
                .enumerate()
                .filter(|&(i, _)| pending[i] > 0)
                .map(|(_, id)| id.clone())
                .collect();
            return Err(Error::DependencyCycle { participants });
        }

        Ok(result)
    }
}
