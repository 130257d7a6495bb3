use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};

use crate::analysis::DependencyIssue;
use crate::workflow::{Job, NeedsDecl};

/// Directed graph over job names.
///
/// Purpose-built adjacency structure: forward adjacency for successors and
/// reverse adjacency for predecessor/ancestor queries, which is everything
/// the analysis passes need. Insertion order is preserved so every
/// derived result is deterministic for a given job map.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    successors: IndexMap<String, IndexSet<String>>,
    predecessors: IndexMap<String, IndexSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str) {
        self.successors.entry(name.to_string()).or_default();
        self.predecessors.entry(name.to_string()).or_default();
    }

    /// Adds edge `from -> to`, inserting either endpoint if missing.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.add_node(from);
        self.add_node(to);
        self.successors[from].insert(to.to_string());
        self.predecessors[to].insert(from.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.successors.contains_key(name)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.successors
            .get(from)
            .is_some_and(|succs| succs.contains(to))
    }

    pub fn node_count(&self) -> usize {
        self.successors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.successors.values().map(IndexSet::len).sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.successors.keys().map(String::as_str)
    }

    /// All edges as (dependency, dependent) pairs, in insertion order.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.successors
            .iter()
            .flat_map(|(from, succs)| {
                succs.iter().map(move |to| (from.clone(), to.clone()))
            })
            .collect()
    }

    pub fn successors(&self, name: &str) -> impl Iterator<Item = &str> {
        self.successors
            .get(name)
            .into_iter()
            .flat_map(|succs| succs.iter().map(String::as_str))
    }

    pub fn predecessors(&self, name: &str) -> impl Iterator<Item = &str> {
        self.predecessors
            .get(name)
            .into_iter()
            .flat_map(|preds| preds.iter().map(String::as_str))
    }

    pub fn out_degree(&self, name: &str) -> usize {
        self.successors.get(name).map_or(0, IndexSet::len)
    }

    pub fn in_degree(&self, name: &str) -> usize {
        self.predecessors.get(name).map_or(0, IndexSet::len)
    }

    /// Every node from which `name` is reachable (reverse traversal).
    pub fn ancestors(&self, name: &str) -> BTreeSet<String> {
        self.closure(name, |graph, node| {
            Box::new(graph.predecessors(node))
        })
    }

    /// Every node reachable from `name` (forward traversal).
    pub fn descendants(&self, name: &str) -> BTreeSet<String> {
        self.closure(name, |graph, node| {
            Box::new(graph.successors(node))
        })
    }

    fn closure<'a, F>(&'a self, start: &str, neighbors: F) -> BTreeSet<String>
    where
        F: Fn(&'a Self, &str) -> Box<dyn Iterator<Item = &'a str> + 'a>,
    {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<String> = neighbors(self, start).map(str::to_string).collect();

        while let Some(node) = stack.pop() {
            if seen.insert(node.clone()) {
                stack.extend(neighbors(self, &node).map(str::to_string));
            }
        }

        seen
    }
}

/// Normalizes a raw dependency declaration into a canonical name set.
///
/// The single place that branches on declaration shape; duplicates collapse
/// and ordering carries no meaning.
pub fn normalize_needs(needs: &NeedsDecl) -> BTreeSet<String> {
    match needs {
        NeedsDecl::Single(name) => [name.clone()].into(),
        NeedsDecl::List(entries) => entries
            .iter()
            .map(|entry| entry.job_name().to_string())
            .collect(),
        NeedsDecl::Map(keys) => keys.keys().cloned().collect(),
    }
}

/// Builds the dependency graph for a job map.
///
/// Every job becomes a node. Each normalized dependency name becomes an edge
/// dependency -> job only when the name is a known job; dangling names are
/// reported as `MissingDependency` issues and never become edges, so every
/// downstream pass operates on the maximal feasible subgraph.
pub fn build_graph(jobs: &IndexMap<String, Job>) -> (DependencyGraph, Vec<DependencyIssue>) {
    let mut graph = DependencyGraph::new();
    let mut issues = Vec::new();

    for name in jobs.keys() {
        graph.add_node(name);
    }

    for (name, job) in jobs {
        for dependency in normalize_needs(&job.needs) {
            if jobs.contains_key(&dependency) {
                graph.add_edge(&dependency, name);
            } else {
                warn!("Job '{name}' depends on non-existent job '{dependency}'");
                issues.push(DependencyIssue::MissingDependency {
                    job: name.clone(),
                    missing: dependency,
                });
            }
        }
    }

    debug!(
        "Built dependency graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    (graph, issues)
}
