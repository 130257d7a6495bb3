use std::collections::{BTreeSet, HashSet};

use log::debug;

use super::graph::DependencyGraph;
use crate::analysis::DependencyIssue;

/// Enumerates every simple cycle in the graph.
///
/// Per-root enumeration over the unretired subgraph: roots are taken in
/// node order, the walk only enters nodes no earlier root has claimed, and
/// a cycle is emitted exactly when the walk returns to the current root.
/// Each simple cycle is therefore reported once, rooted at its earliest
/// node, and cycles sharing nodes or edges are all found.
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let mut cycles = Vec::new();
    let mut retired: HashSet<&str> = HashSet::new();

    for root in graph.nodes() {
        let mut path = vec![root];
        let mut on_path: HashSet<&str> = [root].into();
        dfs(graph, root, &retired, &mut path, &mut on_path, &mut cycles);
        retired.insert(root);
    }

    cycles
}

fn dfs<'a>(
    graph: &'a DependencyGraph,
    root: &str,
    retired: &HashSet<&'a str>,
    path: &mut Vec<&'a str>,
    on_path: &mut HashSet<&'a str>,
    cycles: &mut Vec<Vec<String>>,
) {
    let current = path[path.len() - 1];
    for successor in graph.successors(current) {
        if successor == root {
            cycles.push(path.iter().map(|name| (*name).to_string()).collect());
        } else if !retired.contains(successor) && on_path.insert(successor) {
            path.push(successor);
            dfs(graph, root, retired, path, on_path, cycles);
            path.pop();
            on_path.remove(successor);
        }
    }
}

pub fn is_acyclic(graph: &DependencyGraph) -> bool {
    find_cycles(graph).is_empty()
}

/// One `CircularDependency` issue per enumerated cycle.
pub fn check_cycles(graph: &DependencyGraph) -> Vec<DependencyIssue> {
    find_cycles(graph)
        .into_iter()
        .map(|cycle| DependencyIssue::CircularDependency { cycle })
        .collect()
}

/// The redundant direct dependencies of a single job, with their witnesses.
///
/// A direct dependency d2 is redundant when some other direct dependency d1
/// already reaches d2 through its ancestors; `implied_by` collects every
/// such d1, not just the first one found.
pub fn redundant_dependencies_of(
    graph: &DependencyGraph,
    job: &str,
) -> Vec<(String, BTreeSet<String>)> {
    let direct: BTreeSet<String> = graph.predecessors(job).map(str::to_string).collect();
    if direct.len() < 2 {
        return Vec::new();
    }

    let mut redundant = Vec::new();
    for candidate in &direct {
        let witnesses: BTreeSet<String> = direct
            .iter()
            .filter(|other| *other != candidate && graph.ancestors(other).contains(candidate))
            .cloned()
            .collect();
        if !witnesses.is_empty() {
            redundant.push((candidate.clone(), witnesses));
        }
    }

    redundant
}

/// Reports every declared direct dependency already implied by another one.
pub fn check_redundant_dependencies(graph: &DependencyGraph) -> Vec<DependencyIssue> {
    let mut issues = Vec::new();

    for job in graph.nodes() {
        for (dependency, implied_by) in redundant_dependencies_of(graph, job) {
            debug!("Job '{job}' has redundant dependency on '{dependency}'");
            issues.push(DependencyIssue::RedundantDependency {
                job: job.to_string(),
                dependency,
                implied_by,
            });
        }
    }

    issues
}
