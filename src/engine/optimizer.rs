use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::{debug, info};

use super::advisor::parallel_groups;
use super::graph::{build_graph, normalize_needs, DependencyGraph};
use super::schedule::execution_stages;
use super::validation::{is_acyclic, redundant_dependencies_of};
use crate::analysis::{ChangeReason, DependencyChange, OptimizeResult};
use crate::workflow::Job;

/// Rewrites the dependency map to maximize achievable parallelism.
///
/// Two passes over a fresh graph: redundant declared dependencies are
/// dropped (the implying path keeps reachability intact), then any flagged
/// parallel group that is still serialized by intra-group edges has those
/// edges removed. Always returns a new map plus an ordered change-log; the
/// caller's job map is never touched. On a cyclic graph nothing is removed,
/// since ancestor queries are only meaningful on a DAG.
pub fn optimize(jobs: &IndexMap<String, Job>) -> OptimizeResult {
    let (graph, _) = build_graph(jobs);

    // Declared lists survive verbatim (dangling names included); only the
    // logged removals may shrink them.
    let mut dependencies: IndexMap<String, Vec<String>> = jobs
        .iter()
        .map(|(name, job)| {
            (
                name.clone(),
                normalize_needs(&job.needs).into_iter().collect(),
            )
        })
        .collect();
    let mut changes = Vec::new();

    if !is_acyclic(&graph) {
        debug!("Graph has cycles, skipping dependency optimization");
        return OptimizeResult {
            dependencies,
            changes,
        };
    }

    remove_redundant_dependencies(&graph, &mut dependencies, &mut changes);

    let stages = execution_stages(&graph);
    unserialize_parallel_groups(
        jobs,
        &graph,
        &stages,
        &mut dependencies,
        &mut changes,
    );

    info!("Made {} dependency optimization(s)", changes.len());
    OptimizeResult {
        dependencies,
        changes,
    }
}

/// Drops every declared direct dependency already implied by another one.
///
/// Removals for one job form a single atomic batch computed against the
/// original direct set. Each candidate is confirmed against the
/// post-removal set: it must still be an ancestor of a surviving direct
/// dependency, so a batch can never delete the only witness that justified
/// removing a different edge.
fn remove_redundant_dependencies(
    graph: &DependencyGraph,
    dependencies: &mut IndexMap<String, Vec<String>>,
    changes: &mut Vec<DependencyChange>,
) {
    let names: Vec<String> = dependencies.keys().cloned().collect();

    for name in names {
        let candidates = redundant_dependencies_of(graph, &name);
        if candidates.is_empty() {
            continue;
        }

        let candidate_names: BTreeSet<String> =
            candidates.iter().map(|(dep, _)| dep.clone()).collect();
        let mut surviving: BTreeSet<String> = graph
            .predecessors(&name)
            .filter(|dep| !candidate_names.contains(*dep))
            .map(str::to_string)
            .collect();

        let mut removed = Vec::new();
        for (candidate, _) in &candidates {
            let still_implied = surviving
                .iter()
                .any(|dep| dep != candidate && graph.ancestors(dep).contains(candidate));
            if still_implied {
                removed.push(candidate.clone());
            } else {
                surviving.insert(candidate.clone());
            }
        }

        if !removed.is_empty() {
            debug!("Job '{name}' loses redundant dependencies: {removed:?}");
            dependencies[&name].retain(|dep| !removed.contains(dep));
            changes.push(DependencyChange {
                job: name,
                removed,
                reason: ChangeReason::RemoveRedundantDependency,
            });
        }
    }
}

/// Removes intra-group edges from flagged parallel groups.
///
/// A group that could run in parallel but has direct edges between its own
/// members is serialized by accident; removals are scoped strictly to
/// dependencies inside the group, one atomic batch per member.
fn unserialize_parallel_groups(
    jobs: &IndexMap<String, Job>,
    graph: &DependencyGraph,
    stages: &[Vec<String>],
    dependencies: &mut IndexMap<String, Vec<String>>,
    changes: &mut Vec<DependencyChange>,
) {
    for group in parallel_groups(jobs, graph, stages) {
        let members: BTreeSet<&str> = group.iter().map(String::as_str).collect();
        let serialized = group.iter().any(|a| {
            group
                .iter()
                .any(|b| a != b && (graph.has_edge(a, b) || graph.has_edge(b, a)))
        });
        if !serialized {
            continue;
        }

        for member in &group {
            let removed: Vec<String> = dependencies[member]
                .iter()
                .filter(|dep| dep.as_str() != member && members.contains(dep.as_str()))
                .cloned()
                .collect();
            if removed.is_empty() {
                continue;
            }

            dependencies[member].retain(|dep| !removed.contains(dep));
            debug!("Enabled parallel execution for job '{member}'");
            changes.push(DependencyChange {
                job: member.clone(),
                removed,
                reason: ChangeReason::EnableParallelization,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graph::tests::job_map;
    use crate::workflow::{NeedsDecl, NeedsEntry};

    fn jobs_from_dependency_map(dependencies: &IndexMap<String, Vec<String>>) -> IndexMap<String, Job> {
        dependencies
            .iter()
            .map(|(name, deps)| {
                let needs = NeedsDecl::List(
                    deps.iter().map(|d| NeedsEntry::Name(d.clone())).collect(),
                );
                (name.clone(), Job::new(name).with_needs(needs))
            })
            .collect()
    }

    #[test]
    fn test_scenario_c_redundant_edge_is_removed() {
        let jobs = job_map(&[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])]);

        let result = optimize(&jobs);

        assert_eq!(result.dependencies["c"], vec!["b".to_string()]);
        assert_eq!(
            result.changes,
            vec![DependencyChange {
                job: "c".to_string(),
                removed: vec!["a".to_string()],
                reason: ChangeReason::RemoveRedundantDependency,
            }]
        );
        // Unchanged jobs keep their lists in the returned map.
        assert_eq!(result.dependencies["b"], vec!["a".to_string()]);
        assert!(result.dependencies["a"].is_empty());
    }

    #[test]
    fn test_reachability_survives_removal() {
        let jobs = job_map(&[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])]);

        let result = optimize(&jobs);

        let reduced = jobs_from_dependency_map(&result.dependencies);
        let (graph, issues) = build_graph(&reduced);
        assert!(issues.is_empty());
        assert!(graph.ancestors("c").contains("a"));
    }

    #[test]
    fn test_optimizer_is_idempotent() {
        let jobs = job_map(&[
            ("a", &[]),
            ("b", &["a"]),
            ("c", &["b"]),
            ("d", &["a", "b", "c"]),
        ]);

        let first = optimize(&jobs);
        assert!(!first.changes.is_empty());

        let second = optimize(&jobs_from_dependency_map(&first.dependencies));

        assert!(second.changes.is_empty());
        assert_eq!(second.dependencies, first.dependencies);
    }

    #[test]
    fn test_deep_chain_collapses_to_nearest_dependency() {
        let jobs = job_map(&[
            ("a", &[]),
            ("b", &["a"]),
            ("c", &["b"]),
            ("d", &["a", "b", "c"]),
        ]);

        let result = optimize(&jobs);

        assert_eq!(result.dependencies["d"], vec!["c".to_string()]);
    }

    #[test]
    fn test_independent_parents_are_untouched() {
        let jobs = job_map(&[
            ("build", &[]),
            ("lint", &[]),
            ("package", &["build", "lint"]),
        ]);

        let result = optimize(&jobs);

        assert!(result.changes.is_empty());
        let mut package_deps = result.dependencies["package"].clone();
        package_deps.sort();
        assert_eq!(package_deps, vec!["build".to_string(), "lint".to_string()]);
    }

    #[test]
    fn test_cyclic_graph_is_left_alone() {
        let jobs = job_map(&[("x", &["y"]), ("y", &["x"]), ("z", &["x", "y"])]);

        let result = optimize(&jobs);

        assert!(result.changes.is_empty());
        assert_eq!(result.dependencies["x"], vec!["y".to_string()]);
        assert_eq!(result.dependencies["y"], vec!["x".to_string()]);
    }

    #[test]
    fn test_dangling_names_survive_unlogged() {
        let jobs = job_map(&[("build", &[]), ("test", &["build", "ghost"])]);

        let result = optimize(&jobs);

        assert!(result.changes.is_empty());
        assert!(result.dependencies["test"].contains(&"ghost".to_string()));
    }

    #[test]
    fn test_every_job_appears_in_the_rewritten_map() {
        let jobs = job_map(&[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])]);

        let result = optimize(&jobs);

        assert_eq!(result.dependencies.len(), jobs.len());
        for name in jobs.keys() {
            assert!(result.dependencies.contains_key(name));
        }
    }
}
