use indexmap::IndexMap;
use log::debug;

use super::graph::DependencyGraph;
use crate::analysis::CriticalPath;
use crate::workflow::Job;

/// Node weight used by every duration-based computation.
pub(super) fn weight(jobs: &IndexMap<String, Job>, name: &str, default_duration: u64) -> u64 {
    jobs.get(name)
        .and_then(|job| job.estimated_duration)
        .unwrap_or(default_duration)
}

/// Partitions the graph into generations of jobs that can start together.
///
/// Kahn-style peeling: each stage collects every node whose predecessors
/// have all been placed in earlier stages. Returns an empty list when the
/// graph contains a cycle; a partial staging would be wrong, not helpful.
pub fn execution_stages(graph: &DependencyGraph) -> Vec<Vec<String>> {
    if graph.node_count() == 0 {
        return Vec::new();
    }

    let mut remaining: IndexMap<&str, usize> = graph
        .nodes()
        .map(|name| (name, graph.in_degree(name)))
        .collect();
    let mut stages: Vec<Vec<String>> = Vec::new();
    let mut placed = 0;

    loop {
        let ready: Vec<&str> = remaining
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();
        if ready.is_empty() {
            break;
        }

        for name in &ready {
            remaining.shift_remove(*name);
        }
        for name in &ready {
            for successor in graph.successors(name) {
                if let Some(degree) = remaining.get_mut(successor) {
                    *degree -= 1;
                }
            }
        }

        placed += ready.len();
        stages.push(ready.into_iter().map(str::to_string).collect());
    }

    if placed < graph.node_count() {
        debug!("Cannot calculate stages - graph has cycles");
        return Vec::new();
    }

    debug!("Calculated {} execution stages", stages.len());
    stages
}

/// Finds the duration-weighted longest path through the graph.
///
/// Dynamic programming over a topological order (the flattened stages):
/// `dist[n]` is the weight of the heaviest chain finishing before n starts,
/// with a predecessor pointer recorded on every improvement. Ties for the
/// heaviest endpoint resolve to the node that appears first in the
/// topological order. Empty on a cyclic graph.
pub fn critical_path(
    graph: &DependencyGraph,
    jobs: &IndexMap<String, Job>,
    stages: &[Vec<String>],
    default_duration: u64,
) -> CriticalPath {
    let topo: Vec<&str> = stages
        .iter()
        .flat_map(|stage| stage.iter().map(String::as_str))
        .collect();
    if topo.is_empty() {
        return CriticalPath::default();
    }

    let mut dist: IndexMap<&str, u64> = topo.iter().map(|name| (*name, 0)).collect();
    let mut predecessor: IndexMap<&str, &str> = IndexMap::new();

    for name in &topo {
        let reach = dist[*name] + weight(jobs, name, default_duration);
        for successor in graph.successors(name) {
            if reach > dist[successor] {
                dist[successor] = reach;
                predecessor.insert(successor, *name);
            }
        }
    }

    // Strict comparison keeps the first topo-order node on ties.
    let mut end = topo[0];
    for name in &topo[1..] {
        if dist[*name] > dist[end] {
            end = *name;
        }
    }

    let mut path = vec![end];
    while let Some(prev) = predecessor.get(path[path.len() - 1]) {
        path.push(*prev);
    }
    path.reverse();

    let total_duration = path
        .iter()
        .map(|name| weight(jobs, name, default_duration))
        .sum();
    let jobs_on_path: Vec<String> = path.into_iter().map(str::to_string).collect();

    debug!("Critical path: {}", jobs_on_path.join(" -> "));
    CriticalPath {
        jobs: jobs_on_path,
        total_duration,
    }
}

/// Total time if every job ran sequentially.
pub fn serial_time(jobs: &IndexMap<String, Job>, default_duration: u64) -> u64 {
    jobs.keys()
        .map(|name| weight(jobs, name, default_duration))
        .sum()
}

/// Lower bound with unlimited parallelism: each stage costs its slowest job.
pub fn parallel_time(
    jobs: &IndexMap<String, Job>,
    stages: &[Vec<String>],
    default_duration: u64,
) -> u64 {
    stages
        .iter()
        .map(|stage| {
            stage
                .iter()
                .map(|name| weight(jobs, name, default_duration))
                .max()
                .unwrap_or(0)
        })
        .sum()
}

/// Jobs whose graph position disproportionately constrains parallelism.
///
/// Either the job blocks at least `min_blocked` dependents, or it is the
/// sole member of its stage while gating at least one later job. Each
/// qualifying job is reported exactly once.
pub fn find_bottlenecks(
    graph: &DependencyGraph,
    stages: &[Vec<String>],
    min_blocked: usize,
) -> Vec<String> {
    let mut bottlenecks: Vec<String> = Vec::new();

    for name in graph.nodes() {
        let out_degree = graph.out_degree(name);
        if out_degree >= min_blocked {
            debug!("Bottleneck: {name} blocks {out_degree} jobs");
            bottlenecks.push(name.to_string());
        }
    }

    for stage in stages {
        if let [only] = stage.as_slice() {
            if graph.out_degree(only) > 0 && !bottlenecks.contains(only) {
                debug!("Bottleneck: {only} is alone in its stage");
                bottlenecks.push(only.clone());
            }
        }
    }

    bottlenecks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graph::build_graph;
    use crate::engine::graph::tests::{job_map, job_with_needs};

    fn stage_index(stages: &[Vec<String>], name: &str) -> usize {
        stages
            .iter()
            .position(|stage| stage.iter().any(|n| n == name))
            .unwrap_or_else(|| panic!("{name} not staged"))
    }

    mod execution_stage_tests {
        use super::*;

        #[test]
        fn test_linear_chain_stages() {
            // Scenario A topology.
            let jobs = job_map(&[
                ("build", &[]),
                ("test", &["build"]),
                ("deploy", &["build", "test"]),
            ]);
            let (graph, _) = build_graph(&jobs);

            let stages = execution_stages(&graph);

            assert_eq!(
                stages,
                vec![
                    vec!["build".to_string()],
                    vec!["test".to_string()],
                    vec!["deploy".to_string()],
                ]
            );
        }

        #[test]
        fn test_diamond_stages() {
            // Scenario B topology.
            let jobs = job_map(&[
                ("build", &[]),
                ("lint", &[]),
                ("test", &["build"]),
                ("package", &["build", "lint"]),
            ]);
            let (graph, _) = build_graph(&jobs);

            let stages = execution_stages(&graph);

            assert_eq!(stages.len(), 2);
            assert_eq!(stages[0], vec!["build".to_string(), "lint".to_string()]);
            assert_eq!(stages[1], vec!["test".to_string(), "package".to_string()]);
        }

        #[test]
        fn test_every_node_in_exactly_one_stage() {
            let jobs = job_map(&[
                ("a", &[]),
                ("b", &["a"]),
                ("c", &["a"]),
                ("d", &["b", "c"]),
                ("e", &[]),
            ]);
            let (graph, _) = build_graph(&jobs);

            let stages = execution_stages(&graph);

            let staged: usize = stages.iter().map(Vec::len).sum();
            assert_eq!(staged, graph.node_count());
            // Edge endpoints must be in strictly increasing stages.
            for (from, to) in graph.edges() {
                assert!(stage_index(&stages, &from) < stage_index(&stages, &to));
            }
        }

        #[test]
        fn test_cyclic_graph_returns_empty() {
            let jobs = job_map(&[("x", &["y"]), ("y", &["x"])]);
            let (graph, _) = build_graph(&jobs);

            assert!(execution_stages(&graph).is_empty());
        }

        #[test]
        fn test_empty_graph() {
            let graph = DependencyGraph::new();

            assert!(execution_stages(&graph).is_empty());
        }
    }

    mod critical_path_tests {
        use super::*;

        #[test]
        fn test_linear_chain_is_its_own_critical_path() {
            let jobs = job_map(&[
                ("build", &[]),
                ("test", &["build"]),
                ("deploy", &["build", "test"]),
            ]);
            let (graph, _) = build_graph(&jobs);
            let stages = execution_stages(&graph);

            let path = critical_path(&graph, &jobs, &stages, 60);

            assert_eq!(
                path.jobs,
                vec!["build".to_string(), "test".to_string(), "deploy".to_string()]
            );
            assert_eq!(path.total_duration, 180);
        }

        #[test]
        fn test_heavier_branch_wins() {
            let mut jobs = job_map(&[
                ("a", &[]),
                ("fast", &["a"]),
                ("slow", &["a"]),
                ("z", &["fast", "slow"]),
            ]);
            jobs.get_mut("fast").unwrap().estimated_duration = Some(10);
            jobs.get_mut("slow").unwrap().estimated_duration = Some(500);
            let (graph, _) = build_graph(&jobs);
            let stages = execution_stages(&graph);

            let path = critical_path(&graph, &jobs, &stages, 60);

            assert_eq!(
                path.jobs,
                vec!["a".to_string(), "slow".to_string(), "z".to_string()]
            );
            assert_eq!(path.total_duration, 60 + 500 + 60);
        }

        #[test]
        fn test_tie_resolves_to_first_in_topo_order() {
            // Two equal-weight sinks; the one staged first wins.
            let jobs = job_map(&[("root", &[]), ("left", &["root"]), ("right", &["root"])]);
            let (graph, _) = build_graph(&jobs);
            let stages = execution_stages(&graph);

            let path = critical_path(&graph, &jobs, &stages, 60);

            assert_eq!(path.jobs, vec!["root".to_string(), "left".to_string()]);
        }

        #[test]
        fn test_cyclic_graph_returns_empty_path() {
            let jobs = job_map(&[("x", &["y"]), ("y", &["x"])]);
            let (graph, _) = build_graph(&jobs);
            let stages = execution_stages(&graph);

            let path = critical_path(&graph, &jobs, &stages, 60);

            assert!(path.jobs.is_empty());
            assert_eq!(path.total_duration, 0);
        }
    }

    mod timing_tests {
        use super::*;

        #[test]
        fn test_scenario_a_serial_equals_parallel() {
            // A fully linear chain cannot be compressed.
            let jobs = job_map(&[
                ("build", &[]),
                ("test", &["build"]),
                ("deploy", &["build", "test"]),
            ]);
            let (graph, _) = build_graph(&jobs);
            let stages = execution_stages(&graph);

            assert_eq!(serial_time(&jobs, 60), 180);
            assert_eq!(parallel_time(&jobs, &stages, 60), 180);
        }

        #[test]
        fn test_scenario_b_parallel_time_sums_stage_maxima() {
            let mut jobs = job_map(&[
                ("build", &[]),
                ("lint", &[]),
                ("test", &["build"]),
                ("package", &["build", "lint"]),
            ]);
            jobs.get_mut("build").unwrap().estimated_duration = Some(100);
            jobs.get_mut("lint").unwrap().estimated_duration = Some(40);
            jobs.get_mut("test").unwrap().estimated_duration = Some(80);
            jobs.get_mut("package").unwrap().estimated_duration = Some(20);
            let (graph, _) = build_graph(&jobs);
            let stages = execution_stages(&graph);

            // max(build, lint) + max(test, package)
            assert_eq!(parallel_time(&jobs, &stages, 60), 100 + 80);
            assert_eq!(serial_time(&jobs, 60), 240);
        }

        #[test]
        fn test_parallel_never_exceeds_serial() {
            let jobs = job_map(&[
                ("a", &[]),
                ("b", &[]),
                ("c", &["a", "b"]),
                ("d", &["c"]),
            ]);
            let (graph, _) = build_graph(&jobs);
            let stages = execution_stages(&graph);

            assert!(parallel_time(&jobs, &stages, 60) <= serial_time(&jobs, 60));
        }

        #[test]
        fn test_default_weight_applies_when_duration_missing() {
            let jobs = job_map(&[("only", &[])]);

            assert_eq!(serial_time(&jobs, 60), 60);
            assert_eq!(serial_time(&jobs, 45), 45);
        }
    }

    mod bottleneck_tests {
        use super::*;
        use indexmap::IndexMap;

        #[test]
        fn test_high_out_degree_is_a_bottleneck() {
            let jobs = job_map(&[
                ("setup", &[]),
                ("a", &["setup"]),
                ("b", &["setup"]),
                ("c", &["setup"]),
            ]);
            let (graph, _) = build_graph(&jobs);
            let stages = execution_stages(&graph);

            let bottlenecks = find_bottlenecks(&graph, &stages, 3);

            assert_eq!(bottlenecks, vec!["setup".to_string()]);
        }

        #[test]
        fn test_sole_stage_member_with_dependents_is_a_bottleneck() {
            let jobs = job_map(&[("build", &[]), ("test", &["build"])]);
            let (graph, _) = build_graph(&jobs);
            let stages = execution_stages(&graph);

            let bottlenecks = find_bottlenecks(&graph, &stages, 3);

            // build gates the next stage alone; test gates nothing.
            assert_eq!(bottlenecks, vec!["build".to_string()]);
        }

        #[test]
        fn test_qualifying_both_ways_is_reported_once() {
            let jobs = job_map(&[
                ("setup", &[]),
                ("a", &["setup"]),
                ("b", &["setup"]),
                ("c", &["setup"]),
            ]);
            let (graph, _) = build_graph(&jobs);
            let stages = execution_stages(&graph);

            let bottlenecks = find_bottlenecks(&graph, &stages, 3);

            assert_eq!(
                bottlenecks.iter().filter(|n| *n == "setup").count(),
                1
            );
        }

        #[test]
        fn test_terminal_sole_job_is_not_a_bottleneck() {
            let jobs: IndexMap<String, crate::workflow::Job> =
                [("only".to_string(), job_with_needs("only", &[]))]
                    .into_iter()
                    .collect();
            let (graph, _) = build_graph(&jobs);
            let stages = execution_stages(&graph);

            assert!(find_bottlenecks(&graph, &stages, 3).is_empty());
        }
    }
}
