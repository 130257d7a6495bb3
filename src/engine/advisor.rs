use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::debug;

use super::graph::{normalize_needs, DependencyGraph};
use super::EngineSettings;
use crate::analysis::OptimizationSuggestion;
use crate::workflow::Job;

/// Within each stage, the jobs no other member of that stage feeds into.
///
/// Stages with at least two independent jobs are flagged as groups.
pub fn independent_stage_groups(
    graph: &DependencyGraph,
    stages: &[Vec<String>],
) -> Vec<Vec<String>> {
    let mut groups = Vec::new();

    for stage in stages {
        let independent: Vec<String> = stage
            .iter()
            .filter(|job| {
                !stage
                    .iter()
                    .any(|other| other != *job && graph.has_edge(other, job))
            })
            .cloned()
            .collect();
        if independent.len() > 1 {
            debug!("Found parallelizable jobs: {independent:?}");
            groups.push(independent);
        }
    }

    groups
}

/// Groups jobs whose normalized dependency-name sets are set-equal,
/// regardless of stage membership. Only groups of two or more are kept.
pub fn identical_needs_groups(jobs: &IndexMap<String, Job>) -> Vec<Vec<String>> {
    let mut by_needs: IndexMap<BTreeSet<String>, Vec<String>> = IndexMap::new();

    for (name, job) in jobs {
        by_needs
            .entry(normalize_needs(&job.needs))
            .or_default()
            .push(name.clone());
    }

    by_needs
        .into_values()
        .filter(|group| group.len() > 1)
        .collect()
}

/// All flagged parallel groups: same-stage independents plus identical-needs
/// groups, in that order.
pub fn parallel_groups(
    jobs: &IndexMap<String, Job>,
    graph: &DependencyGraph,
    stages: &[Vec<String>],
) -> Vec<Vec<String>> {
    let mut groups = independent_stage_groups(graph, stages);
    groups.extend(identical_needs_groups(jobs));
    groups
}

/// Generates optimization suggestions for the analyzed graph.
///
/// Three independent detectors, in order: parallelizable job pairs (union of
/// the same-stage and identical-needs passes, deduplicated by unordered
/// pair), bottleneck jobs heavy enough to split, and the longest dependency
/// chain when it exceeds the configured hop threshold.
pub fn suggest(
    jobs: &IndexMap<String, Job>,
    graph: &DependencyGraph,
    stages: &[Vec<String>],
    bottlenecks: &[String],
    settings: &EngineSettings,
) -> Vec<OptimizationSuggestion> {
    let mut suggestions = Vec::new();
    let mut seen_pairs: BTreeSet<BTreeSet<String>> = BTreeSet::new();

    // Same-stage independents: one suggestion per unordered pair that shares
    // no downstream job.
    for group in independent_stage_groups(graph, stages) {
        for (i, job_a) in group.iter().enumerate() {
            for job_b in &group[i + 1..] {
                let shared: Vec<String> = graph
                    .descendants(job_a)
                    .intersection(&graph.descendants(job_b))
                    .cloned()
                    .collect();
                if shared.is_empty() {
                    push_pair(&mut suggestions, &mut seen_pairs, job_a, job_b);
                }
            }
        }
    }

    // Identical-needs groups pair up regardless of stage or descendants.
    for group in identical_needs_groups(jobs) {
        for (i, job_a) in group.iter().enumerate() {
            for job_b in &group[i + 1..] {
                push_pair(&mut suggestions, &mut seen_pairs, job_a, job_b);
            }
        }
    }

    for job in bottlenecks {
        let step_count = jobs.get(job).map_or(0, |j| j.steps.len());
        if step_count > settings.split_step_threshold {
            suggestions.push(OptimizationSuggestion::SplitBottleneckJob {
                job: job.clone(),
                step_count,
            });
        }
    }

    if let Some(path) = long_chain(graph, stages, settings.long_chain_threshold) {
        suggestions.push(OptimizationSuggestion::LongDependencyChain { path });
    }

    suggestions
}

fn push_pair(
    suggestions: &mut Vec<OptimizationSuggestion>,
    seen: &mut BTreeSet<BTreeSet<String>>,
    job_a: &str,
    job_b: &str,
) {
    let key: BTreeSet<String> = [job_a.to_string(), job_b.to_string()].into();
    if seen.insert(key) {
        suggestions.push(OptimizationSuggestion::ParallelizeIndependentJobs {
            job_a: job_a.to_string(),
            job_b: job_b.to_string(),
        });
    }
}

/// The longest directed path by hop count, when it exceeds `threshold` nodes.
///
/// Dynamic programming over the staged topological order; only the single
/// longest chain is reported, never an enumeration of all long chains.
fn long_chain(
    graph: &DependencyGraph,
    stages: &[Vec<String>],
    threshold: usize,
) -> Option<Vec<String>> {
    let topo: Vec<&str> = stages
        .iter()
        .flat_map(|stage| stage.iter().map(String::as_str))
        .collect();
    if topo.is_empty() {
        return None;
    }

    let mut hops: IndexMap<&str, usize> = topo.iter().map(|name| (*name, 1)).collect();
    let mut predecessor: IndexMap<&str, &str> = IndexMap::new();

    for name in &topo {
        let reach = hops[*name] + 1;
        for successor in graph.successors(name) {
            if reach > hops[successor] {
                hops[successor] = reach;
                predecessor.insert(successor, *name);
            }
        }
    }

    let mut end = topo[0];
    for name in &topo[1..] {
        if hops[*name] > hops[end] {
            end = *name;
        }
    }
    if hops[end] <= threshold {
        return None;
    }

    let mut path = vec![end];
    while let Some(prev) = predecessor.get(path[path.len() - 1]) {
        path.push(*prev);
    }
    path.reverse();

    Some(path.into_iter().map(str::to_string).collect())
}
