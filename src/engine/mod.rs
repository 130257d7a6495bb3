mod advisor;
mod duration;
mod graph;
mod optimizer;
mod schedule;
mod validation;

use indexmap::IndexMap;
use log::{debug, info};

pub use graph::{build_graph, normalize_needs, DependencyGraph};
pub use optimizer::optimize;

use crate::analysis::AnalysisResult;
use crate::workflow::Job;

/// Tunable thresholds for the analysis passes.
///
/// The defaults match the heuristics the tool was calibrated with; the
/// config file can override any of them.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Node weight when a job has no usable duration estimate, in seconds.
    pub default_job_duration: u64,
    /// Minimum number of blocked dependents for a bottleneck.
    pub bottleneck_min_blocked: usize,
    /// Maximum chain length (in jobs) before a long-chain suggestion fires.
    pub long_chain_threshold: usize,
    /// Minimum step count before a bottleneck is worth splitting.
    pub split_step_threshold: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_job_duration: 60,
            bottleneck_min_blocked: 3,
            long_chain_threshold: 4,
            split_step_threshold: 5,
        }
    }
}

/// Analyzes a job map: graph construction, validation, scheduling metrics,
/// and optimization suggestions.
///
/// Pure function of the input: the caller's map is cloned and never
/// mutated, so concurrent invocations over different files need no
/// coordination. A cycle anywhere in the graph empties the stages and the
/// critical path rather than producing a partial answer.
pub fn analyze(jobs: &IndexMap<String, Job>, settings: &EngineSettings) -> AnalysisResult {
    info!("Analyzing dependencies of {} jobs", jobs.len());

    let mut jobs = jobs.clone();
    for job in jobs.values_mut() {
        // A zero estimate means the step list told us nothing; leave the
        // weight to the configured default.
        job.estimated_duration =
            Some(duration::estimate_duration(&job.steps)).filter(|&secs| secs > 0);
        job.can_parallelize = duration::can_parallelize(&job.steps);
        debug!(
            "Job '{}': estimated {:?}s, parallelizable: {}",
            job.name, job.estimated_duration, job.can_parallelize
        );
    }

    let (graph, mut issues) = build_graph(&jobs);

    let cycle_issues = validation::check_cycles(&graph);
    let acyclic = cycle_issues.is_empty();
    issues.extend(cycle_issues);
    issues.extend(validation::check_redundant_dependencies(&graph));

    // Weighted analysis is gated on acyclicity; execution_stages also
    // detects cycles on its own, but the gate keeps the contract explicit.
    let stages = if acyclic {
        schedule::execution_stages(&graph)
    } else {
        Vec::new()
    };
    let critical_path =
        schedule::critical_path(&graph, &jobs, &stages, settings.default_job_duration);
    let total_serial_time = schedule::serial_time(&jobs, settings.default_job_duration);
    let optimal_parallel_time =
        schedule::parallel_time(&jobs, &stages, settings.default_job_duration);
    let bottlenecks = schedule::find_bottlenecks(&graph, &stages, settings.bottleneck_min_blocked);
    let suggestions = advisor::suggest(&jobs, &graph, &stages, &bottlenecks, settings);

    let edges = graph.edges();
    AnalysisResult {
        jobs,
        edges,
        execution_stages: stages,
        critical_path,
        total_serial_time,
        optimal_parallel_time,
        bottlenecks,
        issues,
        suggestions,
    }
}
