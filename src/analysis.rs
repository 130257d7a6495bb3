use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::workflow::{Job, Platform};

/// Top-level report for a single analyzed workflow file.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub file: String,
    pub platform: Platform,
    pub analyzed_at: DateTime<Utc>,
    pub result: AnalysisResult,
}

/// Results of dependency graph analysis for one job map.
///
/// Every field is a pure function of the input jobs: the graph edge list,
/// the parallel execution stages, the duration-weighted critical path, the
/// serial/parallel time bounds, bottleneck jobs, and the issue and
/// suggestion lists.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Job map with derived duration and parallelizability filled in.
    pub jobs: IndexMap<String, Job>,
    /// Directed edges (dependency, dependent) over known job names.
    pub edges: Vec<(String, String)>,
    /// Jobs grouped into generations that can run in parallel.
    pub execution_stages: Vec<Vec<String>>,
    pub critical_path: CriticalPath,
    /// Total time if all jobs ran sequentially, in seconds.
    pub total_serial_time: u64,
    /// Lower bound with unlimited parallelism, in seconds.
    pub optimal_parallel_time: u64,
    pub bottlenecks: Vec<String>,
    pub issues: Vec<DependencyIssue>,
    pub suggestions: Vec<OptimizationSuggestion>,
}

/// Maximum-duration root-to-sink chain under the dependency partial order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticalPath {
    pub jobs: Vec<String>,
    /// Sum of the estimated durations of the jobs on the path, in seconds.
    pub total_duration: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// A problem found in the dependency declarations.
///
/// Cycles and missing dependencies are structural: a cycle additionally halts
/// all weighted scheduling analysis. Redundant dependencies are advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DependencyIssue {
    CircularDependency {
        /// Ordered member list of the cycle, without the closing repeat.
        cycle: Vec<String>,
    },
    MissingDependency {
        job: String,
        missing: String,
    },
    RedundantDependency {
        job: String,
        dependency: String,
        /// Every direct dependency that already implies this one.
        implied_by: BTreeSet<String>,
    },
}

impl DependencyIssue {
    pub fn severity(&self) -> Severity {
        match self {
            Self::CircularDependency { .. } | Self::MissingDependency { .. } => Severity::High,
            Self::RedundantDependency { .. } => Severity::Low,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::CircularDependency { cycle } => {
                let mut closed = cycle.clone();
                if let Some(first) = cycle.first() {
                    closed.push(first.clone());
                }
                format!("Circular dependency detected: {}", closed.join(" -> "))
            }
            Self::MissingDependency { job, missing } => {
                format!("Job '{job}' depends on non-existent job '{missing}'")
            }
            Self::RedundantDependency { job, dependency, .. } => {
                format!("Job '{job}' has redundant dependency on '{dependency}'")
            }
        }
    }

    pub fn suggestion(&self) -> String {
        match self {
            Self::CircularDependency { .. } => {
                "Remove or restructure dependencies to eliminate the cycle".to_string()
            }
            Self::MissingDependency { job: _, missing } => {
                format!("Either create job '{missing}' or remove it from the needs list")
            }
            Self::RedundantDependency { dependency, implied_by, .. } => {
                let witnesses: Vec<&str> = implied_by.iter().map(String::as_str).collect();
                format!(
                    "Remove '{dependency}' from needs as it's implied by [{}]",
                    witnesses.join(", ")
                )
            }
        }
    }
}

/// A proposed rewrite or restructuring opportunity.
///
/// Advisory only: suggestions never block any other analysis pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizationSuggestion {
    ParallelizeIndependentJobs { job_a: String, job_b: String },
    SplitBottleneckJob { job: String, step_count: usize },
    LongDependencyChain { path: Vec<String> },
}

impl OptimizationSuggestion {
    pub fn severity(&self) -> Severity {
        match self {
            Self::ParallelizeIndependentJobs { .. } | Self::SplitBottleneckJob { .. } => {
                Severity::Medium
            }
            Self::LongDependencyChain { .. } => Severity::Low,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::ParallelizeIndependentJobs { job_a, job_b } => {
                format!("Jobs '{job_a}' and '{job_b}' could run in parallel")
            }
            Self::SplitBottleneckJob { job, step_count } => {
                format!("Job '{job}' is a bottleneck with {step_count} steps")
            }
            Self::LongDependencyChain { path } => {
                format!("Long dependency chain: {}", path.join(" -> "))
            }
        }
    }

    pub fn suggestion(&self) -> String {
        match self {
            Self::ParallelizeIndependentJobs { .. } => {
                "Review if these jobs truly need to run sequentially".to_string()
            }
            Self::SplitBottleneckJob { .. } => {
                "Consider splitting this job into smaller, parallel jobs".to_string()
            }
            Self::LongDependencyChain { .. } => {
                "Consider restructuring to reduce sequential dependencies".to_string()
            }
        }
    }
}

/// Why an optimization removed a set of declared dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    RemoveRedundantDependency,
    EnableParallelization,
}

/// One entry in the optimization change-log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyChange {
    pub job: String,
    pub removed: Vec<String>,
    pub reason: ChangeReason,
}

/// Rewritten dependency map plus the ordered change-log that produced it.
///
/// The map covers every job, including unchanged ones, so a caller can
/// re-serialize the whole pipeline configuration from it.
#[derive(Debug, Serialize, Deserialize)]
pub struct OptimizeResult {
    pub dependencies: IndexMap<String, Vec<String>>,
    pub changes: Vec<DependencyChange>,
}

/// Top-level report for an optimize run against a workflow file.
#[derive(Debug, Serialize, Deserialize)]
pub struct OptimizeReport {
    pub file: String,
    pub platform: Platform,
    pub analyzed_at: DateTime<Utc>,
    /// Whether the rewritten dependencies were written back to the file.
    pub applied: bool,
    pub result: OptimizeResult,
}
