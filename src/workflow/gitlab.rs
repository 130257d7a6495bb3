//! GitLab CI pipeline extraction.
//!
//! GitLab has no `jobs:` section; every top-level mapping key that is not
//! a reserved configuration key (and does not start with `.`, the hidden
//! job convention) is a job. `script` lines become command steps so the
//! duration heuristics see the same shape as GitHub steps.

use indexmap::IndexMap;
use serde_yaml::Value;

use super::types::{Job, NeedsDecl, Step};
use crate::error::{DagLensError, Result};

/// Top-level keys that configure the pipeline rather than define a job.
const RESERVED_KEYS: [&str; 9] = [
    "stages",
    "variables",
    "default",
    "include",
    "workflow",
    "image",
    "services",
    "before_script",
    "after_script",
];

pub(super) fn extract_jobs(value: &Value) -> Result<IndexMap<String, Job>> {
    let root = value
        .as_mapping()
        .ok_or_else(|| DagLensError::Parse("pipeline root must be a YAML mapping".to_string()))?;

    let mut jobs = IndexMap::new();
    for (key, definition) in root {
        let name = match key.as_str() {
            Some(name) => name,
            None => continue,
        };
        if RESERVED_KEYS.contains(&name) || name.starts_with('.') {
            continue;
        }
        // Scalar top-level entries are configuration, not jobs.
        let def = match definition.as_mapping() {
            Some(def) => def,
            None => continue,
        };

        let needs = def
            .get("needs")
            .map(|v| NeedsDecl::from_value(v, name))
            .transpose()?
            .unwrap_or_default();
        let steps = match def.get("script") {
            Some(script) => script_steps(script, name)?,
            None => Vec::new(),
        };

        jobs.insert(
            name.to_string(),
            Job::new(name).with_needs(needs).with_steps(steps),
        );
    }

    Ok(jobs)
}

fn script_steps(value: &Value, job: &str) -> Result<Vec<Step>> {
    match value {
        Value::String(line) => Ok(vec![Step::command(line.as_str())]),
        Value::Sequence(lines) => lines
            .iter()
            .map(|line| {
                line.as_str().map(Step::command).ok_or_else(|| {
                    DagLensError::Parse(format!("script lines of job '{job}' must be strings"))
                })
            })
            .collect(),
        _ => Err(DagLensError::Parse(format!(
            "script of job '{job}' must be a string or a sequence"
        ))),
    }
}
