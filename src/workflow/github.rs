//! GitHub Actions workflow extraction.
//!
//! Only the dependency-relevant subset of the schema is read: `jobs`,
//! each job's `needs`, `runs-on`, and `steps`. Everything else in the
//! file is ignored here and preserved verbatim by the rewriter.

use indexmap::IndexMap;
use serde_yaml::Value;

use super::types::{Job, NeedsDecl, Step};
use crate::error::{DagLensError, Result};

pub(super) fn extract_jobs(value: &Value) -> Result<IndexMap<String, Job>> {
    let root = value
        .as_mapping()
        .ok_or_else(|| DagLensError::Parse("workflow root must be a YAML mapping".to_string()))?;
    let jobs_value = root
        .get("jobs")
        .ok_or_else(|| DagLensError::Parse("workflow has no 'jobs' section".to_string()))?;
    let jobs_map = jobs_value.as_mapping().ok_or_else(|| {
        DagLensError::Parse("'jobs' must be a mapping of job names to definitions".to_string())
    })?;

    let mut jobs = IndexMap::new();
    for (key, definition) in jobs_map {
        let name = key
            .as_str()
            .ok_or_else(|| DagLensError::Parse("job names must be strings".to_string()))?;
        let def = definition.as_mapping().ok_or_else(|| {
            DagLensError::Parse(format!("job '{name}' must be a mapping"))
        })?;

        let needs = def
            .get("needs")
            .map(|v| NeedsDecl::from_value(v, name))
            .transpose()?
            .unwrap_or_default();
        let runs_on = def
            .get("runs-on")
            .and_then(Value::as_str)
            .map(str::to_string);
        let steps = match def.get("steps") {
            Some(steps) => parse_steps(steps, name)?,
            None => Vec::new(),
        };

        let mut job = Job::new(name).with_needs(needs).with_steps(steps);
        job.runs_on = runs_on;
        jobs.insert(name.to_string(), job);
    }

    Ok(jobs)
}

fn parse_steps(value: &Value, job: &str) -> Result<Vec<Step>> {
    let items = value.as_sequence().ok_or_else(|| {
        DagLensError::Parse(format!("steps of job '{job}' must be a sequence"))
    })?;

    let mut steps = Vec::with_capacity(items.len());
    for item in items {
        let map = item.as_mapping().ok_or_else(|| {
            DagLensError::Parse(format!("each step of job '{job}' must be a mapping"))
        })?;
        steps.push(Step {
            name: map.get("name").and_then(Value::as_str).map(str::to_string),
            uses: map.get("uses").and_then(Value::as_str).map(str::to_string),
            run: map.get("run").and_then(Value::as_str).map(str::to_string),
        });
    }
    Ok(steps)
}
