use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DagLensError, Result};

/// CI platform a workflow file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    GithubActions,
    GitlabCi,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GithubActions => write!(f, "github_actions"),
            Self::GitlabCi => write!(f, "gitlab_ci"),
        }
    }
}

/// A single step inside a job.
///
/// Opaque to the analysis except for keyword classification of the action
/// reference (`uses`) and the command text (`run`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Action-style reference (e.g. "actions/setup-node@v4").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,
    /// Shell command text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
}

impl Step {
    pub fn command(run: impl Into<String>) -> Self {
        Self {
            name: None,
            uses: None,
            run: Some(run.into()),
        }
    }

    pub fn action(uses: impl Into<String>) -> Self {
        Self {
            name: None,
            uses: Some(uses.into()),
            run: None,
        }
    }

    /// Full serialized text of the step, for substring classification.
    pub fn text(&self) -> String {
        [&self.name, &self.uses, &self.run]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One element of a list-form `needs` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NeedsEntry {
    Name(String),
    /// Structured entry exposing the dependency name under a `job` field
    /// (GitLab `needs: [{job: build, artifacts: true}]`).
    Structured { job: String },
}

impl NeedsEntry {
    pub fn job_name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Structured { job: name } => name,
        }
    }
}

/// Raw dependency declaration, in any of the three dialect forms.
///
/// Normalization into a canonical name set happens in exactly one place,
/// `engine::graph::normalize_needs`; nothing else branches on the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NeedsDecl {
    Single(String),
    List(Vec<NeedsEntry>),
    /// Mapping form whose keys are the dependency names.
    Map(IndexMap<String, serde_yaml::Value>),
}

impl Default for NeedsDecl {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl NeedsDecl {
    /// Converts a raw YAML `needs` value, rejecting any shape other than the
    /// three supported forms. A malformed declaration fails the whole run;
    /// the engine never guesses.
    pub fn from_value(value: &serde_yaml::Value, job: &str) -> Result<Self> {
        match value {
            serde_yaml::Value::Null => Ok(Self::default()),
            serde_yaml::Value::String(name) => Ok(Self::Single(name.clone())),
            serde_yaml::Value::Sequence(items) => {
                let entries = items
                    .iter()
                    .map(|item| entry_from_value(item, job))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::List(entries))
            }
            serde_yaml::Value::Mapping(map) => {
                let mut keys = IndexMap::new();
                for (key, val) in map {
                    let name = key.as_str().ok_or_else(|| {
                        DagLensError::Contract(format!(
                            "job '{job}' has a non-string dependency name in its needs mapping"
                        ))
                    })?;
                    keys.insert(name.to_string(), val.clone());
                }
                Ok(Self::Map(keys))
            }
            _ => Err(DagLensError::Contract(format!(
                "job '{job}' has an unsupported needs declaration (expected string, list, or mapping)"
            ))),
        }
    }
}

fn entry_from_value(value: &serde_yaml::Value, job: &str) -> Result<NeedsEntry> {
    match value {
        serde_yaml::Value::String(name) => Ok(NeedsEntry::Name(name.clone())),
        serde_yaml::Value::Mapping(map) => {
            let name = map
                .get("job")
                .and_then(serde_yaml::Value::as_str)
                .ok_or_else(|| {
                    DagLensError::Contract(format!(
                        "job '{job}' has a structured needs entry without a string 'job' field"
                    ))
                })?;
            Ok(NeedsEntry::Structured {
                job: name.to_string(),
            })
        }
        _ => Err(DagLensError::Contract(format!(
            "job '{job}' has a needs entry that is neither a name nor a structured entry"
        ))),
    }
}

/// A named unit of pipeline work with its declared dependencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    /// Raw dependency declaration, dialect-specific until normalized.
    #[serde(default)]
    pub needs: NeedsDecl,
    /// Runner identifier; pass-through metadata the engine ignores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs_on: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Heuristic duration in seconds, derived from the step list.
    #[serde(default)]
    pub estimated_duration: Option<u64>,
    /// False when any step looks like a deploy or release.
    #[serde(default = "default_can_parallelize")]
    pub can_parallelize: bool,
}

fn default_can_parallelize() -> bool {
    true
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            needs: NeedsDecl::default(),
            runs_on: None,
            steps: Vec::new(),
            estimated_duration: None,
            can_parallelize: true,
        }
    }

    pub fn with_needs(mut self, needs: NeedsDecl) -> Self {
        self.needs = needs;
        self
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }
}
