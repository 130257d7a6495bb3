use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::EngineSettings;

/// Configuration file structure for DagLens.
///
/// Allows users to pin analysis thresholds and output preferences and
/// reuse them across runs. Configuration files are loaded from the
/// current directory or a specified path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,

    /// Analysis thresholds
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// Assumed duration for jobs without a usable estimate, in seconds
    #[serde(default = "default_job_duration")]
    pub default_job_duration: u64,

    /// Minimum number of blocked dependents before a job is a bottleneck
    #[serde(default = "default_bottleneck_min_blocked")]
    pub bottleneck_min_blocked: usize,

    /// Dependency chain length that triggers a restructuring suggestion
    #[serde(default = "default_long_chain_threshold")]
    pub long_chain_threshold: usize,

    /// Step count above which a bottleneck job is worth splitting
    #[serde(default = "default_split_step_threshold")]
    pub split_step_threshold: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Summary,
            pretty: false,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_job_duration: default_job_duration(),
            bottleneck_min_blocked: default_bottleneck_min_blocked(),
            long_chain_threshold: default_long_chain_threshold(),
            split_step_threshold: default_split_step_threshold(),
        }
    }
}

fn default_job_duration() -> u64 {
    60
}

fn default_bottleneck_min_blocked() -> usize {
    3
}

fn default_long_chain_threshold() -> usize {
    4
}

fn default_split_step_threshold() -> usize {
    5
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./daglens.toml
    /// 3. ./daglens.json
    /// 4. ./daglens.yaml
    /// 5. ./daglens.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["daglens.toml", "daglens.json", "daglens.yaml", "daglens.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }

    /// Engine thresholds derived from the `[analysis]` section.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            default_job_duration: self.analysis.default_job_duration,
            bottleneck_min_blocked: self.analysis.bottleneck_min_blocked,
            long_chain_threshold: self.analysis.long_chain_threshold,
            split_step_threshold: self.analysis.split_step_threshold,
        }
    }
}
