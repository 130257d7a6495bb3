use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::analysis::{AnalysisReport, OptimizeReport};
use crate::config::{Config, OutputFormat};
use crate::engine;
use crate::output;
use crate::workflow::{self, Platform};

#[derive(Parser)]
#[command(name = "daglens")]
#[command(author, version, about = "CI/CD Dependency Graph Analyzer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Write the JSON report to this path instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze job dependencies in a workflow file
    Analyze {
        /// Workflow file (GitHub Actions or GitLab CI)
        file: PathBuf,

        /// Override platform detection
        #[arg(short = 'P', long)]
        platform: Option<Platform>,
    },

    /// Remove redundant dependencies from a workflow file
    Optimize {
        /// Workflow file (GitHub Actions or GitLab CI)
        file: PathBuf,

        /// Override platform detection
        #[arg(short = 'P', long)]
        platform: Option<Platform>,

        /// Write the optimized dependencies back to the file
        #[arg(short, long, default_value_t = false)]
        apply: bool,
    },
}

impl Cli {
    pub fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Analyze { file, platform } => {
                self.execute_analyze(file, *platform, &config)
            }
            Commands::Optimize {
                file,
                platform,
                apply,
            } => self.execute_optimize(file, *platform, *apply, &config),
        }
    }

    fn execute_analyze(
        &self,
        file: &Path,
        platform: Option<Platform>,
        config: &Config,
    ) -> Result<()> {
        info!("Analyzing workflow file: {}", file.display());

        let workflow = workflow::load_workflow(file, platform)
            .with_context(|| format!("Failed to load workflow: {}", file.display()))?;
        let result = engine::analyze(&workflow.jobs, &config.engine_settings());

        let report = AnalysisReport {
            file: file.display().to_string(),
            platform: workflow.platform,
            analyzed_at: Utc::now(),
            result,
        };

        self.emit(&report, config, || output::print_analysis(&report))
    }

    fn execute_optimize(
        &self,
        file: &Path,
        platform: Option<Platform>,
        apply: bool,
        config: &Config,
    ) -> Result<()> {
        info!("Optimizing workflow file: {}", file.display());

        let workflow = workflow::load_workflow(file, platform)
            .with_context(|| format!("Failed to load workflow: {}", file.display()))?;
        let result = engine::optimize(&workflow.jobs);

        if apply && !result.changes.is_empty() {
            let content = std::fs::read_to_string(file)?;
            let rewritten = workflow::apply_dependencies(&content, workflow.platform, &result)?;

            // A backup next to the original keeps the rewrite reversible.
            let mut backup_name = file.as_os_str().to_owned();
            backup_name.push(".bak");
            let backup = PathBuf::from(backup_name);
            std::fs::copy(file, &backup)
                .with_context(|| format!("Failed to back up workflow to {}", backup.display()))?;
            std::fs::write(file, rewritten)
                .with_context(|| format!("Failed to write workflow: {}", file.display()))?;
            info!("Rewrote {} (backup at {})", file.display(), backup.display());
        }

        let report = OptimizeReport {
            file: file.display().to_string(),
            platform: workflow.platform,
            analyzed_at: Utc::now(),
            applied: apply,
            result,
        };

        self.emit(&report, config, || output::print_optimize(&report))
    }

    /// Routes a report to the terminal or a file, honoring the configured
    /// format. A file destination always gets JSON.
    fn emit<T: Serialize>(&self, report: &T, config: &Config, print: impl Fn()) -> Result<()> {
        let format = self.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;

        if let Some(path) = &self.output {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            output::export_report(report, OutputFormat::Json, pretty, &mut file)?;
            info!("Report written to: {}", path.display());
            return Ok(());
        }

        match format {
            OutputFormat::Summary => print(),
            OutputFormat::Json => {
                output::export_report(report, OutputFormat::Json, pretty, &mut std::io::stdout())?;
            }
        }
        Ok(())
    }
}
