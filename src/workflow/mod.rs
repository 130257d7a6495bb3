mod github;
mod gitlab;
mod rewrite;
mod types;

pub use rewrite::apply_dependencies;
pub use types::{Job, NeedsDecl, NeedsEntry, Platform, Step};

use std::path::Path;

use indexmap::IndexMap;
use log::info;

use crate::error::{DagLensError, Result};

/// A parsed workflow file: the detected platform and its job map.
#[derive(Debug)]
pub struct Workflow {
    pub platform: Platform,
    pub jobs: IndexMap<String, Job>,
}

/// Detects the CI platform from the file path, falling back to content
/// sniffing when the path is inconclusive.
pub fn detect_platform(path: &Path, content: &str) -> Result<Platform> {
    let path_str = path.to_string_lossy();
    if path_str.contains(".github/workflows") || path_str.contains(".github\\workflows") {
        return Ok(Platform::GithubActions);
    }
    if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
        if file_name == ".gitlab-ci.yml" || file_name == ".gitlab-ci.yaml" {
            return Ok(Platform::GitlabCi);
        }
    }

    if content.contains("on:") && content.contains("jobs:") {
        return Ok(Platform::GithubActions);
    }
    if content.contains("stages:") {
        return Ok(Platform::GitlabCi);
    }

    Err(DagLensError::UnsupportedPlatform(format!(
        "cannot determine CI platform for {}",
        path.display()
    )))
}

/// Parses workflow content into the normalized job map the engine consumes.
pub fn parse_workflow(content: &str, platform: Platform) -> Result<Workflow> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;

    let jobs = match platform {
        Platform::GithubActions => github::extract_jobs(&value)?,
        Platform::GitlabCi => gitlab::extract_jobs(&value)?,
    };
    info!("Extracted {} jobs from workflow", jobs.len());

    Ok(Workflow { platform, jobs })
}

/// Reads a workflow file from disk, detecting the platform unless the
/// caller already knows it.
pub fn load_workflow(path: &Path, platform: Option<Platform>) -> Result<Workflow> {
    let content = std::fs::read_to_string(path)?;
    let platform = match platform {
        Some(platform) => platform,
        None => detect_platform(path, &content)?,
    };
    parse_workflow(&content, platform)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod detect_platform_tests {
        use super::*;

        #[test]
        fn test_github_workflows_path() {
            let path = Path::new(".github/workflows/ci.yml");

            let platform = detect_platform(path, "").unwrap();

            assert_eq!(platform, Platform::GithubActions);
        }

        #[test]
        fn test_gitlab_ci_file_name() {
            let path = Path::new("repo/.gitlab-ci.yml");

            let platform = detect_platform(path, "").unwrap();

            assert_eq!(platform, Platform::GitlabCi);
        }

        #[test]
        fn test_content_sniffing_github() {
            let content = "on: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n";

            let platform = detect_platform(Path::new("pipeline.yml"), content).unwrap();

            assert_eq!(platform, Platform::GithubActions);
        }

        #[test]
        fn test_content_sniffing_gitlab() {
            let content = "stages:\n  - build\nbuild:\n  script: make\n";

            let platform = detect_platform(Path::new("pipeline.yml"), content).unwrap();

            assert_eq!(platform, Platform::GitlabCi);
        }

        #[test]
        fn test_unknown_platform_is_an_error() {
            let err = detect_platform(Path::new("random.yml"), "foo: bar\n").unwrap_err();

            assert!(matches!(err, DagLensError::UnsupportedPlatform(_)));
        }
    }

    mod parse_workflow_tests {
        use super::*;

        #[test]
        fn test_invalid_yaml_is_an_error() {
            let content = "jobs:\n  build:\n   steps:\n\t- run: make\n";

            let err = parse_workflow(content, Platform::GithubActions).unwrap_err();

            assert!(matches!(err, DagLensError::Yaml(_)));
        }

        #[test]
        fn test_github_round_trip() {
            let content = r"
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - run: cargo build
  test:
    needs: build
    runs-on: ubuntu-latest
    steps:
      - run: cargo test
";

            let workflow = parse_workflow(content, Platform::GithubActions).unwrap();

            assert_eq!(workflow.jobs.len(), 2);
            assert_eq!(
                workflow.jobs["test"].needs,
                NeedsDecl::Single("build".to_string())
            );
        }
    }
}
