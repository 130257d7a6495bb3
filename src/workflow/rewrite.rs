//! Writes optimized dependency lists back into workflow YAML.
//!
//! The file is round-tripped through `serde_yaml` and only the `needs`
//! keys of jobs named in the change-log are touched; unrelated content
//! survives the rewrite (formatting and comments do not, which is the
//! usual trade-off of a value-level rewrite).

use log::debug;
use serde_yaml::{Mapping, Value};

use super::types::Platform;
use crate::analysis::OptimizeResult;
use crate::error::{DagLensError, Result};

/// Applies the optimizer's dependency map to workflow content, returning
/// the rewritten YAML.
pub fn apply_dependencies(
    content: &str,
    platform: Platform,
    result: &OptimizeResult,
) -> Result<String> {
    let mut root: Value = serde_yaml::from_str(content)?;

    for change in &result.changes {
        let Some(deps) = result.dependencies.get(&change.job) else {
            continue;
        };
        let job = job_entry(&mut root, platform, &change.job)?;
        debug!("Rewriting needs of job '{}' to {deps:?}", change.job);

        match needs_value(platform, deps) {
            Some(needs) => {
                job.insert(Value::from("needs"), needs);
            }
            None => {
                job.remove("needs");
            }
        }
    }

    Ok(serde_yaml::to_string(&root)?)
}

fn job_entry<'a>(root: &'a mut Value, platform: Platform, name: &str) -> Result<&'a mut Mapping> {
    let jobs = match platform {
        Platform::GithubActions => root.get_mut("jobs").ok_or_else(|| {
            DagLensError::Parse("workflow has no 'jobs' section".to_string())
        })?,
        Platform::GitlabCi => root,
    };
    jobs.get_mut(name)
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| DagLensError::Parse(format!("job '{name}' not found in workflow")))
}

/// GitHub collapses a single dependency to a bare scalar; GitLab always
/// keeps the list form. An empty list means the key is removed entirely.
fn needs_value(platform: Platform, deps: &[String]) -> Option<Value> {
    match (platform, deps) {
        (_, []) => None,
        (Platform::GithubActions, [only]) => Some(Value::from(only.as_str())),
        _ => Some(Value::Sequence(
            deps.iter().map(|d| Value::from(d.as_str())).collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ChangeReason, DependencyChange};
    use indexmap::IndexMap;

    fn optimize_result(
        dependencies: &[(&str, &[&str])],
        changed: &[&str],
    ) -> OptimizeResult {
        let dependencies: IndexMap<String, Vec<String>> = dependencies
            .iter()
            .map(|(name, deps)| {
                (
                    name.to_string(),
                    deps.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect();
        let changes = changed
            .iter()
            .map(|name| DependencyChange {
                job: name.to_string(),
                removed: Vec::new(),
                reason: ChangeReason::RemoveRedundantDependency,
            })
            .collect();
        OptimizeResult {
            dependencies,
            changes,
        }
    }

    mod apply_dependencies_tests {
        use super::*;

        #[test]
        fn test_github_single_dependency_collapses_to_scalar() {
            // Arrange
            let content = r"
jobs:
  a: {}
  b:
    needs: a
  c:
    needs: [a, b]
";
            let result = optimize_result(
                &[("a", &[]), ("b", &["a"]), ("c", &["b"])],
                &["c"],
            );

            // Act
            let rewritten =
                apply_dependencies(content, Platform::GithubActions, &result).unwrap();

            // Assert
            let value: Value = serde_yaml::from_str(&rewritten).unwrap();
            assert_eq!(
                value["jobs"]["c"]["needs"],
                Value::from("b"),
            );
            // Untouched jobs keep their original declarations.
            assert_eq!(value["jobs"]["b"]["needs"], Value::from("a"));
        }

        #[test]
        fn test_github_multiple_dependencies_stay_a_list() {
            // Arrange
            let content = "jobs:\n  a: {}\n  b: {}\n  c:\n    needs: [a, b, a]\n";
            let result = optimize_result(
                &[("a", &[]), ("b", &[]), ("c", &["a", "b"])],
                &["c"],
            );

            // Act
            let rewritten =
                apply_dependencies(content, Platform::GithubActions, &result).unwrap();

            // Assert
            let value: Value = serde_yaml::from_str(&rewritten).unwrap();
            let needs = value["jobs"]["c"]["needs"].as_sequence().unwrap();
            assert_eq!(needs.len(), 2);
        }

        #[test]
        fn test_empty_dependencies_remove_the_key() {
            // Arrange
            let content = "jobs:\n  a: {}\n  b:\n    needs: a\n";
            let result = optimize_result(&[("a", &[]), ("b", &[])], &["b"]);

            // Act
            let rewritten =
                apply_dependencies(content, Platform::GithubActions, &result).unwrap();

            // Assert
            let value: Value = serde_yaml::from_str(&rewritten).unwrap();
            assert!(value["jobs"]["b"].as_mapping().unwrap().get("needs").is_none());
        }

        #[test]
        fn test_gitlab_keeps_list_form_for_single_dependency() {
            // Arrange
            let content = r"
stages: [build, deploy]
build:
  script: make
deploy:
  needs: [build, build]
  script: make deploy
";
            let result = optimize_result(
                &[("build", &[]), ("deploy", &["build"])],
                &["deploy"],
            );

            // Act
            let rewritten = apply_dependencies(content, Platform::GitlabCi, &result).unwrap();

            // Assert
            let value: Value = serde_yaml::from_str(&rewritten).unwrap();
            assert_eq!(
                value["deploy"]["needs"],
                Value::Sequence(vec![Value::from("build")]),
            );
            // Reserved keys survive untouched.
            assert!(value.get("stages").is_some());
        }

        #[test]
        fn test_unchanged_jobs_are_not_rewritten() {
            // Arrange
            let content = "jobs:\n  a: {}\n  b:\n    needs: a\n";
            let result = optimize_result(&[("a", &[]), ("b", &["a"])], &[]);

            // Act
            let rewritten =
                apply_dependencies(content, Platform::GithubActions, &result).unwrap();

            // Assert
            let value: Value = serde_yaml::from_str(&rewritten).unwrap();
            assert_eq!(value["jobs"]["b"]["needs"], Value::from("a"));
        }

        #[test]
        fn test_changed_job_missing_from_file_is_an_error() {
            // Arrange
            let content = "jobs:\n  a: {}\n";
            let result = optimize_result(&[("ghost", &[])], &["ghost"]);

            // Act
            let err =
                apply_dependencies(content, Platform::GithubActions, &result).unwrap_err();

            // Assert
            assert!(matches!(err, DagLensError::Parse(_)));
        }
    }
}
