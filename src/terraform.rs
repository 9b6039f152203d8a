use std::{
    path::{Path, PathBuf},
    process::Stdio,
};
use async_trait::async_trait;
use tokio::process::Command;

use crate::{
    error::RunnerError,
    parser,
    project::{ChangeSummary, CommandKind, Project},
};

/// Runs the external tool for one project directory.
///
/// Implementations return whatever text the tool printed, whatever its exit
/// status; only failing to start the tool at all is an error.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn run(&self, kind: CommandKind, dir: &Path) -> Result<String, RunnerError>;
}

pub struct Terraform {
    binary: String,
}

impl Terraform {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

#[async_trait]
impl ToolInvoker for Terraform {
    async fn run(&self, kind: CommandKind, dir: &Path) -> Result<String, RunnerError> {
        let output = Command::new(&self.binary)
            .args(kind.args())
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RunnerError::Invocation {
                binary: self.binary.clone(),
                command: kind,
                dir: dir.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            command = %kind,
            dir = %dir.display(),
            status = ?output.status.code(),
            "terraform exited"
        );

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }
}

/// Outcome of one runner unit, correlated back to its project by path.
#[derive(Debug)]
pub struct Completion {
    pub path: PathBuf,
    pub kind: CommandKind,
    pub result: Result<Project, RunnerError>,
}

/// Run `kind` against the project and return the project with its result
/// fields updated.
pub async fn execute(invoker: &dyn ToolInvoker, mut project: Project, kind: CommandKind) -> Completion {
    let path = project.path.clone();

    let result = match invoker.run(kind, &project.path).await {
        Ok(output) => {
            record_output(&mut project, kind, output);
            Ok(project)
        }
        Err(err) => {
            tracing::warn!(%err, "runner could not start terraform");
            Err(err)
        }
    };

    Completion { path, kind, result }
}

fn record_output(project: &mut Project, kind: CommandKind, output: String) {
    match kind {
        CommandKind::Validate => project.validity = parser::parse_validity(&output),
        CommandKind::Plan => {
            project.changes = parser::parse_changes(&output).unwrap_or_else(|err| {
                tracing::debug!(path = %project.path.display(), %err, "could not parse plan output");
                ChangeSummary::PlanError
            });
        }
        CommandKind::Apply => project.changes = parser::parse_apply(&output),
    }
    project.last_command = Some(kind);
    project.output = output;
}


#[cfg(test)]
mod tests {
    use super::{testing::FakeInvoker, *};
    use crate::project::Validity;

    fn project(path: &str) -> Project {
        Project::new(path, path.rsplit('/').next().unwrap_or(path), None)
    }

    #[tokio::test]
    async fn test_validate_records_validity_and_output() {
        let invoker = FakeInvoker::new("Success! The configuration is valid.");
        let completion = execute(&invoker, project("/infra/dns"), CommandKind::Validate).await;

        assert_eq!(completion.path, PathBuf::from("/infra/dns"));
        let updated = completion.result.unwrap();
        assert_eq!(updated.validity, Validity::Valid);
        assert_eq!(updated.last_command, Some(CommandKind::Validate));
        assert_eq!(updated.output, "Success! The configuration is valid.");
        assert_eq!(updated.changes, ChangeSummary::Unknown);
    }

    #[tokio::test]
    async fn test_plan_records_changes() {
        let invoker = FakeInvoker::new("Plan: 2 to add, 1 to change, 0 to destroy.");
        let updated = execute(&invoker, project("/infra/dns"), CommandKind::Plan)
            .await
            .result
            .unwrap();
        assert_eq!(updated.changes, ChangeSummary::counts(2, 1, 0));
        assert_eq!(invoker.calls(), vec![(CommandKind::Plan, PathBuf::from("/infra/dns"))]);
    }

    #[tokio::test]
    async fn test_unparsable_plan_is_classified_as_error() {
        let invoker = FakeInvoker::new("terraform crashed halfway");
        let updated = execute(&invoker, project("/infra/dns"), CommandKind::Plan)
            .await
            .result
            .unwrap();
        assert_eq!(updated.changes, ChangeSummary::PlanError);
    }

    #[tokio::test]
    async fn test_apply_clears_pending_changes() {
        let invoker = FakeInvoker::new("Apply complete! Resources: 2 added, 0 changed, 0 destroyed.");
        let mut planned = project("/infra/dns");
        planned.changes = ChangeSummary::counts(2, 0, 0);

        let updated = execute(&invoker, planned, CommandKind::Apply).await.result.unwrap();
        assert_eq!(updated.changes, ChangeSummary::none());
        assert_eq!(updated.last_command, Some(CommandKind::Apply));
    }

    #[tokio::test]
    async fn test_start_failure_is_an_error_completion() {
        let invoker = FakeInvoker::new("").unable_to_start("/infra/dns");
        let completion = execute(&invoker, project("/infra/dns"), CommandKind::Plan).await;
        assert_eq!(completion.kind, CommandKind::Plan);
        assert!(matches!(completion.result, Err(RunnerError::Invocation { .. })));
    }

    #[tokio::test]
    async fn test_missing_binary_fails_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let terraform = Terraform::new("tfscan-no-such-binary");
        let result = terraform.run(CommandKind::Validate, dir.path()).await;
        assert!(matches!(result, Err(RunnerError::Invocation { .. })));
    }
}
