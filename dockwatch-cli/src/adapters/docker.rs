use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use dockwatch_core::config::RuntimeConfig;
use dockwatch_core::model::LifecycleAction;
use dockwatch_core::runtime::{ContainerRuntime, RuntimeError};

const PS_FORMAT: &str = "{{.ID}}|{{.Image}}|{{.Status}}|{{.Ports}}";
const STATS_FORMAT: &str = "{{.Name}}|{{.CPUPerc}}|{{.MemUsage}}";

/// Runtime backed by the docker command line (or anything that speaks its
/// syntax, e.g. podman)
#[derive(Clone, Debug)]
pub struct DockerCli {
    binary: String,
    show_all: bool,
    force_delete: bool,
}

impl DockerCli {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            show_all: config.show_all,
            force_delete: config.force_delete,
        }
    }

    fn list_args(&self) -> Vec<&'static str> {
        let mut args = vec!["ps"];
        if self.show_all {
            args.push("-a");
        }
        args.extend(["--format", PS_FORMAT]);
        args
    }

    fn stats_args(&self) -> Vec<&'static str> {
        vec!["stats", "--no-stream", "--format", STATS_FORMAT]
    }

    fn lifecycle_args<'a>(&self, action: LifecycleAction, id: &'a str) -> Vec<&'a str> {
        match action {
            LifecycleAction::Start => vec!["start", id],
            LifecycleAction::Stop => vec!["stop", id],
            LifecycleAction::Restart => vec!["restart", id],
            LifecycleAction::Delete if self.force_delete => vec!["rm", "-f", id],
            LifecycleAction::Delete => vec!["rm", id],
        }
    }

    /// Run the binary with `args` and return its stdout
    async fn run(&self, args: &[&str]) -> Result<String, RuntimeError> {
        let command = format!("{} {}", self.binary, args.join(" "));
        debug!(%command, "running");

        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RuntimeError::Spawn {
                program: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RuntimeError::Failed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| RuntimeError::InvalidOutput { command })
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    fn name(&self) -> &'static str {
        "docker-cli"
    }

    async fn list_entities(&self) -> Result<String, RuntimeError> {
        self.run(&self.list_args()).await
    }

    async fn snapshot_usage(&self) -> Result<String, RuntimeError> {
        self.run(&self.stats_args()).await
    }

    async fn run_lifecycle(&self, action: LifecycleAction, id: &str) -> Result<(), RuntimeError> {
        self.run(&self.lifecycle_args(action, id)).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(binary: &str) -> DockerCli {
        DockerCli::new(&RuntimeConfig {
            binary: binary.into(),
            ..RuntimeConfig::default()
        })
    }

    #[test]
    fn test_list_args() {
        let mut docker = cli("docker");
        assert_eq!(docker.list_args(), vec!["ps", "-a", "--format", PS_FORMAT]);
        docker.show_all = false;
        assert_eq!(docker.list_args(), vec!["ps", "--format", PS_FORMAT]);
    }

    #[test]
    fn test_lifecycle_args() {
        let mut docker = cli("docker");
        assert_eq!(
            docker.lifecycle_args(LifecycleAction::Restart, "abc"),
            vec!["restart", "abc"]
        );
        assert_eq!(docker.lifecycle_args(LifecycleAction::Delete, "abc"), vec!["rm", "abc"]);
        docker.force_delete = true;
        assert_eq!(
            docker.lifecycle_args(LifecycleAction::Delete, "abc"),
            vec!["rm", "-f", "abc"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_returns_stdout() {
        let out = cli("echo").snapshot_usage().await.unwrap();
        assert_eq!(out.trim(), format!("stats --no-stream --format {}", STATS_FORMAT));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let err = cli("false")
            .run_lifecycle(LifecycleAction::Stop, "abc")
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Failed { code: Some(1), .. }));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let err = cli("/nonexistent/dockwatch-docker")
            .list_entities()
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Spawn { .. }));
    }
}
