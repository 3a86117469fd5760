//! `shipyard cluster` commands

use super::{emit, emit_line};
use crate::cli::{ClusterCommands, ReplicatedArgs, RunnerKind};
use crate::command_span;
use crate::errors::{CliError, CliResult};
use shipyard_replicated::container::{CONTAINER_BINARY, LOCAL_BINARY};
use shipyard_replicated::{ClusterCreateOptions, DockerRunner, Replicated, ReplicatedConfig};
use shipyard_secrets::{CommandRunner, Credential, ProcessRunner, SecureSecret};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::Instrument;

type DynRunner = Arc<dyn CommandRunner>;

impl ReplicatedArgs {
    fn config(&self) -> ReplicatedConfig {
        ReplicatedConfig {
            api_origin: self.api_origin.clone(),
            id_origin: self.id_origin.clone(),
            registry_origin: self.registry_origin.clone(),
        }
    }

    fn runner(&self) -> (DynRunner, &'static str) {
        match self.runner {
            RunnerKind::Docker => (
                Arc::new(DockerRunner::new().with_image(&self.image)) as DynRunner,
                CONTAINER_BINARY,
            ),
            RunnerKind::Local => (Arc::new(ProcessRunner::new()) as DynRunner, LOCAL_BINARY),
            #[cfg(feature = "dagger-backend")]
            RunnerKind::Dagger => (
                Arc::new(shipyard_replicated::DaggerRunner::new().with_image(&self.image))
                    as DynRunner,
                CONTAINER_BINARY,
            ),
        }
    }

    fn connect(&self) -> CliResult<Replicated<DynRunner>> {
        let token = Credential::env(&self.token_env)
            .load()
            .map_err(CliError::credential)?;
        let (runner, binary) = self.runner();
        Ok(Replicated::new(runner, token, &self.config()).with_binary(binary))
    }
}

pub async fn execute(command: ClusterCommands) -> CliResult<()> {
    match command {
        ClusterCommands::Create {
            replicated,
            name,
            wait,
            ttl,
            distribution,
            distribution_version,
            nodes,
            kubeconfig_out,
        } => {
            async {
                let cli = replicated.connect()?;
                let options = ClusterCreateOptions {
                    name,
                    wait,
                    ttl,
                    distribution,
                    version: distribution_version,
                    nodes,
                };
                let cluster = cli
                    .cluster_create(&options)
                    .await
                    .map_err(|e| CliError::cluster("cluster create", e))?;

                if let Some(path) = kubeconfig_out.as_deref() {
                    write_kubeconfig(path, &cluster.kubeconfig).await?;
                    tracing::info!(path = %path.display(), "Wrote kubeconfig");
                }

                let summary = serde_json::json!({
                    "clusterId": cluster.cluster_id,
                    "status": cluster.status,
                });
                emit_line(&summary.to_string())
            }
            .instrument(command_span!("cluster create"))
            .await
        }
        ClusterCommands::Remove {
            replicated,
            cluster_id,
        } => {
            async {
                let output = replicated
                    .connect()?
                    .cluster_remove(&cluster_id)
                    .await
                    .map_err(|e| CliError::cluster("cluster remove", e))?;
                emit(&output)
            }
            .instrument(command_span!("cluster remove"))
            .await
        }
        ClusterCommands::ExposePort {
            replicated,
            cluster_id,
            node_port,
        } => {
            async {
                let hostname = replicated
                    .connect()?
                    .cluster_expose_port(&cluster_id, node_port)
                    .await
                    .map_err(|e| CliError::cluster("cluster expose-port", e))?;
                emit_line(&hostname)
            }
            .instrument(command_span!("cluster expose-port"))
            .await
        }
    }
}

/// Write the kubeconfig readable by the owner only.
async fn write_kubeconfig(path: &Path, kubeconfig: &SecureSecret) -> CliResult<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .await
        .map_err(|e| CliError::file_error("create", path, e))?;
    file.write_all(kubeconfig.expose().as_bytes())
        .await
        .map_err(|e| CliError::file_error("write", path, e))?;
    file.flush()
        .await
        .map_err(|e| CliError::file_error("write", path, e))
}
