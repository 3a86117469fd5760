//! CMX cluster lifecycle

use crate::ReplicatedError;
use crate::container::Replicated;
use serde::{Deserialize, Serialize};
use shipyard_secrets::{CommandRunner, SecureSecret};
use tracing::instrument;

/// Parameters for `cluster create`.
///
/// Empty `wait`/`ttl` and zero `nodes` leave the CLI's own default in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterCreateOptions {
    /// Cluster name; the CLI generates one when unset
    pub name: Option<String>,
    /// How long to wait for the cluster to become ready
    pub wait: String,
    /// Time to live
    pub ttl: String,
    /// Kubernetes distribution
    pub distribution: String,
    /// Distribution version
    pub version: String,
    /// Node count
    pub nodes: u32,
}

impl Default for ClusterCreateOptions {
    fn default() -> Self {
        Self {
            name: None,
            wait: "15m".to_string(),
            ttl: "20m".to_string(),
            distribution: "k3s".to_string(),
            version: "1.31.0".to_string(),
            nodes: 1,
        }
    }
}

impl ClusterCreateOptions {
    fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "cluster",
            "create",
            "--distribution",
            self.distribution.as_str(),
            "--version",
            self.version.as_str(),
            "--output",
            "json",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            args.extend(["--name".to_string(), name.to_string()]);
        }
        if !self.wait.is_empty() {
            args.extend(["--wait".to_string(), self.wait.clone()]);
        }
        if !self.ttl.is_empty() {
            args.extend(["--ttl".to_string(), self.ttl.clone()]);
        }
        if self.nodes != 0 {
            args.extend(["--nodes".to_string(), self.nodes.to_string()]);
        }
        args
    }
}

/// A created cluster
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Cluster identifier
    pub cluster_id: String,
    /// Status reported at creation
    pub status: String,
    /// Admin kubeconfig
    pub kubeconfig: SecureSecret,
}

#[derive(Debug, Deserialize)]
struct ClusterResponse {
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct PortExposeResponse {
    hostname: String,
}

impl<R: CommandRunner> Replicated<R> {
    /// Create a cluster and fetch its kubeconfig.
    #[instrument(skip(self, options), fields(distribution = %options.distribution, version = %options.version))]
    pub async fn cluster_create(
        &self,
        options: &ClusterCreateOptions,
    ) -> Result<Cluster, ReplicatedError> {
        let args = options.args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let created: ClusterResponse = self.exec_json("cluster create", &args).await?;

        tracing::info!(cluster_id = %created.id, status = %created.status, "Cluster created");

        let kubeconfig = self
            .exec(&["cluster", "kubeconfig", "--stdout", &created.id])
            .await?;

        Ok(Cluster {
            cluster_id: created.id,
            status: created.status,
            kubeconfig: SecureSecret::new(kubeconfig),
        })
    }

    /// Remove a cluster, returning the CLI's output.
    #[instrument(skip(self))]
    pub async fn cluster_remove(&self, cluster_id: &str) -> Result<String, ReplicatedError> {
        self.exec(&["cluster", "rm", cluster_id]).await
    }

    /// Expose a node port over HTTPS, returning the public hostname.
    #[instrument(skip(self))]
    pub async fn cluster_expose_port(
        &self,
        cluster_id: &str,
        node_port: u16,
    ) -> Result<String, ReplicatedError> {
        let port = node_port.to_string();
        let exposed: PortExposeResponse = self
            .exec_json(
                "cluster port expose",
                &[
                    "cluster",
                    "port",
                    "expose",
                    cluster_id,
                    "--port",
                    &port,
                    "--protocol",
                    "https",
                    "--output",
                    "json",
                ],
            )
            .await?;
        Ok(exposed.hostname)
    }
}
