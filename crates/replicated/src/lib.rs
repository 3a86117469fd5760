//! Replicated vendor CLI integration for shipyard
//!
//! Runs the `replicated` CLI to manage CMX clusters:
//! - [`container`]: the CLI invocation environment ([`ReplicatedConfig`], [`Replicated`])
//! - [`cmx`]: cluster create, remove and port expose
//! - [`runner`]: where the CLI runs (a docker container, a local binary, or
//!   a Dagger container with the `dagger-backend` feature)

pub mod cmx;
pub mod container;
pub mod runner;

pub use cmx::{Cluster, ClusterCreateOptions};
pub use container::{Replicated, ReplicatedConfig};
pub use runner::{DockerRunner, REPLICATED_IMAGE};
#[cfg(feature = "dagger-backend")]
pub use runner::DaggerRunner;

use shipyard_secrets::ExecError;
use thiserror::Error;

/// Error from a Replicated CLI operation
#[derive(Debug, Error)]
pub enum ReplicatedError {
    /// The CLI could not be run or exited unsuccessfully
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// The CLI printed something other than the expected JSON
    #[error("unexpected output from '{command}': {source}")]
    Decode {
        /// Subcommand that was run (e.g. `cluster create`)
        command: String,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },
}
