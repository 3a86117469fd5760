use crate::tracing::{LogLevel, TracingFormat};
use clap::{Args, Parser, Subcommand, ValueEnum};
use shipyard_1password::secrets::OP_TOKEN_ENV;
use shipyard_replicated::REPLICATED_IMAGE;
use shipyard_replicated::container::{
    API_ORIGIN_ENV, ID_ORIGIN_ENV, IMAGE_ENV, REGISTRY_ORIGIN_ENV, TOKEN_ENV,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shipyard")]
#[command(about = "Pipeline steps for 1Password secrets and Replicated CMX clusters")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        value_name = "SECONDS",
        help = "Abort the command if it has not finished after this many seconds"
    )]
    pub timeout_secs: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Read and write 1Password secrets")]
    Secret {
        #[command(subcommand)]
        subcommand: SecretCommands,
    },
    #[command(about = "Manage Replicated CMX clusters")]
    Cluster {
        #[command(subcommand)]
        subcommand: ClusterCommands,
    },
}

impl Cli {
    /// Log format to use; `--json` wins over `--log-format`
    pub const fn tracing_format(&self) -> TracingFormat {
        if self.json {
            TracingFormat::Json
        } else {
            self.log_format
        }
    }
}

impl Commands {
    /// Display name, e.g. `secret find`
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Secret { subcommand } => match subcommand {
                SecretCommands::Find { .. } => "secret find",
                SecretCommands::RotationSpecs { .. } => "secret rotation-specs",
                SecretCommands::Put { .. } => "secret put",
            },
            Self::Cluster { subcommand } => match subcommand {
                ClusterCommands::Create { .. } => "cluster create",
                ClusterCommands::Remove { .. } => "cluster remove",
                ClusterCommands::ExposePort { .. } => "cluster expose-port",
            },
        }
    }
}

/// Vault and item to operate on
#[derive(Args, Debug, Clone)]
pub struct ItemArgs {
    #[arg(long, help = "Vault title")]
    pub vault: String,
    #[arg(long, help = "Item title")]
    pub item: String,
}

/// Where the 1Password service account token comes from
#[derive(Args, Debug, Clone)]
pub struct OpAuthArgs {
    #[arg(
        long,
        value_name = "VAR",
        default_value = OP_TOKEN_ENV,
        help = "Environment variable holding the service account token"
    )]
    pub token_env: String,
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "token_env",
        help = "Read the service account token from a file instead"
    )]
    pub token_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum SecretCommands {
    #[command(about = "Print the value of a field")]
    Find {
        #[command(flatten)]
        target: ItemArgs,
        #[arg(long, help = "Field title")]
        field: String,
        #[arg(long, help = "Only match fields in this section (empty means any)")]
        section: Option<String>,
        #[command(flatten)]
        auth: OpAuthArgs,
    },
    #[command(about = "Print the rotation spec of an item as JSON")]
    RotationSpecs {
        #[command(flatten)]
        target: ItemArgs,
        #[arg(long, help = "Section holding the rotation fields")]
        section: String,
        #[command(flatten)]
        auth: OpAuthArgs,
    },
    #[command(about = "Store a value in a field, creating the item if needed")]
    Put {
        #[command(flatten)]
        target: ItemArgs,
        #[arg(long, help = "Field title")]
        field: String,
        #[arg(
            long,
            value_name = "VAR",
            help = "Environment variable holding the value (default: read stdin)"
        )]
        value_env: Option<String>,
        #[command(flatten)]
        auth: OpAuthArgs,
    },
}

/// Where the Replicated CLI runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunnerKind {
    /// `docker run` the vendor image
    Docker,
    /// A `replicated` binary on PATH
    Local,
    /// A Dagger container
    #[cfg(feature = "dagger-backend")]
    Dagger,
}

/// Replicated credentials, endpoints and runner
#[derive(Args, Debug, Clone)]
pub struct ReplicatedArgs {
    #[arg(
        long,
        value_name = "VAR",
        default_value = TOKEN_ENV,
        help = "Environment variable holding the Replicated API token"
    )]
    pub token_env: String,
    #[arg(long, env = API_ORIGIN_ENV, help = "Replicated API origin")]
    pub api_origin: Option<String>,
    #[arg(long, env = ID_ORIGIN_ENV, help = "Replicated identity service origin")]
    pub id_origin: Option<String>,
    #[arg(long, env = REGISTRY_ORIGIN_ENV, help = "Replicated registry origin")]
    pub registry_origin: Option<String>,
    #[arg(long, value_enum, default_value = "docker", help = "Where to run the CLI")]
    pub runner: RunnerKind,
    #[arg(
        long,
        env = IMAGE_ENV,
        default_value = REPLICATED_IMAGE,
        help = "Vendor CLI image for the docker and dagger runners"
    )]
    pub image: String,
}

#[derive(Subcommand, Debug)]
pub enum ClusterCommands {
    #[command(about = "Create a cluster and print its id and status")]
    Create {
        #[command(flatten)]
        replicated: ReplicatedArgs,
        #[arg(long, help = "Cluster name")]
        name: Option<String>,
        #[arg(long, default_value = "15m", help = "How long to wait for the cluster to be ready")]
        wait: String,
        #[arg(long, default_value = "20m", help = "Cluster time to live")]
        ttl: String,
        #[arg(long, default_value = "k3s", help = "Kubernetes distribution")]
        distribution: String,
        #[arg(
            id = "distribution_version",
            long = "version",
            default_value = "1.31.0",
            help = "Distribution version"
        )]
        distribution_version: String,
        #[arg(long, default_value_t = 1, help = "Number of nodes")]
        nodes: u32,
        #[arg(long, value_name = "PATH", help = "Write the kubeconfig to this file")]
        kubeconfig_out: Option<PathBuf>,
    },
    #[command(about = "Remove a cluster")]
    Remove {
        #[command(flatten)]
        replicated: ReplicatedArgs,
        #[arg(long, help = "Cluster id")]
        cluster_id: String,
    },
    #[command(about = "Expose a node port over HTTPS and print the hostname")]
    ExposePort {
        #[command(flatten)]
        replicated: ReplicatedArgs,
        #[arg(long, help = "Cluster id")]
        cluster_id: String,
        #[arg(long, help = "Node port to expose")]
        node_port: u16,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
