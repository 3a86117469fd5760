//! CLI error reporting with miette diagnostics

use miette::Diagnostic;
use shipyard_replicated::ReplicatedError;
use shipyard_secrets::SecretError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error types with diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("{command}: {source}")]
    #[diagnostic(
        code(shipyard::secret::not_found),
        help("Titles are matched exactly and case-sensitively; check the vault, item, section and field names")
    )]
    LookupFailed {
        command: String,
        #[source]
        source: SecretError,
    },

    #[error("{command}: {source}")]
    #[diagnostic(
        code(shipyard::secret::auth_failed),
        help("Check that the service account token is valid and has access to the vault")
    )]
    AuthFailed {
        command: String,
        #[source]
        source: SecretError,
    },

    #[error("{command}: {source}")]
    #[diagnostic(code(shipyard::secret::provider_failed))]
    ProviderFailed {
        command: String,
        #[source]
        source: SecretError,
    },

    #[error("{source}")]
    #[diagnostic(
        code(shipyard::cli::credential),
        help("Set the environment variable named by --token-env (or --value-env)")
    )]
    Credential {
        #[source]
        source: SecretError,
    },

    #[error("{command}: {source}")]
    #[diagnostic(code(shipyard::cluster::command_failed))]
    ClusterFailed {
        command: String,
        #[source]
        source: ReplicatedError,
    },

    #[error("{command} did not finish within {seconds}s")]
    #[diagnostic(
        code(shipyard::cli::timeout),
        help("Raise --timeout-secs or check connectivity to the provider")
    )]
    Timeout { command: String, seconds: u64 },

    #[error("Failed to {operation} {}", path.display())]
    #[diagnostic(
        code(shipyard::cli::file_error),
        help("Check file permissions and ensure the path exists")
    )]
    FileError {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to {operation}")]
    #[diagnostic(code(shipyard::cli::io_error))]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tracing initialization failed: {message}")]
    #[diagnostic(
        code(shipyard::cli::tracing_error),
        help("Check the RUST_LOG environment variable")
    )]
    Tracing { message: String },
}

impl CliError {
    /// Classify a provider error from a secret command.
    pub fn secret(command: impl Into<String>, source: SecretError) -> Self {
        let command = command.into();
        match source {
            SecretError::Credential { .. } => Self::Credential { source },
            SecretError::Auth { .. } => Self::AuthFailed { command, source },
            e if e.is_lookup_failure() => Self::LookupFailed { command, source: e },
            e => Self::ProviderFailed { command, source: e },
        }
    }

    pub fn cluster(command: impl Into<String>, source: ReplicatedError) -> Self {
        Self::ClusterFailed {
            command: command.into(),
            source,
        }
    }

    pub const fn credential(source: SecretError) -> Self {
        Self::Credential { source }
    }

    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileError {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn tracing(message: impl Into<String>) -> Self {
        Self::Tracing {
            message: message.into(),
        }
    }
}

/// Result type for CLI commands
pub type CliResult<T> = Result<T, CliError>;
