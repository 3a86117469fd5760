//! Invocation environment for the Replicated CLI

use crate::ReplicatedError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shipyard_secrets::{CommandRunner, EnvBindings, SecureSecret};

/// Path of the CLI inside the vendor image
pub const CONTAINER_BINARY: &str = "/replicated";

/// Name of the CLI when installed locally
pub const LOCAL_BINARY: &str = "replicated";

/// API token variable
pub const TOKEN_ENV: &str = "REPLICATED_API_TOKEN";
/// API origin override
pub const API_ORIGIN_ENV: &str = "REPLICATED_API_ORIGIN";
/// Identity service origin override
pub const ID_ORIGIN_ENV: &str = "REPLICATED_ID_ORIGIN";
/// Registry origin override
pub const REGISTRY_ORIGIN_ENV: &str = "REPLICATED_REGISTRY_ORIGIN";

/// Overrides the vendor CLI image used by container runners
pub const IMAGE_ENV: &str = "SHIPYARD_REPLICATED_IMAGE";

/// Optional endpoint overrides for non-production Replicated environments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplicatedConfig {
    /// Overrides `REPLICATED_API_ORIGIN`
    pub api_origin: Option<String>,
    /// Overrides `REPLICATED_ID_ORIGIN`
    pub id_origin: Option<String>,
    /// Overrides `REPLICATED_REGISTRY_ORIGIN`
    pub registry_origin: Option<String>,
}

impl ReplicatedConfig {
    /// Environment for the CLI: the token as a secret, then each origin that
    /// is set and non-empty.
    #[must_use]
    pub fn environment(&self, token: SecureSecret) -> EnvBindings {
        let mut env = EnvBindings::new().secret(TOKEN_ENV, token);
        for (name, value) in [
            (API_ORIGIN_ENV, &self.api_origin),
            (ID_ORIGIN_ENV, &self.id_origin),
            (REGISTRY_ORIGIN_ENV, &self.registry_origin),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                env = env.plain(name, value);
            }
        }
        env
    }
}

/// An authenticated Replicated CLI bound to a runner
pub struct Replicated<R> {
    runner: R,
    binary: String,
    env: EnvBindings,
}

impl<R> std::fmt::Debug for Replicated<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replicated")
            .field("binary", &self.binary)
            .field("env", &self.env.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner> Replicated<R> {
    /// Create a CLI handle running [`CONTAINER_BINARY`] through `runner`.
    pub fn new(runner: R, token: SecureSecret, config: &ReplicatedConfig) -> Self {
        Self {
            runner,
            binary: CONTAINER_BINARY.to_string(),
            env: config.environment(token),
        }
    }

    /// Run a different CLI binary, e.g. [`LOCAL_BINARY`] with a process runner
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub(crate) async fn exec(&self, args: &[&str]) -> Result<String, ReplicatedError> {
        let argv: Vec<String> = std::iter::once(self.binary.as_str())
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect();
        Ok(self.runner.run(&argv, &self.env).await?)
    }

    pub(crate) async fn exec_json<T: DeserializeOwned>(
        &self,
        command: &str,
        args: &[&str],
    ) -> Result<T, ReplicatedError> {
        let output = self.exec(args).await?;
        serde_json::from_str(&output).map_err(|source| ReplicatedError::Decode {
            command: command.to_string(),
            source,
        })
    }
}
