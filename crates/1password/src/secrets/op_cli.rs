//! 1Password provider backed by the `op` CLI
//!
//! Authenticates with a service account token. The token is passed to `op`
//! through `OP_SERVICE_ACCOUNT_TOKEN` in the child environment only; it never
//! appears in argv or in this process's environment.
//!
//! Writing a field is the one place a secret reaches argv: `op item edit`
//! only takes assignments as arguments.

use super::model::{Field, Item, ItemOverview, Section, VaultOverview};
use super::provider::{ProviderConnector, ProviderStream, VaultProvider};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shipyard_secrets::{CommandRunner, EnvBindings, ExecError, ProcessRunner, SecretError, SecureSecret};

/// Environment variable overriding the path of the `op` binary
pub const OP_PATH_ENV: &str = "SHIPYARD_OP_PATH";

/// Environment variable `op` reads the service account token from
pub const OP_TOKEN_ENV: &str = "OP_SERVICE_ACCOUNT_TOKEN";

const DEFAULT_OP_PATH: &str = "op";
const ITEM_CATEGORY: &str = "Secure Note";

/// Connects to 1Password by running `op whoami` with a service account token.
#[derive(Debug, Clone)]
pub struct OpCliConnector<R = ProcessRunner> {
    op_path: String,
    runner: R,
}

impl OpCliConnector {
    /// Create a connector running `op` as a local process.
    ///
    /// Uses `SHIPYARD_OP_PATH` when set and non-empty, `op` from `PATH`
    /// otherwise.
    #[must_use]
    pub fn new() -> Self {
        let op_path = std::env::var(OP_PATH_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_OP_PATH.to_string());
        Self {
            op_path,
            runner: ProcessRunner::new(),
        }
    }
}

impl Default for OpCliConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> OpCliConnector<R> {
    /// Run `op` through a different runner
    #[must_use]
    pub fn with_runner<T>(self, runner: T) -> OpCliConnector<T> {
        OpCliConnector {
            op_path: self.op_path,
            runner,
        }
    }

    /// Use an explicit `op` binary
    #[must_use]
    pub fn with_op_path(mut self, op_path: impl Into<String>) -> Self {
        self.op_path = op_path.into();
        self
    }

    /// Path of the `op` binary
    #[must_use]
    pub fn op_path(&self) -> &str {
        &self.op_path
    }
}

#[async_trait]
impl<R: CommandRunner + Clone> ProviderConnector for OpCliConnector<R> {
    type Client = OpCliClient<R>;

    async fn connect(&self, credential: &SecureSecret) -> Result<Self::Client, SecretError> {
        let client = OpCliClient {
            op_path: self.op_path.clone(),
            runner: self.runner.clone(),
            env: EnvBindings::new().secret(OP_TOKEN_ENV, credential.clone()),
        };

        let output = client
            .runner
            .run(&client.argv(&["whoami", "--format", "json"]), &client.env)
            .await
            .map_err(|e| match e {
                ExecError::Failed { stderr, .. } => SecretError::Auth { message: stderr },
                other => SecretError::provider("authenticate", other),
            })?;
        let whoami: CliWhoAmI = serde_json::from_str(&output)
            .map_err(|e| SecretError::provider("authenticate", format!("unexpected op output: {e}")))?;

        tracing::debug!(
            account = whoami.url.as_deref().unwrap_or("unknown"),
            "Authenticated with 1Password"
        );
        Ok(client)
    }
}

/// Authenticated `op` client
pub struct OpCliClient<R = ProcessRunner> {
    op_path: String,
    runner: R,
    env: EnvBindings,
}

impl<R> std::fmt::Debug for OpCliClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpCliClient")
            .field("op_path", &self.op_path)
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner> OpCliClient<R> {
    fn argv(&self, args: &[&str]) -> Vec<String> {
        std::iter::once(self.op_path.as_str())
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }

    async fn run(&self, operation: &str, args: &[&str]) -> Result<String, SecretError> {
        self.runner.run(&self.argv(args), &self.env).await.map_err(|e| match e {
            ExecError::Failed { stderr, .. } => SecretError::provider(operation, stderr),
            other => SecretError::provider(operation, other),
        })
    }

    async fn run_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        args: &[&str],
    ) -> Result<T, SecretError> {
        let output = self.run(operation, args).await?;
        serde_json::from_str(&output)
            .map_err(|e| SecretError::provider(operation, format!("unexpected op output: {e}")))
    }

    async fn list<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        args: Vec<&str>,
    ) -> Result<Vec<T>, SecretError> {
        self.run_json(operation, &args).await
    }
}

#[async_trait]
impl<R: CommandRunner> VaultProvider for OpCliClient<R> {
    fn vaults(&self) -> ProviderStream<'_, VaultOverview> {
        stream::once(self.list::<CliVault>("list vaults", vec!["vault", "list", "--format", "json"]))
            .map_ok(|vaults| {
                stream::iter(
                    vaults
                        .into_iter()
                        .map(|v| Ok::<_, SecretError>(VaultOverview::new(v.id, v.name))),
                )
            })
            .try_flatten()
            .boxed()
    }

    fn items<'a>(&'a self, vault_id: &'a str) -> ProviderStream<'a, ItemOverview> {
        let args = vec!["item", "list", "--vault", vault_id, "--format", "json"];
        stream::once(self.list::<CliItemOverview>("list items", args))
            .map_ok(move |items| {
                stream::iter(
                    items
                        .into_iter()
                        .map(move |i| Ok::<_, SecretError>(i.into_overview(vault_id))),
                )
            })
            .try_flatten()
            .boxed()
    }

    async fn get_item(&self, vault_id: &str, item_id: &str) -> Result<Item, SecretError> {
        let item: CliItem = self
            .run_json(
                "get item",
                &["item", "get", item_id, "--vault", vault_id, "--format", "json"],
            )
            .await?;
        Ok(item.into_item(vault_id))
    }

    async fn create_item(&self, vault_id: &str, title: &str) -> Result<ItemOverview, SecretError> {
        let item: CliItemOverview = self
            .run_json(
                "create item",
                &[
                    "item",
                    "create",
                    "--vault",
                    vault_id,
                    "--category",
                    ITEM_CATEGORY,
                    "--title",
                    title,
                    "--format",
                    "json",
                ],
            )
            .await?;
        Ok(item.into_overview(vault_id))
    }

    async fn set_field(
        &self,
        vault_id: &str,
        item_id: &str,
        field_title: &str,
        value: &SecureSecret,
    ) -> Result<(), SecretError> {
        let assignment = format!("{}[password]={}", escape_field_name(field_title), value.expose());
        self.run(
            "set field",
            &["item", "edit", item_id, "--vault", vault_id, &assignment],
        )
        .await?;
        Ok(())
    }
}

/// Escape the characters `op` treats as syntax in assignment field names.
fn escape_field_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '.' | '=' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// `op ... --format json` response shapes

#[derive(Debug, Deserialize)]
struct CliWhoAmI {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CliVault {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CliRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CliItemOverview {
    id: String,
    title: String,
    #[serde(default)]
    vault: Option<CliRef>,
}

impl CliItemOverview {
    fn into_overview(self, vault_id: &str) -> ItemOverview {
        let vault_id = self.vault.map_or_else(|| vault_id.to_string(), |v| v.id);
        ItemOverview::new(self.id, self.title, vault_id)
    }
}

#[derive(Debug, Deserialize)]
struct CliSection {
    id: String,
    #[serde(default)]
    label: String,
}

#[derive(Deserialize)]
struct CliField {
    #[serde(default)]
    label: String,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    section: Option<CliRef>,
}

impl From<CliField> for Field {
    fn from(f: CliField) -> Self {
        let value = match f.value {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Self {
            title: f.label,
            value,
            section_id: f.section.map(|s| s.id),
        }
    }
}

#[derive(Deserialize)]
struct CliItem {
    id: String,
    title: String,
    #[serde(default)]
    vault: Option<CliRef>,
    #[serde(default)]
    sections: Vec<CliSection>,
    #[serde(default)]
    fields: Vec<CliField>,
}

impl CliItem {
    fn into_item(self, vault_id: &str) -> Item {
        Item {
            id: self.id,
            title: self.title,
            vault_id: self.vault.map_or_else(|| vault_id.to_string(), |v| v.id),
            sections: self
                .sections
                .into_iter()
                .map(|s| Section::new(s.id, s.label))
                .collect(),
            fields: self.fields.into_iter().map(Into::into).collect(),
        }
    }
}
