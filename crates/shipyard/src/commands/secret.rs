//! `shipyard secret` commands

use super::{emit, emit_line};
use crate::cli::{ItemArgs, OpAuthArgs, SecretCommands};
use crate::command_span;
use crate::errors::{CliError, CliResult};
use shipyard_1password::{
    FindSecretRequest, OnePassword, OpCliConnector, PutSecretRequest, RotationSpecRequest,
};
use shipyard_secrets::{Credential, SecureSecret};
use tokio::io::AsyncReadExt;
use tracing::Instrument;

impl OpAuthArgs {
    fn credential(&self) -> Credential {
        self.token_file
            .as_ref()
            .map_or_else(|| Credential::env(&self.token_env), Credential::file)
    }

    fn load(&self) -> CliResult<SecureSecret> {
        self.credential().load().map_err(CliError::credential)
    }
}

pub async fn execute(command: SecretCommands) -> CliResult<()> {
    let op = OnePassword::new(OpCliConnector::new());

    match command {
        SecretCommands::Find {
            target: ItemArgs { vault, item },
            field,
            section,
            auth,
        } => {
            async {
                let credential = auth.load()?;
                let mut request = FindSecretRequest::new(vault, item, field);
                if let Some(section) = section {
                    request = request.with_section(section);
                }
                let handle = op
                    .find_secret(&credential, &request)
                    .await
                    .map_err(|e| CliError::secret("secret find", e))?;
                emit(handle.expose())
            }
            .instrument(command_span!("secret find"))
            .await
        }
        SecretCommands::RotationSpecs {
            target: ItemArgs { vault, item },
            section,
            auth,
        } => {
            async {
                let credential = auth.load()?;
                let request = RotationSpecRequest::new(vault, item, section);
                let handle = op
                    .find_secret_rotation_specs(&credential, &request)
                    .await
                    .map_err(|e| CliError::secret("secret rotation-specs", e))?;
                emit(handle.expose())
            }
            .instrument(command_span!("secret rotation-specs"))
            .await
        }
        SecretCommands::Put {
            target: ItemArgs { vault, item },
            field,
            value_env,
            auth,
        } => {
            async {
                let credential = auth.load()?;
                let value = match value_env {
                    Some(name) => Credential::env(name).load().map_err(CliError::credential)?,
                    None => read_stdin_value().await?,
                };
                let request = PutSecretRequest::new(vault, item, field);
                let outcome = op
                    .put_secret(&credential, &request, &value)
                    .await
                    .map_err(|e| CliError::secret("secret put", e))?;
                let json = serde_json::to_string(&outcome)
                    .map_err(|e| CliError::io("encode put result", e.into()))?;
                emit_line(&json)
            }
            .instrument(command_span!("secret put"))
            .await
        }
    }
}

/// Read the value to store from stdin, dropping one trailing line ending.
async fn read_stdin_value() -> CliResult<SecureSecret> {
    let mut value = String::new();
    tokio::io::stdin()
        .read_to_string(&mut value)
        .await
        .map_err(|e| CliError::io("read value from stdin", e))?;
    let trimmed = strip_line_ending(&value).len();
    value.truncate(trimmed);
    Ok(SecureSecret::new(value))
}

fn strip_line_ending(value: &str) -> &str {
    value
        .strip_suffix("\r\n")
        .or_else(|| value.strip_suffix('\n'))
        .unwrap_or(value)
}
