//! Credential loading
//!
//! Provider credentials (service account tokens, API tokens) are read from the
//! environment or from a file. Anything that cannot be read as non-empty UTF-8
//! plaintext is a [`SecretError::Credential`] rather than a panic.

use crate::{SecretError, SecureSecret};
use std::path::Path;

/// Where a provider credential comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Environment variable name
    Env(String),
    /// File whose trimmed contents are the credential
    File(std::path::PathBuf),
}

impl Credential {
    /// Credential read from the named environment variable
    #[must_use]
    pub fn env(name: impl Into<String>) -> Self {
        Self::Env(name.into())
    }

    /// Credential read from a file
    #[must_use]
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    /// Human-readable location, safe to log
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::Env(name) => format!("env:{name}"),
            Self::File(path) => format!("file:{}", path.display()),
        }
    }

    /// Load the credential as plaintext.
    pub fn load(&self) -> Result<SecureSecret, SecretError> {
        let raw = match self {
            Self::Env(name) => std::env::var(name).map_err(|e| {
                let message = match e {
                    std::env::VarError::NotPresent => "not set".to_string(),
                    std::env::VarError::NotUnicode(_) => "not valid UTF-8".to_string(),
                };
                self.error(message)
            })?,
            Self::File(path) => {
                std::fs::read_to_string(path).map_err(|e| self.error(format!("unreadable: {e}")))?
            }
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(self.error("empty"));
        }

        tracing::debug!(credential = %self.location(), "Loaded credential");
        Ok(SecureSecret::new(trimmed.to_string()))
    }

    fn error(&self, message: impl Into<String>) -> SecretError {
        SecretError::Credential {
            name: self.location(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_credential_loads() {
        temp_env::with_var("SHIPYARD_TEST_TOKEN", Some("ops_abc123"), || {
            let secret = Credential::env("SHIPYARD_TEST_TOKEN").load().unwrap();
            assert_eq!(secret.expose(), "ops_abc123");
        });
    }

    #[test]
    fn test_env_credential_missing() {
        temp_env::with_var_unset("SHIPYARD_TEST_TOKEN_MISSING", || {
            let err = Credential::env("SHIPYARD_TEST_TOKEN_MISSING")
                .load()
                .unwrap_err();
            assert!(matches!(err, SecretError::Credential { .. }));
            assert!(err.to_string().contains("not set"));
            assert!(err.to_string().contains("env:SHIPYARD_TEST_TOKEN_MISSING"));
        });
    }

    #[test]
    fn test_env_credential_blank_is_rejected() {
        temp_env::with_var("SHIPYARD_TEST_TOKEN_BLANK", Some("   "), || {
            let err = Credential::env("SHIPYARD_TEST_TOKEN_BLANK")
                .load()
                .unwrap_err();
            assert!(err.to_string().contains("empty"));
        });
    }

    #[test]
    fn test_file_credential_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  token-from-file  ").unwrap();

        let secret = Credential::file(file.path()).load().unwrap();
        assert_eq!(secret.expose(), "token-from-file");
    }

    #[test]
    fn test_file_credential_missing() {
        let err = Credential::file("/nonexistent/shipyard/token")
            .load()
            .unwrap_err();
        assert!(matches!(err, SecretError::Credential { .. }));
        assert!(err.to_string().contains("unreadable"));
    }

    #[test]
    fn test_location_does_not_contain_value() {
        let credential = Credential::env("OP_SERVICE_ACCOUNT_TOKEN");
        assert_eq!(credential.location(), "env:OP_SERVICE_ACCOUNT_TOKEN");
    }
}
