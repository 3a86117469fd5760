//! Secret handling for shipyard
//!
//! Shared building blocks for the shipyard integration crates:
//!
//! - [`SecretError`]: the error taxonomy for vault lookups
//! - [`SecureSecret`] and [`SecretHandle`]: secret values that zero their
//!   memory on drop and never print themselves
//! - [`credential`]: loading provider credentials without aborting on bad input
//! - [`exec`]: the subprocess runner used to drive vendor CLIs
//!
//! Provider implementations are in separate crates:
//! - shipyard-1password: vault/item/field lookups and rotation specs
//! - shipyard-replicated: CMX cluster lifecycle through the Replicated CLI

pub mod credential;
pub mod exec;
mod types;

pub use credential::Credential;
pub use exec::{CommandRunner, EnvBindings, EnvValue, ExecError, ProcessRunner};
pub use types::{SecretHandle, SecureSecret};

use thiserror::Error;

/// Error types for secret lookup and storage
#[derive(Debug, Error)]
pub enum SecretError {
    /// No vault with the requested title is visible to the credential
    #[error("vault '{vault}' not found")]
    VaultNotFound {
        /// Requested vault title
        vault: String,
    },

    /// No item with the requested title exists in the vault
    #[error("item '{item}' not found in vault '{vault}'")]
    ItemNotFound {
        /// Vault that was searched
        vault: String,
        /// Requested item title
        item: String,
    },

    /// The item has no section with the requested title
    #[error("section '{section}' not found in item '{item}'")]
    SectionNotFound {
        /// Item that was searched
        item: String,
        /// Requested section title
        section: String,
    },

    /// No candidate field has the requested title
    #[error("field '{field}' not found in item '{item}'")]
    FieldNotFound {
        /// Item that was searched
        item: String,
        /// Requested field title
        field: String,
    },

    /// The rotation section lacks one of the required fields
    #[error("rotation specs not found in section '{section}' of item '{item}'")]
    RotationSpecNotFound {
        /// Item that was searched
        item: String,
        /// Section that should hold the rotation fields
        section: String,
    },

    /// The provider rejected the credential
    #[error("authentication failed: {message}")]
    Auth {
        /// Provider message
        message: String,
    },

    /// The credential could not be read as plaintext
    #[error("credential '{name}' is unusable: {message}")]
    Credential {
        /// Where the credential was read from (env var name, file path)
        name: String,
        /// Why it could not be used
        message: String,
    },

    /// Transport or provider failure, passed through without retries
    #[error("{operation} failed: {message}")]
    Provider {
        /// Provider operation that failed (e.g. `list vaults`)
        operation: String,
        /// Error message from the provider
        message: String,
    },

    /// A derived record could not be serialized
    #[error("failed to serialize {what}: {message}")]
    Serialization {
        /// What was being serialized
        what: String,
        /// Serializer message
        message: String,
    },
}

impl SecretError {
    /// Create a provider error for the given operation
    #[must_use]
    pub fn provider(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Provider {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Whether this is one of the terminal lookup failures.
    ///
    /// These are configuration or input errors (a wrong vault, item, section
    /// or field name) and retrying will not change the outcome.
    #[must_use]
    pub const fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::VaultNotFound { .. }
                | Self::ItemNotFound { .. }
                | Self::SectionNotFound { .. }
                | Self::FieldNotFound { .. }
                | Self::RotationSpecNotFound { .. }
        )
    }
}
