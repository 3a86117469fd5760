//! 1Password integration for shipyard
//!
//! This crate looks up and stores secrets in 1Password vaults.
//! Currently supports:
//! - Field lookups, rotation-spec extraction and secret writes via the
//!   [`secrets`] module
//! - The `op` CLI as the vault provider ([`OpCliConnector`])

pub mod secrets;

// Re-export main types for convenience
pub use secrets::{
    FindSecretRequest, OnePassword, OpCliConnector, ProviderConnector, PutOutcome,
    PutSecretRequest, RotationSpec, RotationSpecRequest, VaultProvider,
};
