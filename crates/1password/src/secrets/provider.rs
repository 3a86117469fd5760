//! Vault provider abstraction
//!
//! A [`ProviderConnector`] authenticates and hands out a [`VaultProvider`]
//! client. Every exported operation connects once and drops the client when
//! it finishes; nothing is shared between invocations.

use super::model::{Item, ItemOverview, VaultOverview};
use async_trait::async_trait;
use futures::stream::BoxStream;
use shipyard_secrets::{SecretError, SecureSecret};

/// Lazy, finite, fallible listing from a provider.
///
/// Pages are fetched as the stream is polled, so dropping the stream stops
/// pagination.
pub type ProviderStream<'a, T> = BoxStream<'a, Result<T, SecretError>>;

/// An authenticated vault provider client
#[async_trait]
pub trait VaultProvider: Send + Sync {
    /// All vaults visible to the credential.
    fn vaults(&self) -> ProviderStream<'_, VaultOverview>;

    /// All items in one vault.
    fn items<'a>(&'a self, vault_id: &'a str) -> ProviderStream<'a, ItemOverview>;

    /// Load an item with its sections and fields.
    async fn get_item(&self, vault_id: &str, item_id: &str) -> Result<Item, SecretError>;

    /// Create an empty item in a vault.
    async fn create_item(&self, vault_id: &str, title: &str) -> Result<ItemOverview, SecretError>;

    /// Write a concealed item-level field, creating it if it does not exist.
    async fn set_field(
        &self,
        vault_id: &str,
        item_id: &str,
        field_title: &str,
        value: &SecureSecret,
    ) -> Result<(), SecretError>;
}

/// Authenticates against a provider.
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    /// Client type handed out on success
    type Client: VaultProvider;

    /// Authenticate with the credential.
    ///
    /// Fails with [`SecretError::Auth`] when the provider rejects it.
    async fn connect(&self, credential: &SecureSecret) -> Result<Self::Client, SecretError>;
}
