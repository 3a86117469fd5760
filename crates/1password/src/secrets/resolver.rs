//! Find and put operations against a 1Password provider

use super::lookup::{find_field_value, find_item, find_vault, resolve_section_scope};
use super::model::{Item, ItemOverview};
use super::provider::{ProviderConnector, VaultProvider};
use super::rotation::extract_rotation_spec;
use serde::{Deserialize, Deserializer, Serialize};
use shipyard_secrets::{SecretError, SecretHandle, SecureSecret};
use tracing::instrument;

/// Name of the secret handle returned by rotation-spec lookups
pub const ROTATION_SPECS_SECRET: &str = "rotationSpecs";

/// Inputs for a single field lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FindSecretRequest {
    /// Vault title
    pub vault: String,
    /// Item title
    pub item: String,
    /// Field title
    pub field: String,
    /// Restrict the lookup to fields in this section. An empty title means
    /// no restriction.
    #[serde(
        default,
        deserialize_with = "non_empty_section",
        skip_serializing_if = "Option::is_none"
    )]
    pub section: Option<String>,
}

fn non_empty_section<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

impl FindSecretRequest {
    /// Create an unscoped field lookup
    #[must_use]
    pub fn new(vault: impl Into<String>, item: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            vault: vault.into(),
            item: item.into(),
            field: field.into(),
            section: None,
        }
    }

    /// Restrict the lookup to one section; an empty title leaves it unscoped
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Section scope of the lookup, `None` when unscoped
    #[must_use]
    pub fn section_scope(&self) -> Option<&str> {
        self.section.as_deref().filter(|s| !s.is_empty())
    }
}

/// Inputs for a rotation-spec lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RotationSpecRequest {
    /// Vault title
    pub vault: String,
    /// Item title
    pub item: String,
    /// Section holding the rotation fields
    pub section: String,
}

impl RotationSpecRequest {
    /// Create a rotation-spec lookup
    #[must_use]
    pub fn new(
        vault: impl Into<String>,
        item: impl Into<String>,
        section: impl Into<String>,
    ) -> Self {
        Self {
            vault: vault.into(),
            item: item.into(),
            section: section.into(),
        }
    }
}

/// Inputs for storing a secret. The value is passed separately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PutSecretRequest {
    /// Vault title
    pub vault: String,
    /// Item title; the item is created when missing
    pub item: String,
    /// Field title to write
    pub field: String,
}

impl PutSecretRequest {
    /// Create a put request
    #[must_use]
    pub fn new(vault: impl Into<String>, item: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            vault: vault.into(),
            item: item.into(),
            field: field.into(),
        }
    }
}

/// Result of a put
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PutOutcome {
    /// Item the field was written to
    pub item: ItemOverview,
    /// Whether the item had to be created
    pub created: bool,
}

/// Secret lookups and writes against one provider.
///
/// Each operation authenticates with the given credential, runs to
/// completion and drops its client. Dropping an operation's future aborts
/// it, including any in-progress listing.
pub struct OnePassword<C> {
    connector: C,
}

impl<C: std::fmt::Debug> std::fmt::Debug for OnePassword<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnePassword")
            .field("connector", &self.connector)
            .finish()
    }
}

impl<C: ProviderConnector> OnePassword<C> {
    /// Create a new instance over the given connector
    #[must_use]
    pub const fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Look up one field's value.
    ///
    /// The returned handle is named after the field.
    #[instrument(
        skip(self, credential, request),
        fields(vault = %request.vault, item = %request.item, field = %request.field, section = ?request.section)
    )]
    pub async fn find_secret(
        &self,
        credential: &SecureSecret,
        request: &FindSecretRequest,
    ) -> Result<SecretHandle, SecretError> {
        let client = self.connector.connect(credential).await?;
        let item = load_item(&client, &request.vault, &request.item).await?;

        let section_id = resolve_section_scope(&item, request.section_scope())?;
        let value = find_field_value(&item, section_id, &request.field)?;

        tracing::debug!("Found secret field");
        Ok(SecretHandle::new(&request.field, value.to_string()))
    }

    /// Look up the rotation spec of an item, serialized as JSON.
    ///
    /// The returned handle is named [`ROTATION_SPECS_SECRET`].
    #[instrument(
        skip(self, credential, request),
        fields(vault = %request.vault, item = %request.item, section = %request.section)
    )]
    pub async fn find_secret_rotation_specs(
        &self,
        credential: &SecureSecret,
        request: &RotationSpecRequest,
    ) -> Result<SecretHandle, SecretError> {
        let client = self.connector.connect(credential).await?;
        let item = load_item(&client, &request.vault, &request.item).await?;

        let spec = extract_rotation_spec(&item, &request.section)?;
        Ok(SecretHandle::new(ROTATION_SPECS_SECRET, spec.to_json()?))
    }

    /// Store `value` in a field, creating the item when it does not exist.
    #[instrument(
        skip(self, credential, request, value),
        fields(vault = %request.vault, item = %request.item, field = %request.field)
    )]
    pub async fn put_secret(
        &self,
        credential: &SecureSecret,
        request: &PutSecretRequest,
        value: &SecureSecret,
    ) -> Result<PutOutcome, SecretError> {
        let client = self.connector.connect(credential).await?;
        let vault = find_vault(&client, &request.vault).await?;

        let (item, created) = match find_item(&client, &vault, &request.item).await {
            Ok(item) => (item, false),
            Err(SecretError::ItemNotFound { .. }) => {
                let item = client.create_item(&vault.id, &request.item).await?;
                (item, true)
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            item_id = %item.id,
            item_title = %item.title,
            vault_id = %item.vault_id,
            created,
            "Writing secret field"
        );

        client
            .set_field(&vault.id, &item.id, &request.field, value)
            .await?;

        Ok(PutOutcome { item, created })
    }
}

async fn load_item<P>(provider: &P, vault_title: &str, item_title: &str) -> Result<Item, SecretError>
where
    P: VaultProvider + ?Sized,
{
    let vault = find_vault(provider, vault_title).await?;
    let overview = find_item(provider, &vault, item_title).await?;
    provider.get_item(&vault.id, &overview.id).await
}
