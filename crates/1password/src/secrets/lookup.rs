//! Find-by-title lookups over provider data

use super::model::{Item, ItemOverview, Section, VaultOverview};
use super::provider::{ProviderStream, VaultProvider};
use futures::TryStreamExt;
use shipyard_secrets::SecretError;

trait Titled {
    fn title(&self) -> &str;
}

impl Titled for VaultOverview {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for ItemOverview {
    fn title(&self) -> &str {
        &self.title
    }
}

/// First entry whose title equals `title`, in stream order.
///
/// Stops polling as soon as a match is seen. Provider errors end the scan.
async fn first_titled<T: Titled>(
    mut entries: ProviderStream<'_, T>,
    title: &str,
) -> Result<Option<T>, SecretError> {
    while let Some(entry) = entries.try_next().await? {
        if entry.title() == title {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

/// Find the first vault titled `title`.
pub async fn find_vault<P>(provider: &P, title: &str) -> Result<VaultOverview, SecretError>
where
    P: VaultProvider + ?Sized,
{
    first_titled(provider.vaults(), title)
        .await?
        .ok_or_else(|| SecretError::VaultNotFound {
            vault: title.to_string(),
        })
}

/// Find the first item titled `title` in `vault`.
pub async fn find_item<P>(
    provider: &P,
    vault: &VaultOverview,
    title: &str,
) -> Result<ItemOverview, SecretError>
where
    P: VaultProvider + ?Sized,
{
    first_titled(provider.items(&vault.id), title)
        .await?
        .ok_or_else(|| SecretError::ItemNotFound {
            vault: vault.title.clone(),
            item: title.to_string(),
        })
}

/// Find the first section of `item` titled `title`.
pub fn find_section<'a>(item: &'a Item, title: &str) -> Result<&'a Section, SecretError> {
    item.sections
        .iter()
        .find(|s| s.title == title)
        .ok_or_else(|| SecretError::SectionNotFound {
            item: item.title.clone(),
            section: title.to_string(),
        })
}

/// Resolve an optional section title to a section id.
///
/// `None` means no section filter and resolves to `None`. `Some(title)`
/// must name a section of the item, the empty title included.
pub fn resolve_section_scope<'a>(
    item: &'a Item,
    title: Option<&str>,
) -> Result<Option<&'a str>, SecretError> {
    title
        .map(|t| find_section(item, t).map(|s| s.id.as_str()))
        .transpose()
}

/// Value of the first candidate field titled `title`.
///
/// Without a section filter every field is a candidate; with one, only
/// fields in that section are.
pub fn find_field_value<'a>(
    item: &'a Item,
    section_id: Option<&str>,
    title: &str,
) -> Result<&'a str, SecretError> {
    item.fields
        .iter()
        .filter(|f| section_id.is_none_or(|id| f.belongs_to(id)))
        .find(|f| f.title == title)
        .map(|f| f.value.as_str())
        .ok_or_else(|| SecretError::FieldNotFound {
            item: item.title.clone(),
            field: title.to_string(),
        })
}
