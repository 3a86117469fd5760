//! Rotation specs stored in an item section
//!
//! A rotation spec is three fields inside one named section of an item
//! (conventionally `rotation`): `expires-on`, `created-on` and
//! `rotationFunction`. 1Password date fields do not come back through the
//! provider, so the two dates are stored and returned as plain strings;
//! parsing them is up to the consumer.

use super::lookup::find_section;
use super::model::Item;
use serde::{Deserialize, Serialize};
use shipyard_secrets::SecretError;

/// Field title holding the expiry date
pub const EXPIRES_ON: &str = "expires-on";
/// Field title holding the creation date
pub const CREATED_ON: &str = "created-on";
/// Field title naming the rotation function
pub const ROTATION_FUNCTION: &str = "rotationFunction";

/// What is needed to rotate a secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RotationSpec {
    /// When the secret expires
    pub expires_on: String,
    /// When the secret was created
    pub created_on: String,
    /// Identifier of the function that rotates the secret
    pub rotation_function: String,
}

impl RotationSpec {
    /// Whether all three attributes are set
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.expires_on.is_empty()
            && !self.created_on.is_empty()
            && !self.rotation_function.is_empty()
    }

    /// Serialize as `{"ExpiresOn":…,"CreatedOn":…,"RotationFunction":…}`.
    pub fn to_json(&self) -> Result<String, SecretError> {
        serde_json::to_string(self).map_err(|e| SecretError::Serialization {
            what: "rotation specs".to_string(),
            message: e.to_string(),
        })
    }

    fn record(&mut self, title: &str, value: &str) {
        let slot = match title {
            EXPIRES_ON => &mut self.expires_on,
            CREATED_ON => &mut self.created_on,
            ROTATION_FUNCTION => &mut self.rotation_function,
            _ => return,
        };
        value.clone_into(slot);
    }
}

/// Extract the rotation spec from the section titled `section`.
///
/// The section title is required: an empty title never matches, not even a
/// section without a label. Fields outside the section, item-level fields
/// included, are ignored. The scan stops once all three attributes are set.
pub fn extract_rotation_spec(item: &Item, section: &str) -> Result<RotationSpec, SecretError> {
    if section.is_empty() {
        return Err(SecretError::SectionNotFound {
            item: item.title.clone(),
            section: String::new(),
        });
    }
    let section_id = find_section(item, section)?.id.as_str();

    let mut spec = RotationSpec::default();
    for field in item.fields.iter().filter(|f| f.belongs_to(section_id)) {
        spec.record(&field.title, &field.value);
        if spec.is_complete() {
            break;
        }
    }

    if !spec.is_complete() {
        return Err(SecretError::RotationSpecNotFound {
            item: item.title.clone(),
            section: section.to_string(),
        });
    }

    tracing::debug!(item = %item.title, section, "Extracted rotation specs");
    Ok(spec)
}
