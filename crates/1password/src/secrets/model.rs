//! Vault data as seen by the lookups
//!
//! These are read-only snapshots of what the provider returned. Titles are
//! matched exactly and case-sensitively.

use serde::{Deserialize, Serialize};

/// A vault visible to the credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultOverview {
    /// Opaque vault identifier
    pub id: String,
    /// Display title
    pub title: String,
}

impl VaultOverview {
    /// Create a vault overview
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// An item as listed in a vault, without its fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOverview {
    /// Opaque item identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Identifier of the owning vault
    pub vault_id: String,
}

impl ItemOverview {
    /// Create an item overview
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, vault_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            vault_id: vault_id.into(),
        }
    }
}

/// A named grouping of fields within an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section identifier, unique within the item
    pub id: String,
    /// Display title
    pub title: String,
}

impl Section {
    /// Create a section
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A titled value within an item
#[derive(Clone, PartialEq, Eq)]
pub struct Field {
    /// Display title
    pub title: String,
    /// Plaintext value
    pub value: String,
    /// Owning section, `None` for item-level fields
    pub section_id: Option<String>,
}

impl Field {
    /// Create an item-level field
    #[must_use]
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            section_id: None,
        }
    }

    /// Place the field in a section
    #[must_use]
    pub fn in_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    /// Whether the field belongs to the given section.
    ///
    /// Item-level fields belong to no section.
    #[must_use]
    pub fn belongs_to(&self, section_id: &str) -> bool {
        self.section_id.as_deref() == Some(section_id)
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("title", &self.title)
            .field("value", &"[REDACTED]")
            .field("section_id", &self.section_id)
            .finish()
    }
}

/// A fully loaded item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Opaque item identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Identifier of the owning vault
    pub vault_id: String,
    /// Sections in provider order
    pub sections: Vec<Section>,
    /// Fields in provider order
    pub fields: Vec<Field>,
}

impl Item {
    /// Create an item with no sections or fields
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, vault_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            vault_id: vault_id.into(),
            sections: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Append a section
    #[must_use]
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Append a field
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// The item's overview, without sections or fields
    #[must_use]
    pub fn overview(&self) -> ItemOverview {
        ItemOverview::new(&self.id, &self.title, &self.vault_id)
    }
}
