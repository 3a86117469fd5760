//! 1Password secret lookup
//!
//! Lookups run in a fixed order: vault by title, item by title, full item
//! load, optional section, then either a single field or the rotation spec.
//! Each step is a first-exact-match scan over what the provider returns.

mod lookup;
mod model;
mod op_cli;
mod provider;
mod resolver;
mod rotation;

pub use lookup::{find_field_value, find_item, find_section, find_vault, resolve_section_scope};
pub use model::{Field, Item, ItemOverview, Section, VaultOverview};
pub use op_cli::{OP_PATH_ENV, OP_TOKEN_ENV, OpCliClient, OpCliConnector};
pub use provider::{ProviderConnector, ProviderStream, VaultProvider};
pub use resolver::{
    FindSecretRequest, OnePassword, PutOutcome, PutSecretRequest, ROTATION_SPECS_SECRET,
    RotationSpecRequest,
};
pub use rotation::{CREATED_ON, EXPIRES_ON, ROTATION_FUNCTION, RotationSpec, extract_rotation_spec};
