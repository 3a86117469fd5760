//! In-memory 1Password provider for integration tests

#![allow(dead_code, clippy::unwrap_used)]

use async_trait::async_trait;
use futures::{StreamExt, stream};
use shipyard_1password::secrets::{
    Field, Item, ItemOverview, ProviderConnector, ProviderStream, VaultOverview, VaultProvider,
};
use shipyard_secrets::{SecretError, SecureSecret};
use std::sync::{Arc, Mutex};

pub const TOKEN: &str = "ops_valid_token";

#[derive(Debug, Default)]
pub struct State {
    /// Vault listing, one inner vec per page
    pub vault_pages: Vec<Vec<VaultOverview>>,
    pub items: Vec<Item>,
    pub connects: usize,
    pub pages_fetched: usize,
    pub created: Vec<ItemOverview>,
    /// (item id, field title, value)
    pub writes: Vec<(String, String, String)>,
    /// Stop yielding (pending forever) after this many vault entries
    pub hang_after: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    pub state: Arc<Mutex<State>>,
}

impl MemoryConnector {
    pub fn new(vault_pages: Vec<Vec<VaultOverview>>, items: Vec<Item>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                vault_pages,
                items,
                ..State::default()
            })),
        }
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }
}

#[async_trait]
impl ProviderConnector for MemoryConnector {
    type Client = MemoryClient;

    async fn connect(&self, credential: &SecureSecret) -> Result<Self::Client, SecretError> {
        self.with(|s| s.connects += 1);
        if credential.expose() != TOKEN {
            return Err(SecretError::Auth {
                message: "invalid service account token".to_string(),
            });
        }
        Ok(MemoryClient {
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Debug)]
pub struct MemoryClient {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl VaultProvider for MemoryClient {
    fn vaults(&self) -> ProviderStream<'_, VaultOverview> {
        let (pages, hang_after) = {
            let state = self.state.lock().unwrap();
            (state.vault_pages.clone(), state.hang_after)
        };
        let state = Arc::clone(&self.state);

        let listed = stream::iter(pages)
            .map(move |page| {
                state.lock().unwrap().pages_fetched += 1;
                stream::iter(page)
            })
            .flatten()
            .map(Ok);

        match hang_after {
            Some(n) => listed.take(n).chain(stream::pending()).boxed(),
            None => listed.boxed(),
        }
    }

    fn items<'a>(&'a self, vault_id: &'a str) -> ProviderStream<'a, ItemOverview> {
        let items: Vec<ItemOverview> = self
            .state
            .lock()
            .unwrap()
            .items
            .iter()
            .filter(|i| i.vault_id == vault_id)
            .map(Item::overview)
            .collect();
        stream::iter(items.into_iter().map(Ok)).boxed()
    }

    async fn get_item(&self, vault_id: &str, item_id: &str) -> Result<Item, SecretError> {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .find(|i| i.vault_id == vault_id && i.id == item_id)
            .cloned()
            .ok_or_else(|| SecretError::provider("get item", format!("no item {item_id}")))
    }

    async fn create_item(&self, vault_id: &str, title: &str) -> Result<ItemOverview, SecretError> {
        let mut state = self.state.lock().unwrap();
        let item = Item::new(format!("new-{}", state.created.len() + 1), title, vault_id);
        let overview = item.overview();
        state.items.push(item);
        state.created.push(overview.clone());
        Ok(overview)
    }

    async fn set_field(
        &self,
        vault_id: &str,
        item_id: &str,
        field_title: &str,
        value: &SecureSecret,
    ) -> Result<(), SecretError> {
        let mut state = self.state.lock().unwrap();
        state.writes.push((
            item_id.to_string(),
            field_title.to_string(),
            value.expose().to_string(),
        ));
        let item = state
            .items
            .iter_mut()
            .find(|i| i.vault_id == vault_id && i.id == item_id)
            .ok_or_else(|| SecretError::provider("set field", format!("no item {item_id}")))?;
        match item
            .fields
            .iter_mut()
            .find(|f| f.section_id.is_none() && f.title == field_title)
        {
            Some(field) => value.expose().clone_into(&mut field.value),
            None => item.fields.push(Field::new(field_title, value.expose())),
        }
        Ok(())
    }
}

pub fn token() -> SecureSecret {
    SecureSecret::new(TOKEN.to_string())
}
