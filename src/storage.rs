/// Storage for chrome.storage.local: the key-value seam and typed collections

use crate::context_menu::ContextMenuData;
use crate::error::Result;
use crate::settings::AppSettings;
use crate::tab_data::{Profile, TabGroup};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub const GROUPS_KEY: &str = "groups";
pub const PROFILES_KEY: &str = "profiles";
pub const SETTINGS_KEY: &str = "settings";
pub const CONTEXT_MENU_DATA_KEY: &str = "contextMenuData";

/// Flat key-value document store. Every `set` replaces the whole value.
#[async_trait(?Send)]
pub trait Store {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// In-process store backing unit tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, Value>>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls served so far
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.values.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// Typed view over the three top-level collections
pub struct Storage<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> Storage<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Storage { store }
    }

    pub async fn profiles(&self) -> Result<Vec<Profile>> {
        self.load_or_default(PROFILES_KEY).await
    }

    pub async fn find_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        Ok(self
            .profiles()
            .await?
            .into_iter()
            .find(|profile| profile.id == profile_id))
    }

    pub async fn set_profiles(&self, profiles: &[Profile]) -> Result<()> {
        self.save(PROFILES_KEY, profiles).await
    }

    pub async fn groups(&self) -> Result<Vec<TabGroup>> {
        self.load_or_default(GROUPS_KEY).await
    }

    pub async fn set_groups(&self, groups: &[TabGroup]) -> Result<()> {
        self.save(GROUPS_KEY, groups).await
    }

    pub async fn settings(&self) -> Result<AppSettings> {
        self.load_or_default(SETTINGS_KEY).await
    }

    pub async fn set_settings(&self, settings: &AppSettings) -> Result<()> {
        self.save(SETTINGS_KEY, settings).await
    }

    /// Page picked from the context menu, waiting for the popup
    pub async fn set_context_menu_data(&self, data: &ContextMenuData) -> Result<()> {
        self.save(CONTEXT_MENU_DATA_KEY, data).await
    }

    /// Seed missing collections; existing values are left alone
    pub async fn initialize(&self) -> Result<()> {
        if self.store.get(GROUPS_KEY).await?.is_none() {
            self.set_groups(&[]).await?;
        }
        if self.store.get(PROFILES_KEY).await?.is_none() {
            self.set_profiles(&[]).await?;
        }
        if self.store.get(SETTINGS_KEY).await?.is_none() {
            self.set_settings(&AppSettings::default()).await?;
        }
        Ok(())
    }

    async fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.store.get(key).await? {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.store.set(key, value).await
    }
}
