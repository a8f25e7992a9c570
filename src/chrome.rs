/// chrome.* implementations of the `Store` and `Browser` seams

use crate::browser::{
    Browser, BrowserTab, BrowserTabGroup, BrowserWindow, CreateTab, GroupUpdate, MenuItem,
};
use crate::error::{self, Error};
use crate::storage::Store;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/js/background.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryTabs() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryTabGroups() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getActiveTab() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getNormalWindows() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createWindow() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateWindow(window_id: i32, props: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn createTab(props: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateTab(tab_id: i32, props: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeTab(tab_id: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn groupTabs(tab_ids: JsValue, window_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateTabGroup(group_id: i32, props: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn createContextMenu(props: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn openPopup() -> Result<(), JsValue>;
}

/// Render a thrown JS value as a message
fn describe(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn platform(value: JsValue) -> Error {
    Error::Platform(describe(&value))
}

/// Rust -> JS with plain objects instead of `Map`s
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> error::Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| Error::Platform(format!("Failed to serialize: {}", e)))
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> error::Result<T> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| Error::Platform(format!("Failed to parse: {}", e)))
}

/// chrome.storage.local
pub struct ChromeStore;

#[async_trait(?Send)]
impl Store for ChromeStore {
    async fn get(&self, key: &str) -> error::Result<Option<Value>> {
        let value = getStorage(key)
            .await
            .map_err(|e| Error::Storage(format!("Failed to get {}: {}", key, describe(&e))))?;

        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        from_js(value).map(Some)
    }

    async fn set(&self, key: &str, value: Value) -> error::Result<()> {
        setStorage(key, to_js(&value)?)
            .await
            .map_err(|e| Error::Storage(format!("Failed to set {}: {}", key, describe(&e))))
    }
}

/// chrome.tabs, chrome.tabGroups, chrome.windows and chrome.contextMenus
pub struct ChromeBrowser;

#[derive(Serialize)]
struct TabProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pinned: Option<bool>,
}

#[derive(Serialize)]
struct WindowProps {
    focused: bool,
}

#[async_trait(?Send)]
impl Browser for ChromeBrowser {
    async fn query_tabs(&self) -> error::Result<Vec<BrowserTab>> {
        from_js(queryTabs().await.map_err(platform)?)
    }

    async fn query_tab_groups(&self) -> error::Result<Vec<BrowserTabGroup>> {
        from_js(queryTabGroups().await.map_err(platform)?)
    }

    async fn active_tab(&self) -> error::Result<Option<BrowserTab>> {
        let tab = getActiveTab().await.map_err(platform)?;
        if tab.is_null() || tab.is_undefined() {
            return Ok(None);
        }
        from_js(tab).map(Some)
    }

    async fn normal_windows(&self) -> error::Result<Vec<BrowserWindow>> {
        from_js(getNormalWindows().await.map_err(platform)?)
    }

    async fn create_window(&self) -> error::Result<BrowserWindow> {
        from_js(createWindow().await.map_err(platform)?)
    }

    async fn focus_window(&self, window_id: i32) -> error::Result<()> {
        updateWindow(window_id, to_js(&WindowProps { focused: true })?)
            .await
            .map_err(platform)
    }

    async fn create_tab(&self, props: CreateTab) -> error::Result<BrowserTab> {
        from_js(createTab(to_js(&props)?).await.map_err(platform)?)
    }

    async fn set_tab_pinned(&self, tab_id: i32, pinned: bool) -> error::Result<()> {
        let props = TabProps {
            active: None,
            pinned: Some(pinned),
        };
        updateTab(tab_id, to_js(&props)?).await.map_err(platform)
    }

    async fn activate_tab(&self, tab_id: i32) -> error::Result<()> {
        let props = TabProps {
            active: Some(true),
            pinned: None,
        };
        updateTab(tab_id, to_js(&props)?).await.map_err(platform)
    }

    async fn remove_tab(&self, tab_id: i32) -> error::Result<()> {
        removeTab(tab_id).await.map_err(platform)
    }

    async fn group_tabs(&self, tab_ids: &[i32], window_id: i32) -> error::Result<i32> {
        let group_id = groupTabs(to_js(tab_ids)?, window_id).await.map_err(platform)?;
        group_id
            .as_f64()
            .map(|id| id as i32)
            .ok_or_else(|| Error::platform("tabs.group returned no group id"))
    }

    async fn update_tab_group(&self, group_id: i32, update: GroupUpdate) -> error::Result<()> {
        updateTabGroup(group_id, to_js(&update)?).await.map_err(platform)
    }

    async fn create_context_menu(&self, item: MenuItem) -> error::Result<()> {
        createContextMenu(to_js(&item)?).await.map_err(platform)
    }

    async fn open_popup(&self) -> error::Result<()> {
        openPopup().await.map_err(platform)
    }
}
