/// Open Tabs - Chrome Extension for tab groups and session profiles
/// Built with Rust + WASM

pub mod bookmarks;
pub mod browser;
pub mod chrome;
pub mod clock;
pub mod context_menu;
pub mod error;
pub mod messages;
pub mod profiles;
pub mod restore;
pub mod settings;
pub mod snapshot;
pub mod storage;
pub mod tab_data;
pub mod transfer;

#[cfg(test)]
mod test_support;

use browser::BrowserTab;
use chrome::{ChromeBrowser, ChromeStore};
use clock::SystemClock;
use context_menu::MenuClick;
use messages::Background;
use serde_json::json;
use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

fn background() -> Background<ChromeStore, ChromeBrowser, SystemClock> {
    Background::new(ChromeStore, ChromeBrowser, SystemClock)
}

// Entry point for chrome.runtime.onMessage
#[wasm_bindgen]
pub async fn handle_message(message: JsValue) -> JsValue {
    let reply = match chrome::from_js::<serde_json::Value>(message) {
        Ok(message) => background().handle(message).await,
        Err(e) => json!({ "error": e.to_string() }),
    };

    chrome::to_js(&reply).unwrap_or(JsValue::NULL)
}

fn to_js_error(error: error::Error) -> JsValue {
    JsValue::from_str(&error.to_string())
}

// Entry point for chrome.runtime.onInstalled
#[wasm_bindgen]
pub async fn on_installed() -> Result<(), JsValue> {
    background().install().await.map_err(to_js_error)
}

// Entry point for chrome.contextMenus.onClicked; `tab` may be null
#[wasm_bindgen]
pub async fn on_context_menu_clicked(info: JsValue, tab: JsValue) -> Result<(), JsValue> {
    let click: MenuClick = chrome::from_js(info).map_err(to_js_error)?;
    let tab: Option<BrowserTab> = chrome::from_js(tab).map_err(to_js_error)?;

    background()
        .context_menu_clicked(click, tab)
        .await
        .map(|_| ())
        .map_err(to_js_error)
}
