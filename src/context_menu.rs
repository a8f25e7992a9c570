/// "Add this page to a group" context-menu entry.
///
/// A click stashes the page (or the clicked link) under `contextMenuData`
/// and opens the popup, which offers it for saving into a tab group.
use crate::browser::{Browser, BrowserTab, MenuContext, MenuItem, is_restricted_url};
use crate::error::Result;
use crate::storage::{Storage, Store};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub const ADD_PAGE_MENU_ID: &str = "add-current-page-to-group";

const UNTITLED: &str = "Untitled";

/// `chrome.contextMenus.OnClickData`, reduced to what a click needs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuClick {
    pub menu_item_id: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub selection_text: Option<String>,
}

/// Page handed over to the popup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextMenuData {
    pub url: String,
    pub title: String,
}

pub fn add_page_menu() -> MenuItem {
    MenuItem {
        id: ADD_PAGE_MENU_ID.to_string(),
        title: "Add this page to a group".to_string(),
        contexts: vec![MenuContext::Page, MenuContext::Link, MenuContext::Selection],
    }
}

pub async fn register<B: Browser + ?Sized>(browser: &B) -> Result<()> {
    browser.create_context_menu(add_page_menu()).await?;
    info!("Registered context menu {}", ADD_PAGE_MENU_ID);
    Ok(())
}

/// The page a click refers to.
///
/// A clicked link wins over the tab's own URL, selected text over the tab
/// title. Clicks on other entries and pages that cannot be saved give `None`.
pub fn clicked_page(click: &MenuClick, tab: Option<&BrowserTab>) -> Option<ContextMenuData> {
    if click.menu_item_id != ADD_PAGE_MENU_ID {
        return None;
    }

    let url = non_blank(click.link_url.as_deref())
        .or_else(|| tab.and_then(|tab| non_blank(tab.url.as_deref())))?;
    if is_restricted_url(url) {
        return None;
    }

    let title = non_blank(click.selection_text.as_deref())
        .or_else(|| tab.and_then(|tab| non_blank(tab.title.as_deref())))
        .unwrap_or(UNTITLED);

    Some(ContextMenuData {
        url: url.to_string(),
        title: title.to_string(),
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Store the clicked page for the popup and open it.
///
/// Opening the popup is best-effort; the stored page stays for the next
/// time the popup opens.
pub async fn handle_click<S: Store + ?Sized, B: Browser + ?Sized>(
    store: &S,
    browser: &B,
    click: &MenuClick,
    tab: Option<&BrowserTab>,
) -> Result<Option<ContextMenuData>> {
    let Some(data) = clicked_page(click, tab) else {
        debug!("Ignoring context menu click on {}", click.menu_item_id);
        return Ok(None);
    };

    Storage::new(store).set_context_menu_data(&data).await?;

    if let Err(e) = browser.open_popup().await {
        warn!("Could not open popup: {}", e);
    }
    Ok(Some(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CONTEXT_MENU_DATA_KEY, MemoryStore};
    use crate::test_support::{Call, FakeBrowser, ungrouped_tab};
    use futures::executor::block_on;
    use serde_json::json;

    fn create_test_click(link_url: Option<&str>, selection_text: Option<&str>) -> MenuClick {
        MenuClick {
            menu_item_id: ADD_PAGE_MENU_ID.to_string(),
            link_url: link_url.map(str::to_string),
            selection_text: selection_text.map(str::to_string),
        }
    }

    #[test]
    fn test_page_click_uses_tab() {
        let tab = ungrouped_tab(7, 0, "https://rust-lang.org");

        let data = clicked_page(&create_test_click(None, None), Some(&tab)).unwrap();

        assert_eq!(data.url, "https://rust-lang.org");
        assert_eq!(data.title, "Tab 7");
    }

    #[test]
    fn test_link_and_selection_win() {
        let tab = ungrouped_tab(7, 0, "https://rust-lang.org");
        let click = create_test_click(Some("https://docs.rs/serde"), Some("serde docs"));

        let data = clicked_page(&click, Some(&tab)).unwrap();

        assert_eq!(data.url, "https://docs.rs/serde");
        assert_eq!(data.title, "serde docs");
    }

    #[test]
    fn test_untitled_fallback() {
        let tab = BrowserTab {
            title: None,
            ..ungrouped_tab(7, 0, "https://rust-lang.org")
        };

        let data = clicked_page(&create_test_click(None, Some("  ")), Some(&tab)).unwrap();

        assert_eq!(data.title, "Untitled");
    }

    #[test]
    fn test_ignored_clicks() {
        let settings = ungrouped_tab(7, 0, "chrome://settings");
        let extension = ungrouped_tab(8, 0, "chrome-extension://abc/popup.html");
        let other_menu = MenuClick {
            menu_item_id: "something-else".to_string(),
            ..MenuClick::default()
        };

        assert_eq!(clicked_page(&create_test_click(None, None), Some(&settings)), None);
        assert_eq!(clicked_page(&create_test_click(None, None), Some(&extension)), None);
        assert_eq!(clicked_page(&create_test_click(None, None), None), None);
        assert_eq!(
            clicked_page(&other_menu, Some(&ungrouped_tab(9, 0, "https://a.com"))),
            None
        );
    }

    #[test]
    fn test_click_stores_page_and_opens_popup() {
        let store = MemoryStore::new();
        let browser = FakeBrowser::new();
        let tab = ungrouped_tab(7, 0, "https://rust-lang.org");
        let click = create_test_click(None, None);

        let data = block_on(handle_click(&store, &browser, &click, Some(&tab))).unwrap();

        assert!(data.is_some());
        assert_eq!(
            store.snapshot().get(CONTEXT_MENU_DATA_KEY),
            Some(&json!({ "url": "https://rust-lang.org", "title": "Tab 7" }))
        );
        assert_eq!(browser.calls(), vec![Call::OpenPopup]);
    }

    #[test]
    fn test_popup_failure_keeps_stored_page() {
        let store = MemoryStore::new();
        let mut browser = FakeBrowser::new();
        browser.fail_popup = true;
        let click = create_test_click(Some("https://docs.rs"), None);

        let data = block_on(handle_click(&store, &browser, &click, None)).unwrap();

        assert_eq!(data.map(|data| data.url).as_deref(), Some("https://docs.rs"));
        assert!(store.snapshot().contains_key(CONTEXT_MENU_DATA_KEY));
    }

    #[test]
    fn test_restricted_click_writes_nothing() {
        let store = MemoryStore::new();
        let browser = FakeBrowser::new();
        let tab = ungrouped_tab(7, 0, "chrome://newtab/");
        let click = create_test_click(None, None);

        let data = block_on(handle_click(&store, &browser, &click, Some(&tab))).unwrap();

        assert_eq!(data, None);
        assert_eq!(store.write_count(), 0);
        assert!(browser.calls().is_empty());
    }

    #[test]
    fn test_menu_item_shape() {
        let value = serde_json::to_value(add_page_menu()).unwrap();
        assert_eq!(value["id"], "add-current-page-to-group");
        assert_eq!(value["contexts"], json!(["page", "link", "selection"]));
    }
}
