/// The browser capability surface: tabs, tab-groups and windows
use crate::error::Result;
use crate::tab_data::GroupColor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

/// `chrome.windows.WINDOW_ID_CURRENT`
pub const WINDOW_ID_CURRENT: i32 = -2;

/// `chrome.tabGroups.TAB_GROUP_ID_NONE`
pub const TAB_GROUP_ID_NONE: i32 = -1;

/// Schemes of pages that belong to the browser or to an extension
const RESTRICTED_SCHEMES: &[&str] = &[
    "chrome",
    "chrome-extension",
    "chrome-untrusted",
    "devtools",
    "edge",
];

/// A live tab as reported by `chrome.tabs`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserTab {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub index: i32,
    #[serde(default)]
    pub window_id: i32,
    #[serde(default)]
    pub group_id: Option<i32>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fav_icon_url: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub active: bool,
}

impl BrowserTab {
    /// The tab-group this tab belongs to, if any
    pub fn tab_group(&self) -> Option<i32> {
        self.group_id.filter(|id| *id != TAB_GROUP_ID_NONE)
    }
}

/// A live tab-group as reported by `chrome.tabGroups`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserTabGroup {
    pub id: i32,
    #[serde(default)]
    pub window_id: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub color: GroupColor,
    #[serde(default)]
    pub collapsed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserWindow {
    pub id: i32,
    #[serde(default)]
    pub tabs: Vec<BrowserTab>,
}

/// Properties for `chrome.tabs.create`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTab {
    pub window_id: i32,
    pub url: String,
    pub active: bool,
}

/// Properties for `chrome.tabGroups.update`; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<GroupColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

/// Where a context-menu entry shows up
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MenuContext {
    Page,
    Link,
    Selection,
}

/// Properties for `chrome.contextMenus.create`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    pub contexts: Vec<MenuContext>,
}

/// Everything the extension asks of the browser.
///
/// Each call maps onto one extension API call; failures surface as
/// `Error::Platform`.
#[async_trait(?Send)]
pub trait Browser {
    /// All tabs across normal windows
    async fn query_tabs(&self) -> Result<Vec<BrowserTab>>;

    async fn query_tab_groups(&self) -> Result<Vec<BrowserTabGroup>>;

    /// The active tab of the current window
    async fn active_tab(&self) -> Result<Option<BrowserTab>>;

    /// Normal windows, topmost first
    async fn normal_windows(&self) -> Result<Vec<BrowserWindow>>;

    /// Open a focused window; its initial tab comes back in `tabs`
    async fn create_window(&self) -> Result<BrowserWindow>;

    async fn focus_window(&self, window_id: i32) -> Result<()>;

    async fn create_tab(&self, props: CreateTab) -> Result<BrowserTab>;

    async fn set_tab_pinned(&self, tab_id: i32, pinned: bool) -> Result<()>;

    async fn activate_tab(&self, tab_id: i32) -> Result<()>;

    async fn remove_tab(&self, tab_id: i32) -> Result<()>;

    /// Put tabs into a new tab-group in `window_id`, returning its id
    async fn group_tabs(&self, tab_ids: &[i32], window_id: i32) -> Result<i32>;

    async fn update_tab_group(&self, group_id: i32, update: GroupUpdate) -> Result<()>;

    async fn create_context_menu(&self, item: MenuItem) -> Result<()>;

    /// Open the toolbar popup
    async fn open_popup(&self) -> Result<()>;
}

/// True for URLs that cannot be captured or reopened: browser internals,
/// extension pages, and anything that is not a URL at all.
pub fn is_restricted_url(url: &str) -> bool {
    match Url::parse(url.trim()) {
        Ok(parsed) => RESTRICTED_SCHEMES.contains(&parsed.scheme()),
        Err(_) => true,
    }
}
