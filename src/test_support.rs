/// Recording fake of the browser surface for unit tests
use crate::browser::{
    Browser, BrowserTab, BrowserTabGroup, BrowserWindow, CreateTab, GroupUpdate, MenuItem,
    TAB_GROUP_ID_NONE,
};
use crate::error::{Error, Result};
use crate::tab_data::GroupColor;
use async_trait::async_trait;
use std::cell::{Cell, RefCell};

pub const NEW_WINDOW_ID: i32 = 900;
pub const PLACEHOLDER_TAB_ID: i32 = 899;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    QueryTabs,
    QueryTabGroups,
    ActiveTab,
    NormalWindows,
    CreateWindow,
    FocusWindow(i32),
    CreateTab(CreateTab),
    SetPinned(i32, bool),
    ActivateTab(i32),
    RemoveTab(i32),
    GroupTabs(Vec<i32>, i32),
    UpdateTabGroup(i32, GroupUpdate),
    CreateContextMenu(MenuItem),
    OpenPopup,
}

#[derive(Default)]
pub struct FakeBrowser {
    pub tabs: Vec<BrowserTab>,
    pub tab_groups: Vec<BrowserTabGroup>,
    pub windows: Vec<BrowserWindow>,
    pub active: Option<BrowserTab>,
    pub failing_urls: Vec<String>,
    pub fail_queries: bool,
    pub fail_grouping: bool,
    pub fail_pinning: bool,
    pub fail_remove: bool,
    pub fail_menus: bool,
    pub fail_popup: bool,
    calls: RefCell<Vec<Call>>,
    next_tab_id: Cell<i32>,
    next_group_id: Cell<i32>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        FakeBrowser {
            windows: vec![BrowserWindow { id: 1, tabs: vec![] }],
            next_tab_id: Cell::new(100),
            next_group_id: Cell::new(500),
            ..FakeBrowser::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn created_tabs(&self) -> Vec<CreateTab> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateTab(props) => Some(props),
                _ => None,
            })
            .collect()
    }

    pub fn grouped(&self) -> Vec<(Vec<i32>, i32)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::GroupTabs(ids, window) => Some((ids, window)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

pub fn browser_tab(id: i32, index: i32, url: &str, group_id: i32) -> BrowserTab {
    BrowserTab {
        id: Some(id),
        index,
        window_id: 1,
        group_id: Some(group_id),
        url: Some(url.to_string()),
        title: Some(format!("Tab {}", id)),
        fav_icon_url: None,
        pinned: false,
        active: false,
    }
}

pub fn ungrouped_tab(id: i32, index: i32, url: &str) -> BrowserTab {
    browser_tab(id, index, url, TAB_GROUP_ID_NONE)
}

pub fn browser_group(id: i32, title: &str, color: GroupColor) -> BrowserTabGroup {
    BrowserTabGroup {
        id,
        window_id: 1,
        title: Some(title.to_string()),
        color,
        collapsed: false,
    }
}

#[async_trait(?Send)]
impl Browser for FakeBrowser {
    async fn query_tabs(&self) -> Result<Vec<BrowserTab>> {
        self.record(Call::QueryTabs);
        if self.fail_queries {
            return Err(Error::platform("tabs.query failed"));
        }
        Ok(self.tabs.clone())
    }

    async fn query_tab_groups(&self) -> Result<Vec<BrowserTabGroup>> {
        self.record(Call::QueryTabGroups);
        if self.fail_queries {
            return Err(Error::platform("tabGroups.query failed"));
        }
        Ok(self.tab_groups.clone())
    }

    async fn active_tab(&self) -> Result<Option<BrowserTab>> {
        self.record(Call::ActiveTab);
        Ok(self.active.clone())
    }

    async fn normal_windows(&self) -> Result<Vec<BrowserWindow>> {
        self.record(Call::NormalWindows);
        Ok(self.windows.clone())
    }

    async fn create_window(&self) -> Result<BrowserWindow> {
        self.record(Call::CreateWindow);
        Ok(BrowserWindow {
            id: NEW_WINDOW_ID,
            tabs: vec![BrowserTab {
                window_id: NEW_WINDOW_ID,
                ..ungrouped_tab(PLACEHOLDER_TAB_ID, 0, "chrome://newtab/")
            }],
        })
    }

    async fn focus_window(&self, window_id: i32) -> Result<()> {
        self.record(Call::FocusWindow(window_id));
        Ok(())
    }

    async fn create_tab(&self, props: CreateTab) -> Result<BrowserTab> {
        self.record(Call::CreateTab(props.clone()));
        if self.failing_urls.contains(&props.url) {
            return Err(Error::platform(format!("cannot open {}", props.url)));
        }
        let id = self.next_tab_id.get();
        self.next_tab_id.set(id + 1);
        Ok(BrowserTab {
            window_id: props.window_id,
            ..ungrouped_tab(id, id, &props.url)
        })
    }

    async fn set_tab_pinned(&self, tab_id: i32, pinned: bool) -> Result<()> {
        self.record(Call::SetPinned(tab_id, pinned));
        if self.fail_pinning {
            return Err(Error::platform("tabs.update failed"));
        }
        Ok(())
    }

    async fn activate_tab(&self, tab_id: i32) -> Result<()> {
        self.record(Call::ActivateTab(tab_id));
        Ok(())
    }

    async fn remove_tab(&self, tab_id: i32) -> Result<()> {
        self.record(Call::RemoveTab(tab_id));
        if self.fail_remove {
            return Err(Error::platform("No tab with id"));
        }
        Ok(())
    }

    async fn group_tabs(&self, tab_ids: &[i32], window_id: i32) -> Result<i32> {
        self.record(Call::GroupTabs(tab_ids.to_vec(), window_id));
        if self.fail_grouping {
            return Err(Error::platform("tabs.group failed"));
        }
        let id = self.next_group_id.get();
        self.next_group_id.set(id + 1);
        Ok(id)
    }

    async fn update_tab_group(&self, group_id: i32, update: GroupUpdate) -> Result<()> {
        self.record(Call::UpdateTabGroup(group_id, update));
        Ok(())
    }

    async fn create_context_menu(&self, item: MenuItem) -> Result<()> {
        self.record(Call::CreateContextMenu(item));
        if self.fail_menus {
            return Err(Error::platform("Cannot create item with duplicate id"));
        }
        Ok(())
    }

    async fn open_popup(&self) -> Result<()> {
        self.record(Call::OpenPopup);
        if self.fail_popup {
            return Err(Error::platform("no active browser window"));
        }
        Ok(())
    }
}
