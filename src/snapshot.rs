/// Capture the live tab/window state as profile groups
use crate::browser::{Browser, BrowserTab, BrowserTabGroup, is_restricted_url};
use crate::error::Result;
use crate::tab_data::{GroupId, ProfileGroup, TabEntry, count_tabs, new_id};
use futures::try_join;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const UNTITLED_GROUP: &str = "Untitled group";
pub const UNGROUPED_TITLE: &str = "Ungrouped tabs";
pub const UNTITLED_TAB: &str = "Untitled";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub group_count: usize,
    pub tab_count: usize,
}

/// Captured browser state, not yet named or saved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub groups: Vec<ProfileGroup>,
    pub meta: SnapshotMeta,
}

/// Read every normal-window tab and tab-group and fold them into profile groups.
///
/// Groups come out in the order the browser reports them, with the
/// ungrouped bucket last and only when it holds something.
pub async fn capture<B: Browser + ?Sized>(browser: &B) -> Result<Snapshot> {
    let (tabs, tab_groups) = try_join!(browser.query_tabs(), browser.query_tab_groups())?;
    let snapshot = build_snapshot(tabs, tab_groups);

    debug!(
        "Captured {} tabs in {} groups",
        snapshot.meta.tab_count, snapshot.meta.group_count
    );

    Ok(snapshot)
}

fn build_snapshot(tabs: Vec<BrowserTab>, tab_groups: Vec<BrowserTabGroup>) -> Snapshot {
    let positions: HashMap<i32, usize> = tab_groups
        .iter()
        .enumerate()
        .map(|(position, group)| (group.id, position))
        .collect();

    let mut groups: Vec<ProfileGroup> = tab_groups.into_iter().map(to_profile_group).collect();
    let mut ungrouped = ProfileGroup::new(GroupId::Ungrouped, UNGROUPED_TITLE);

    for tab in tabs {
        let Some(entry) = to_tab_entry(&tab) else {
            continue;
        };

        match tab.tab_group().and_then(|id| positions.get(&id)) {
            Some(&position) => groups[position].tabs.push(entry),
            None => ungrouped.tabs.push(entry),
        }
    }

    if !ungrouped.tabs.is_empty() {
        groups.push(ungrouped);
    }

    groups.iter_mut().for_each(ProfileGroup::sort_tabs);

    let meta = SnapshotMeta {
        group_count: groups.len(),
        tab_count: count_tabs(&groups),
    };

    Snapshot { groups, meta }
}

fn to_profile_group(group: BrowserTabGroup) -> ProfileGroup {
    let title = group
        .title
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| UNTITLED_GROUP.to_string());

    ProfileGroup {
        id: GroupId::Tagged(group.id.to_string()),
        window_id: Some(group.window_id),
        title,
        color: Some(group.color),
        collapsed: Some(group.collapsed),
        tabs: Vec::new(),
    }
}

/// `None` for tabs that cannot be restored later
fn to_tab_entry(tab: &BrowserTab) -> Option<TabEntry> {
    let url = tab.url.as_deref().filter(|url| !is_restricted_url(url))?;

    Some(TabEntry {
        id: tab.id.map(|id| id.to_string()).unwrap_or_else(new_id),
        url: url.to_string(),
        title: Some(
            tab.title
                .clone()
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| UNTITLED_TAB.to_string()),
        ),
        favicon: tab.fav_icon_url.clone(),
        pinned: Some(tab.pinned),
        order: tab.index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::tab_data::GroupColor;
    use crate::test_support::{Call, FakeBrowser, browser_group, browser_tab, ungrouped_tab};
    use futures::executor::block_on;

    #[test]
    fn test_capture_grouped_and_ungrouped() {
        let mut browser = FakeBrowser::new();
        browser.tab_groups = vec![browser_group(10, "Research", GroupColor::Green)];
        browser.tabs = vec![
            browser_tab(1, 0, "https://arxiv.org", 10),
            ungrouped_tab(2, 1, "https://news.ycombinator.com"),
            browser_tab(3, 2, "https://scholar.google.com", 10),
        ];

        let snapshot = block_on(capture(&browser)).unwrap();

        assert_eq!(snapshot.meta.group_count, 2);
        assert_eq!(snapshot.meta.tab_count, 3);
        assert_eq!(snapshot.groups[0].id, GroupId::tagged("10"));
        assert_eq!(snapshot.groups[0].title, "Research");
        assert_eq!(snapshot.groups[0].color, Some(GroupColor::Green));
        assert_eq!(snapshot.groups[0].tabs.len(), 2);
        assert_eq!(snapshot.groups[1].id.as_str(), "ungrouped");
        assert_eq!(snapshot.groups[1].tabs[0].id, "2");
    }

    #[test]
    fn test_capture_reads_both_sources() {
        let browser = FakeBrowser::new();
        block_on(capture(&browser)).unwrap();

        let calls = browser.calls();
        assert!(calls.contains(&Call::QueryTabs));
        assert!(calls.contains(&Call::QueryTabGroups));
    }

    #[test]
    fn test_capture_empty_session() {
        let mut browser = FakeBrowser::new();
        browser.tabs = vec![ungrouped_tab(1, 0, "chrome://newtab/")];

        let snapshot = block_on(capture(&browser)).unwrap();

        assert_eq!(snapshot.meta.tab_count, 0);
        assert!(snapshot.groups.is_empty());
    }

    #[test]
    fn test_capture_skips_restricted_tabs() {
        let mut browser = FakeBrowser::new();
        browser.tabs = vec![
            ungrouped_tab(1, 0, "chrome://settings"),
            ungrouped_tab(2, 1, "chrome-extension://abc/options.html"),
            ungrouped_tab(3, 2, "https://docs.rs"),
            BrowserTab {
                url: None,
                ..ungrouped_tab(4, 3, "")
            },
        ];

        let snapshot = block_on(capture(&browser)).unwrap();

        assert_eq!(snapshot.meta.tab_count, 1);
        assert_eq!(snapshot.groups[0].tabs[0].url, "https://docs.rs");
    }

    #[test]
    fn test_capture_sorts_by_index() {
        let mut browser = FakeBrowser::new();
        browser.tab_groups = vec![browser_group(10, "Work", GroupColor::Blue)];
        browser.tabs = vec![
            browser_tab(1, 5, "https://c.com", 10),
            browser_tab(2, 3, "https://a.com", 10),
            browser_tab(3, 4, "https://b.com", 10),
        ];

        let snapshot = block_on(capture(&browser)).unwrap();
        let orders: Vec<i32> = snapshot.groups[0].tabs.iter().map(|t| t.order).collect();

        assert_eq!(orders, vec![3, 4, 5]);
    }

    #[test]
    fn test_capture_defaults() {
        let mut browser = FakeBrowser::new();
        browser.tab_groups = vec![browser_group(10, "  ", GroupColor::Red)];
        browser.tabs = vec![BrowserTab {
            id: None,
            title: None,
            ..browser_tab(0, 0, "https://a.com", 10)
        }];

        let snapshot = block_on(capture(&browser)).unwrap();
        let group = &snapshot.groups[0];

        assert_eq!(group.title, UNTITLED_GROUP);
        assert_eq!(group.tabs[0].title.as_deref(), Some(UNTITLED_TAB));
        assert!(!group.tabs[0].id.is_empty());
    }

    #[test]
    fn test_tab_in_unknown_group_is_ungrouped() {
        let mut browser = FakeBrowser::new();
        browser.tabs = vec![browser_tab(1, 0, "https://a.com", 77)];

        let snapshot = block_on(capture(&browser)).unwrap();

        assert_eq!(snapshot.groups.len(), 1);
        assert!(snapshot.groups[0].id.is_ungrouped());
    }

    #[test]
    fn test_capture_fails_as_a_whole() {
        let mut browser = FakeBrowser::new();
        browser.tabs = vec![ungrouped_tab(1, 0, "https://a.com")];
        browser.fail_queries = true;

        let result = block_on(capture(&browser));

        assert!(matches!(result, Err(Error::Platform(_))));
    }
}
