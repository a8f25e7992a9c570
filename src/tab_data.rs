/// Data structures for profiles and tab group bookmarks
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Id of the synthetic bucket holding tabs outside any browser tab-group
pub const UNGROUPED_ID: &str = "ungrouped";

/// Generate a fresh id for a profile, group or tab
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Read an absent or `null` id as blank so `sanitize` can backfill it
fn blank_if_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// The browser's fixed tab-group palette
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Grey,
    #[default]
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

impl GroupColor {
    /// Map a bookmark hex color onto the palette, falling back to blue
    pub fn from_hex(hex: &str) -> GroupColor {
        match hex.trim().to_ascii_lowercase().as_str() {
            "#808080" => GroupColor::Grey,
            "#4285f4" => GroupColor::Blue,
            "#ea4335" => GroupColor::Red,
            "#fbbc04" => GroupColor::Yellow,
            "#34a853" => GroupColor::Green,
            "#ff6b9d" => GroupColor::Pink,
            "#9c27b0" => GroupColor::Purple,
            "#00bcd4" => GroupColor::Cyan,
            "#ff9800" => GroupColor::Orange,
            _ => GroupColor::Blue,
        }
    }
}

/// Identity of a profile group.
///
/// Serialized as a plain string so stored profiles keep the `"ungrouped"`
/// sentinel on the wire, while code matches on the variant instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GroupId {
    Ungrouped,
    Tagged(String),
}

impl GroupId {
    pub fn tagged(id: impl Into<String>) -> GroupId {
        GroupId::Tagged(id.into())
    }

    pub fn is_ungrouped(&self) -> bool {
        matches!(self, GroupId::Ungrouped)
    }

    /// True for a tagged id that was never assigned
    pub fn is_missing(&self) -> bool {
        matches!(self, GroupId::Tagged(id) if id.trim().is_empty())
    }

    pub fn as_str(&self) -> &str {
        match self {
            GroupId::Ungrouped => UNGROUPED_ID,
            GroupId::Tagged(id) => id,
        }
    }
}

impl Default for GroupId {
    fn default() -> Self {
        GroupId::Tagged(String::new())
    }
}

impl From<String> for GroupId {
    fn from(id: String) -> Self {
        if id == UNGROUPED_ID {
            GroupId::Ungrouped
        } else {
            GroupId::Tagged(id)
        }
    }
}

impl From<GroupId> for String {
    fn from(id: GroupId) -> Self {
        match id {
            GroupId::Ungrouped => UNGROUPED_ID.to_string(),
            GroupId::Tagged(id) => id,
        }
    }
}

/// A tab captured inside a profile group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabEntry {
    #[serde(default, deserialize_with = "blank_if_null")]
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(default)]
    pub order: i32,
}

impl TabEntry {
    pub fn new(id: &str, url: &str, order: i32) -> TabEntry {
        TabEntry {
            id: id.to_string(),
            url: url.to_string(),
            title: None,
            favicon: None,
            pinned: None,
            order,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.unwrap_or(false)
    }
}

/// A captured set of tabs: a real browser tab-group or the ungrouped bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileGroup {
    #[serde(default, deserialize_with = "blank_if_null")]
    pub id: GroupId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<i32>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<GroupColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    #[serde(default)]
    pub tabs: Vec<TabEntry>,
}

impl ProfileGroup {
    pub fn new(id: GroupId, title: &str) -> ProfileGroup {
        ProfileGroup {
            id,
            window_id: None,
            title: title.to_string(),
            color: None,
            collapsed: None,
            tabs: Vec::new(),
        }
    }

    /// Sort tabs ascending by `order`; ties keep their relative position
    pub fn sort_tabs(&mut self) {
        self.tabs.sort_by_key(|tab| tab.order);
    }

    /// Backfill missing group and tab ids, then re-sort tabs by `order`.
    /// Running it twice changes nothing.
    pub fn sanitize(&mut self) {
        if self.id.is_missing() {
            self.id = GroupId::Tagged(new_id());
        }
        for tab in &mut self.tabs {
            if tab.id.trim().is_empty() {
                tab.id = new_id();
            }
        }
        self.sort_tabs();
    }
}

/// Sum of tab counts across groups
pub fn count_tabs(groups: &[ProfileGroup]) -> usize {
    groups.iter().map(|group| group.tabs.len()).sum()
}

/// A named, persisted snapshot of tab groups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, deserialize_with = "blank_if_null")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub groups: Vec<ProfileGroup>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn tab_count(&self) -> usize {
        count_tabs(&self.groups)
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            group_count: self.groups.len(),
            tab_count: self.tab_count(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Backfill ids on the profile and everything it holds
    pub fn sanitize(&mut self) {
        if self.id.trim().is_empty() {
            self.id = new_id();
        }
        self.groups.iter_mut().for_each(ProfileGroup::sanitize);
    }
}

/// Read-only projection of a profile for listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub group_count: usize,
    pub tab_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bookmarked set of URLs (the `groups` collection)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabGroup {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub urls: Vec<TabUrl>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A URL saved inside a tab group bookmark
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabUrl {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    pub group_id: String,
    #[serde(default)]
    pub order: i32,
}
