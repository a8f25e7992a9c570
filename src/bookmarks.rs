/// Tab group bookmarks: named, colored URL lists kept under the `groups` key

use crate::browser::{Browser, CreateTab, GroupUpdate, WINDOW_ID_CURRENT, is_restricted_url};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::storage::{Storage, Store};
use crate::tab_data::{GroupColor, TabGroup, TabUrl, new_id};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroup {
    pub group_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddUrl {
    pub group_id: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

pub struct BookmarkRepository<'a, S: Store + ?Sized, C: Clock + ?Sized> {
    storage: Storage<'a, S>,
    clock: &'a C,
}

impl<'a, S: Store + ?Sized, C: Clock + ?Sized> BookmarkRepository<'a, S, C> {
    pub fn new(store: &'a S, clock: &'a C) -> Self {
        BookmarkRepository {
            storage: Storage::new(store),
            clock,
        }
    }

    pub async fn list(&self) -> Result<Vec<TabGroup>> {
        self.storage.groups().await
    }

    pub async fn create(&self, input: CreateGroup) -> Result<TabGroup> {
        let name = required_name(&input.name)?;
        let color = match input.color {
            Some(color) => color,
            None => self.storage.settings().await?.default_group_color,
        };

        let now = self.clock.now();
        let group = TabGroup {
            id: new_id(),
            name,
            color,
            urls: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let mut groups = self.storage.groups().await?;
        groups.push(group.clone());
        self.storage.set_groups(&groups).await?;

        info!("Created tab group {} ({})", group.id, group.name);
        Ok(group)
    }

    pub async fn update(&self, input: UpdateGroup) -> Result<TabGroup> {
        let name = input.name.as_deref().map(required_name).transpose()?;
        let now = self.clock.now();

        let mut groups = self.storage.groups().await?;
        let group = find_group(&mut groups, &input.group_id)?;

        if let Some(name) = name {
            group.name = name;
        }
        if let Some(color) = input.color {
            group.color = color;
        }
        group.updated_at = now;

        let updated = group.clone();
        self.storage.set_groups(&groups).await?;
        Ok(updated)
    }

    /// Remove a group; unknown ids are a no-op
    pub async fn delete(&self, group_id: &str) -> Result<Vec<TabGroup>> {
        let mut groups = self.storage.groups().await?;
        groups.retain(|group| group.id != group_id);
        self.storage.set_groups(&groups).await?;
        Ok(groups)
    }

    pub async fn add_url(&self, input: AddUrl) -> Result<TabUrl> {
        self.insert_url(&input.group_id, input.url, input.title, None).await
    }

    pub async fn remove_url(&self, group_id: &str, url_id: &str) -> Result<Vec<TabGroup>> {
        let now = self.clock.now();
        let mut groups = self.storage.groups().await?;
        let group = find_group(&mut groups, group_id)?;

        group.urls.retain(|url| url.id != url_id);
        group.updated_at = now;

        self.storage.set_groups(&groups).await?;
        Ok(groups)
    }

    /// Save the active tab of the current window into a group
    pub async fn add_current_tab<B: Browser + ?Sized>(
        &self,
        browser: &B,
        group_id: &str,
    ) -> Result<TabUrl> {
        let tab = browser
            .active_tab()
            .await?
            .ok_or_else(|| Error::not_found("no active tab"))?;
        let url = tab
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::not_found("active tab has no url"))?;

        if is_restricted_url(&url) {
            return Err(Error::validation(format!("{} cannot be saved", url)));
        }

        self.insert_url(group_id, url, tab.title, tab.fav_icon_url).await
    }

    /// Open every URL of a group as one browser tab-group in the current window
    pub async fn open<B: Browser + ?Sized>(&self, browser: &B, group_id: &str) -> Result<i32> {
        let mut group = self
            .storage
            .groups()
            .await?
            .into_iter()
            .find(|group| group.id == group_id)
            .ok_or_else(|| Error::not_found(format!("group {}", group_id)))?;

        if group.urls.is_empty() {
            return Err(Error::validation(format!("group {} has no urls", group.name)));
        }
        group.urls.sort_by_key(|url| url.order);

        let mut tab_ids = Vec::with_capacity(group.urls.len());
        for url in &group.urls {
            let tab = browser
                .create_tab(CreateTab {
                    window_id: WINDOW_ID_CURRENT,
                    url: url.url.clone(),
                    active: false,
                })
                .await?;
            tab_ids.extend(tab.id);
        }

        let tab_group_id = browser.group_tabs(&tab_ids, WINDOW_ID_CURRENT).await?;
        browser
            .update_tab_group(
                tab_group_id,
                GroupUpdate {
                    title: Some(group.name.clone()),
                    color: Some(GroupColor::from_hex(&group.color)),
                    collapsed: None,
                },
            )
            .await?;

        info!("Opened tab group {} with {} tabs", group.name, tab_ids.len());
        Ok(tab_group_id)
    }

    async fn insert_url(
        &self,
        group_id: &str,
        url: String,
        title: Option<String>,
        favicon: Option<String>,
    ) -> Result<TabUrl> {
        let now = self.clock.now();
        let mut groups = self.storage.groups().await?;
        let group = find_group(&mut groups, group_id)?;

        if group.urls.iter().any(|existing| existing.url == url) {
            return Err(Error::validation(format!("{} is already in this group", url)));
        }

        let tab_url = TabUrl {
            id: new_id(),
            url,
            title,
            favicon,
            group_id: group.id.clone(),
            order: group.urls.len() as i32,
        };
        group.urls.push(tab_url.clone());
        group.updated_at = now;

        self.storage.set_groups(&groups).await?;
        Ok(tab_url)
    }
}

fn required_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("group name required"));
    }
    Ok(name.to_string())
}

fn find_group<'g>(groups: &'g mut [TabGroup], group_id: &str) -> Result<&'g mut TabGroup> {
    groups
        .iter_mut()
        .find(|group| group.id == group_id)
        .ok_or_else(|| Error::not_found(format!("group {}", group_id)))
}
