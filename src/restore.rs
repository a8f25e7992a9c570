/// Restore a stored profile into live windows, tabs and tab-groups.
///
/// Tabs are created one at a time, inactive, so their order in the target
/// window is deterministic and the first created tab is unambiguous. Only the
/// profile lookup and the target window resolution can fail the whole call;
/// every per-tab and per-group step is best-effort and lands in the
/// [`RestoreReport`] instead. Nothing already created is ever rolled back.
use crate::browser::{Browser, BrowserTab, CreateTab, GroupUpdate, WINDOW_ID_CURRENT};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::profiles::ProfileRepository;
use crate::storage::Store;
use crate::tab_data::{GroupId, Profile, ProfileGroup, TabEntry};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RestoreOptions {
    pub open_in_new_window: bool,
}

/// Progress of a single restore call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePhase {
    Idle,
    ResolvingTarget,
    CreatingTabs { group_index: usize, tab_index: usize },
    Grouping { group_index: usize },
    Focusing,
    Done,
}

impl RestorePhase {
    /// Whether `next` may directly follow `self`.
    ///
    /// Tab creation walks groups forward only; a group may skip `Grouping`
    /// (ungrouped bucket, or nothing created) and empty groups are skipped.
    pub fn can_advance_to(&self, next: &RestorePhase) -> bool {
        use RestorePhase::*;

        match (*self, *next) {
            (Idle, ResolvingTarget) => true,
            (ResolvingTarget, CreatingTabs { tab_index: 0, .. }) => true,
            (ResolvingTarget, Focusing) => true,
            (
                CreatingTabs { group_index, tab_index },
                CreatingTabs {
                    group_index: next_group,
                    tab_index: next_tab,
                },
            ) => {
                (next_group == group_index && next_tab == tab_index + 1)
                    || (next_group > group_index && next_tab == 0)
            }
            (CreatingTabs { group_index, .. }, Grouping { group_index: next_group }) => {
                next_group == group_index
            }
            (CreatingTabs { .. }, Focusing) => true,
            (
                Grouping { group_index },
                CreatingTabs {
                    group_index: next_group,
                    tab_index: 0,
                },
            ) => next_group > group_index,
            (Grouping { .. }, Focusing) => true,
            (Focusing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RestorePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestorePhase::Idle => write!(f, "idle"),
            RestorePhase::ResolvingTarget => write!(f, "resolving target"),
            RestorePhase::CreatingTabs {
                group_index,
                tab_index,
            } => write!(f, "creating tab {} of group {}", tab_index, group_index),
            RestorePhase::Grouping { group_index } => write!(f, "grouping group {}", group_index),
            RestorePhase::Focusing => write!(f, "focusing"),
            RestorePhase::Done => write!(f, "done"),
        }
    }
}

/// Checked walk through [`RestorePhase`]s, reporting each step to an observer
pub struct RestoreMachine<'o> {
    phase: RestorePhase,
    observer: &'o mut dyn FnMut(RestorePhase),
}

impl<'o> RestoreMachine<'o> {
    pub fn new(observer: &'o mut dyn FnMut(RestorePhase)) -> Self {
        RestoreMachine {
            phase: RestorePhase::Idle,
            observer,
        }
    }

    pub fn phase(&self) -> RestorePhase {
        self.phase
    }

    pub fn advance(&mut self, next: RestorePhase) -> Result<()> {
        if !self.phase.can_advance_to(&next) {
            return Err(Error::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        self.phase = next;
        (self.observer)(next);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RestoreStep {
    CreateTab,
    PinTab,
    GroupTabs,
    ClosePlaceholder,
    Focus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestoredTab {
    pub group_id: GroupId,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestoreFailure {
    pub step: RestoreStep,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub error: String,
}

/// What actually happened, item by item
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub succeeded: Vec<RestoredTab>,
    pub failed: Vec<RestoreFailure>,
    pub grouped_count: usize,
}

impl RestoreReport {
    fn fail(
        &mut self,
        step: RestoreStep,
        group: Option<&ProfileGroup>,
        url: Option<&str>,
        error: Error,
    ) {
        self.failed.push(RestoreFailure {
            step,
            group_id: group.map(|group| group.id.clone()),
            url: url.map(str::to_string),
            error: error.to_string(),
        });
    }
}

/// `restored_tabs` and `restored_groups` are the counts stored in the
/// profile; `report` holds the confirmed outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    pub restored_tabs: usize,
    pub restored_groups: usize,
    pub report: RestoreReport,
}

struct Target {
    window_id: i32,
    placeholder_tab: Option<i32>,
}

pub struct RestoreOrchestrator<'a, S: Store + ?Sized, C: Clock + ?Sized, B: Browser + ?Sized> {
    profiles: ProfileRepository<'a, S, C>,
    browser: &'a B,
}

impl<'a, S, C, B> RestoreOrchestrator<'a, S, C, B>
where
    S: Store + ?Sized,
    C: Clock + ?Sized,
    B: Browser + ?Sized,
{
    pub fn new(profiles: ProfileRepository<'a, S, C>, browser: &'a B) -> Self {
        RestoreOrchestrator { profiles, browser }
    }

    pub async fn restore(
        &self,
        profile_id: &str,
        options: RestoreOptions,
    ) -> Result<RestoreOutcome> {
        self.restore_observed(profile_id, options, &mut |_: RestorePhase| {}).await
    }

    /// Like [`restore`](Self::restore), calling `observer` on every phase change
    pub async fn restore_observed(
        &self,
        profile_id: &str,
        options: RestoreOptions,
        observer: &mut dyn FnMut(RestorePhase),
    ) -> Result<RestoreOutcome> {
        let profile = self.profiles.find(profile_id).await?;

        let total_tabs = profile.tab_count();
        if total_tabs == 0 {
            return Ok(RestoreOutcome::default());
        }

        let mut machine = RestoreMachine::new(observer);
        machine.advance(RestorePhase::ResolvingTarget)?;
        let target = self.resolve_target(options).await?;

        info!(
            "Restoring profile {} ({} tabs) into window {}",
            profile.id, total_tabs, target.window_id
        );

        let report = self.restore_groups(&profile, &target, &mut machine).await?;

        info!(
            "Restored {}/{} tabs of profile {}, {} failures",
            report.succeeded.len(),
            total_tabs,
            profile.id,
            report.failed.len()
        );

        Ok(RestoreOutcome {
            restored_tabs: total_tabs,
            restored_groups: profile.groups.len(),
            report,
        })
    }

    async fn resolve_target(&self, options: RestoreOptions) -> Result<Target> {
        if options.open_in_new_window {
            let window = self.browser.create_window().await?;
            return Ok(Target {
                window_id: window.id,
                placeholder_tab: window.tabs.first().and_then(|tab| tab.id),
            });
        }

        let window_id = self
            .browser
            .normal_windows()
            .await?
            .first()
            .map(|window| window.id)
            .unwrap_or(WINDOW_ID_CURRENT);

        Ok(Target {
            window_id,
            placeholder_tab: None,
        })
    }

    async fn restore_groups(
        &self,
        profile: &Profile,
        target: &Target,
        machine: &mut RestoreMachine<'_>,
    ) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();
        let mut first_tab: Option<i32> = None;

        for (group_index, group) in profile.groups.iter().enumerate() {
            let mut tabs: Vec<&TabEntry> = group.tabs.iter().collect();
            tabs.sort_by_key(|tab| tab.order);

            if tabs.is_empty() {
                continue;
            }

            let mut created: Vec<i32> = Vec::new();
            for (tab_index, tab) in tabs.into_iter().enumerate() {
                machine.advance(RestorePhase::CreatingTabs {
                    group_index,
                    tab_index,
                })?;

                match self.create_tab(target.window_id, tab).await {
                    Ok(browser_tab) => {
                        if let Some(tab_id) = browser_tab.id {
                            first_tab.get_or_insert(tab_id);
                            created.push(tab_id);

                            if tab.is_pinned() {
                                if let Err(e) = self.browser.set_tab_pinned(tab_id, true).await {
                                    warn!("Could not pin restored tab {}: {}", tab.url, e);
                                    report.fail(
                                        RestoreStep::PinTab,
                                        Some(group),
                                        Some(tab.url.as_str()),
                                        e,
                                    );
                                }
                            }
                        }
                        report.succeeded.push(RestoredTab {
                            group_id: group.id.clone(),
                            url: tab.url.clone(),
                            tab_id: browser_tab.id,
                        });
                    }
                    Err(e) => {
                        warn!("Could not restore tab {}: {}", tab.url, e);
                        report.fail(
                            RestoreStep::CreateTab,
                            Some(group),
                            Some(tab.url.as_str()),
                            e,
                        );
                    }
                }
            }

            if group.id.is_ungrouped() || created.is_empty() {
                continue;
            }

            machine.advance(RestorePhase::Grouping { group_index })?;
            match self.group_tabs(group, &created, target.window_id).await {
                Ok(()) => report.grouped_count += 1,
                Err(e) => {
                    warn!("Could not group restored tabs of {}: {}", group.title, e);
                    report.fail(RestoreStep::GroupTabs, Some(group), None, e);
                }
            }
        }

        machine.advance(RestorePhase::Focusing)?;
        self.focus(target, first_tab, &mut report).await;
        machine.advance(RestorePhase::Done)?;

        Ok(report)
    }

    async fn create_tab(&self, window_id: i32, tab: &TabEntry) -> Result<BrowserTab> {
        self.browser
            .create_tab(CreateTab {
                window_id,
                url: tab.url.clone(),
                active: false,
            })
            .await
    }

    async fn group_tabs(
        &self,
        group: &ProfileGroup,
        tab_ids: &[i32],
        window_id: i32,
    ) -> Result<()> {
        let group_id = self.browser.group_tabs(tab_ids, window_id).await?;
        debug!("Grouped {} tabs as {} ({})", tab_ids.len(), group.title, group_id);

        self.browser
            .update_tab_group(
                group_id,
                GroupUpdate {
                    title: Some(group.title.clone()),
                    color: Some(group.color.unwrap_or_default()),
                    collapsed: None,
                },
            )
            .await?;

        if let Some(collapsed) = group.collapsed {
            self.browser
                .update_tab_group(
                    group_id,
                    GroupUpdate {
                        collapsed: Some(collapsed),
                        ..GroupUpdate::default()
                    },
                )
                .await?;
        }

        Ok(())
    }

    async fn focus(&self, target: &Target, first_tab: Option<i32>, report: &mut RestoreReport) {
        // closing the placeholder of an otherwise empty window would close the window
        let Some(tab_id) = first_tab else {
            return;
        };

        if let Some(placeholder) = target.placeholder_tab {
            if let Err(e) = self.browser.remove_tab(placeholder).await {
                warn!("Could not close placeholder tab {}: {}", placeholder, e);
                report.fail(RestoreStep::ClosePlaceholder, None, None, e);
            }
        }

        if let Err(e) = self.browser.activate_tab(tab_id).await {
            warn!("Could not activate tab {}: {}", tab_id, e);
            report.fail(RestoreStep::Focus, None, None, e);
            return;
        }
        if let Err(e) = self.browser.focus_window(target.window_id).await {
            warn!("Could not focus window {}: {}", target.window_id, e);
            report.fail(RestoreStep::Focus, None, None, e);
        }
    }
}
