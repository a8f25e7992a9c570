/// Runtime message surface: requests from the popup/options pages and their responses

use crate::bookmarks::{AddUrl, BookmarkRepository, CreateGroup, UpdateGroup};
use crate::browser::{Browser, BrowserTab};
use crate::clock::Clock;
use crate::context_menu::{self, ContextMenuData, MenuClick};
use crate::error::Result;
use crate::profiles::{ProfileList, ProfileRepository, SaveProfile};
use crate::restore::{RestoreOptions, RestoreOrchestrator, RestoreOutcome};
use crate::settings::AppSettings;
use crate::snapshot::{self, Snapshot};
use crate::storage::{Storage, Store};
use crate::tab_data::{TabGroup, TabUrl};
use crate::transfer::{self, ExportBundle, ImportSummary};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action")]
pub enum Request {
    #[serde(rename = "CAPTURE_CURRENT_STATE")]
    CaptureCurrentState,
    #[serde(rename = "SAVE_PROFILE")]
    SaveProfile { payload: SaveProfile },
    #[serde(rename = "GET_PROFILES")]
    GetProfiles,
    #[serde(rename = "DELETE_PROFILE", rename_all = "camelCase")]
    DeleteProfile { profile_id: String },
    #[serde(rename = "OPEN_PROFILE", rename_all = "camelCase")]
    OpenProfile {
        profile_id: String,
        #[serde(default)]
        options: Option<RestoreOptions>,
    },
    #[serde(rename = "EXPORT_DATA")]
    ExportData,
    #[serde(rename = "IMPORT_DATA")]
    ImportData { payload: Value },
    #[serde(rename = "GET_GROUPS")]
    GetGroups,
    #[serde(rename = "CREATE_GROUP")]
    CreateGroup { payload: CreateGroup },
    #[serde(rename = "UPDATE_GROUP")]
    UpdateGroup { payload: UpdateGroup },
    #[serde(rename = "DELETE_GROUP", rename_all = "camelCase")]
    DeleteGroup { group_id: String },
    #[serde(rename = "ADD_URL_TO_GROUP")]
    AddUrlToGroup { payload: AddUrl },
    #[serde(rename = "REMOVE_URL_FROM_GROUP", rename_all = "camelCase")]
    RemoveUrlFromGroup { group_id: String, url_id: String },
    #[serde(rename = "openTabGroup", rename_all = "camelCase")]
    OpenTabGroup { group_id: String },
    #[serde(rename = "addCurrentTabToGroup", rename_all = "camelCase")]
    AddCurrentTabToGroup { group_id: String },
    #[serde(rename = "GET_SETTINGS")]
    GetSettings,
    #[serde(rename = "UPDATE_SETTINGS")]
    UpdateSettings { payload: AppSettings },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Response {
    Snapshot(Snapshot),
    Profiles(ProfileList),
    Restore(RestoreOutcome),
    Export(ExportBundle),
    Import(ImportSummary),
    Groups { groups: Vec<TabGroup> },
    Group { group: TabGroup },
    Url { url: TabUrl },
    #[serde(rename_all = "camelCase")]
    TabGroupOpened { tab_group_id: i32 },
    Settings { settings: AppSettings },
}

/// Routes requests to the components, owning the platform seams
pub struct Background<S, B, C> {
    store: S,
    browser: B,
    clock: C,
}

impl<S: Store, B: Browser, C: Clock> Background<S, B, C> {
    pub fn new(store: S, browser: B, clock: C) -> Self {
        Background {
            store,
            browser,
            clock,
        }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Seed empty collections and default settings
    pub async fn initialize(&self) -> Result<()> {
        Storage::new(&self.store).initialize().await
    }

    /// Install or update: seed storage, then register the context menu.
    ///
    /// Menu registration fails on update because the id already exists, so it
    /// only logs.
    pub async fn install(&self) -> Result<()> {
        self.initialize().await?;
        if let Err(e) = context_menu::register(&self.browser).await {
            warn!("Could not create context menu: {}", e);
        }
        Ok(())
    }

    pub async fn context_menu_clicked(
        &self,
        click: MenuClick,
        tab: Option<BrowserTab>,
    ) -> Result<Option<ContextMenuData>> {
        context_menu::handle_click(&self.store, &self.browser, &click, tab.as_ref()).await
    }

    pub async fn dispatch(&self, request: Request) -> Result<Response> {
        let profiles = ProfileRepository::new(&self.store, &self.clock);
        let bookmarks = BookmarkRepository::new(&self.store, &self.clock);

        let response = match request {
            Request::CaptureCurrentState => {
                Response::Snapshot(snapshot::capture(&self.browser).await?)
            }
            Request::SaveProfile { payload } => Response::Profiles(profiles.save(payload).await?),
            Request::GetProfiles => Response::Profiles(profiles.list().await?),
            Request::DeleteProfile { profile_id } => {
                Response::Profiles(profiles.delete(&profile_id).await?)
            }
            Request::OpenProfile {
                profile_id,
                options,
            } => Response::Restore(
                RestoreOrchestrator::new(profiles, &self.browser)
                    .restore(&profile_id, options.unwrap_or_default())
                    .await?,
            ),
            Request::ExportData => {
                Response::Export(transfer::export_data(&self.store, &self.clock).await?)
            }
            Request::ImportData { payload } => {
                Response::Import(transfer::import_data(&self.store, payload).await?)
            }
            Request::GetGroups => Response::Groups {
                groups: bookmarks.list().await?,
            },
            Request::CreateGroup { payload } => Response::Group {
                group: bookmarks.create(payload).await?,
            },
            Request::UpdateGroup { payload } => Response::Group {
                group: bookmarks.update(payload).await?,
            },
            Request::DeleteGroup { group_id } => Response::Groups {
                groups: bookmarks.delete(&group_id).await?,
            },
            Request::AddUrlToGroup { payload } => Response::Url {
                url: bookmarks.add_url(payload).await?,
            },
            Request::RemoveUrlFromGroup { group_id, url_id } => Response::Groups {
                groups: bookmarks.remove_url(&group_id, &url_id).await?,
            },
            Request::OpenTabGroup { group_id } => Response::TabGroupOpened {
                tab_group_id: bookmarks.open(&self.browser, &group_id).await?,
            },
            Request::AddCurrentTabToGroup { group_id } => Response::Url {
                url: bookmarks.add_current_tab(&self.browser, &group_id).await?,
            },
            Request::GetSettings => Response::Settings {
                settings: Storage::new(&self.store).settings().await?,
            },
            Request::UpdateSettings { payload } => {
                Storage::new(&self.store).set_settings(&payload).await?;
                Response::Settings { settings: payload }
            }
        };

        Ok(response)
    }

    /// Decode a raw message, dispatch it, and encode the reply.
    ///
    /// Failures of any kind come back as `{ "error": message }`.
    pub async fn handle(&self, message: Value) -> Value {
        let request: Request = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                warn!("Unrecognized message: {}", e);
                return json!({ "error": format!("invalid request: {}", e) });
            }
        };

        debug!("Handling {:?}", request);

        let reply = self
            .dispatch(request)
            .await
            .and_then(|response| Ok(serde_json::to_value(response)?));

        match reply {
            Ok(value) => value,
            Err(e) => {
                warn!("Request failed: {}", e);
                json!({ "error": e.to_string() })
            }
        }
    }
}
