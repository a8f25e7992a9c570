/// Export and import of the whole persisted document
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::settings::AppSettings;
use crate::storage::{Storage, Store};
use crate::tab_data::{Profile, TabGroup};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EXPORT_VERSION: &str = "1.1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub groups: Vec<TabGroup>,
    pub settings: AppSettings,
    pub profiles: Vec<Profile>,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub success: bool,
    pub imported_groups: usize,
    pub imported_profiles: usize,
}

pub async fn export_data<S: Store + ?Sized, C: Clock + ?Sized>(
    store: &S,
    clock: &C,
) -> Result<ExportBundle> {
    let storage = Storage::new(store);

    Ok(ExportBundle {
        groups: storage.groups().await?,
        settings: storage.settings().await?,
        profiles: storage.profiles().await?,
        exported_at: clock.now(),
        version: EXPORT_VERSION.to_string(),
    })
}

/// Replace stored collections with an exported document.
///
/// `groups` must be present; `settings` and `profiles` are only written when
/// supplied. Everything is decoded before the first write.
pub async fn import_data<S: Store + ?Sized>(store: &S, payload: Value) -> Result<ImportSummary> {
    let Value::Object(mut data) = payload else {
        return Err(Error::validation("invalid data format: expected an object"));
    };

    let groups: Vec<TabGroup> = match data.remove("groups") {
        Some(groups @ Value::Array(_)) => serde_json::from_value(groups)?,
        _ => return Err(Error::validation("invalid data format: groups missing")),
    };

    let settings: Option<AppSettings> = match data.remove("settings") {
        Some(settings @ Value::Object(_)) => Some(serde_json::from_value(settings)?),
        _ => None,
    };

    let profiles: Option<Vec<Profile>> = match data.remove("profiles") {
        Some(profiles @ Value::Array(_)) => {
            let mut profiles: Vec<Profile> = serde_json::from_value(profiles)?;
            profiles.iter_mut().for_each(Profile::sanitize);
            Some(profiles)
        }
        _ => None,
    };

    let storage = Storage::new(store);
    storage.set_groups(&groups).await?;
    if let Some(settings) = &settings {
        storage.set_settings(settings).await?;
    }
    if let Some(profiles) = &profiles {
        storage.set_profiles(profiles).await?;
    }

    let summary = ImportSummary {
        success: true,
        imported_groups: groups.len(),
        imported_profiles: profiles.as_ref().map_or(0, Vec::len),
    };
    info!(
        "Imported {} groups and {} profiles",
        summary.imported_groups, summary.imported_profiles
    );

    Ok(summary)
}
