/// Profile repository: save, list, find and delete over the `profiles` collection

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::storage::{Storage, Store};
use crate::tab_data::{Profile, ProfileGroup, ProfileSummary, new_id};
use chrono::Duration;
use log::info;
use serde::{Deserialize, Serialize};

/// Input of a save: a new profile when `profile_id` is absent, a full replace otherwise
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfile {
    #[serde(default)]
    pub profile_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub groups: Vec<ProfileGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileList {
    pub profiles: Vec<Profile>,
    pub summaries: Vec<ProfileSummary>,
}

impl ProfileList {
    fn from_profiles(profiles: Vec<Profile>) -> Self {
        let summaries = profiles.iter().map(Profile::summary).collect();
        ProfileList { profiles, summaries }
    }
}

pub struct ProfileRepository<'a, S: Store + ?Sized, C: Clock + ?Sized> {
    storage: Storage<'a, S>,
    clock: &'a C,
}

impl<'a, S: Store + ?Sized, C: Clock + ?Sized> ProfileRepository<'a, S, C> {
    pub fn new(store: &'a S, clock: &'a C) -> Self {
        ProfileRepository {
            storage: Storage::new(store),
            clock,
        }
    }

    pub async fn list(&self) -> Result<ProfileList> {
        Ok(ProfileList::from_profiles(self.storage.profiles().await?))
    }

    pub async fn find(&self, profile_id: &str) -> Result<Profile> {
        self.storage
            .find_profile(profile_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("profile {}", profile_id)))
    }

    pub async fn save(&self, input: SaveProfile) -> Result<ProfileList> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("profile name required"));
        }

        let mut groups = input.groups;
        groups.iter_mut().for_each(ProfileGroup::sanitize);

        let mut profiles = self.storage.profiles().await?;
        let now = self.clock.now();

        match input.profile_id.filter(|id| !id.trim().is_empty()) {
            Some(profile_id) => {
                let profile = profiles
                    .iter_mut()
                    .find(|profile| profile.id == profile_id)
                    .ok_or_else(|| Error::not_found(format!("profile {}", profile_id)))?;

                // updatedAt must move forward even when the clock has not
                let updated_at = if now > profile.updated_at {
                    now
                } else {
                    profile.updated_at + Duration::milliseconds(1)
                };

                profile.name = name;
                profile.description = input.description;
                profile.groups = groups;
                profile.updated_at = updated_at;

                info!("Updated profile {}", profile_id);
            }
            None => {
                let profile = Profile {
                    id: new_id(),
                    name,
                    description: input.description,
                    groups,
                    created_at: now,
                    updated_at: now,
                };

                info!("Created profile {} ({})", profile.id, profile.name);
                profiles.push(profile);
            }
        }

        self.storage.set_profiles(&profiles).await?;
        self.list().await
    }

    /// Remove a profile; unknown ids are a no-op
    pub async fn delete(&self, profile_id: &str) -> Result<ProfileList> {
        if profile_id.trim().is_empty() {
            return Err(Error::validation("profile id required"));
        }

        let mut profiles = self.storage.profiles().await?;
        let original_len = profiles.len();
        profiles.retain(|profile| profile.id != profile_id);

        if profiles.len() < original_len {
            info!("Deleted profile {}", profile_id);
        }

        self.storage.set_profiles(&profiles).await?;
        self.list().await
    }
}
