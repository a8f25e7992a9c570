/// User settings persisted under the `settings` key
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_GROUP_COLOR: &str = "#4285f4";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub theme: Theme,
    pub auto_open_new_tabs: bool,
    pub default_group_color: String,
    /// Keys written by other versions of the options page
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            theme: Theme::Light,
            auto_open_new_tabs: false,
            default_group_color: DEFAULT_GROUP_COLOR.to_string(),
            extra: Map::new(),
        }
    }
}
