use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Light
    }
}

/// User preferences, persisted as part of the dashboard snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub sound_enabled: bool,
    pub notifications: bool,
    pub theme: Theme,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            notifications: true,
            theme: Theme::Light,
        }
    }
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub sound_enabled: Option<bool>,
    pub notifications: Option<bool>,
    pub theme: Option<Theme>,
}

impl UserSettings {
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(sound_enabled) = patch.sound_enabled {
            self.sound_enabled = sound_enabled;
        }
        if let Some(notifications) = patch.notifications {
            self.notifications = notifications;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
    }
}
