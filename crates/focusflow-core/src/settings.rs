//! User settings.
//!
//! Stored as the JSON document under the `settings` key. Mutated only via
//! partial merge ([`Settings::apply`]) or a full reset.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::SessionKind;

pub const SETTINGS_KEY: &str = "settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl std::str::FromStr for Theme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(ValidationError::InvalidValue {
                field: "theme".into(),
                message: format!("'{other}' is not one of light, dark, system"),
            }),
        }
    }
}

/// Application settings. Durations are in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_focus_duration")]
    pub focus_duration: u32,
    #[serde(default = "default_short_break_duration")]
    pub short_break_duration: u32,
    #[serde(default = "default_long_break_duration")]
    pub long_break_duration: u32,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_focus: bool,
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
}

/// Partial settings update: `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub focus_duration: Option<u32>,
    pub short_break_duration: Option<u32>,
    pub long_break_duration: Option<u32>,
    pub is_muted: Option<bool>,
    pub theme: Option<Theme>,
    pub auto_start_breaks: Option<bool>,
    pub auto_start_focus: Option<bool>,
    pub long_break_interval: Option<u32>,
}

fn default_focus_duration() -> u32 {
    25 * 60
}
fn default_short_break_duration() -> u32 {
    5 * 60
}
fn default_long_break_duration() -> u32 {
    15 * 60
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_duration: default_focus_duration(),
            short_break_duration: default_short_break_duration(),
            long_break_duration: default_long_break_duration(),
            is_muted: false,
            theme: Theme::System,
            auto_start_breaks: true,
            auto_start_focus: false,
            long_break_interval: default_long_break_interval(),
        }
    }
}

impl Settings {
    /// Configured duration (seconds) for a session kind.
    pub fn duration_for(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Focus => self.focus_duration,
            SessionKind::ShortBreak => self.short_break_duration,
            SessionKind::LongBreak => self.long_break_duration,
        }
    }

    /// Merge a validated patch into the current settings.
    ///
    /// # Errors
    /// Rejects zero durations and a zero long-break interval.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Result<(), ValidationError> {
        patch.validate()?;
        let mut next = self.clone();
        if let Some(v) = patch.focus_duration {
            next.focus_duration = v;
        }
        if let Some(v) = patch.short_break_duration {
            next.short_break_duration = v;
        }
        if let Some(v) = patch.long_break_duration {
            next.long_break_duration = v;
        }
        if let Some(v) = patch.is_muted {
            next.is_muted = v;
        }
        if let Some(v) = patch.theme {
            next.theme = v;
        }
        if let Some(v) = patch.auto_start_breaks {
            next.auto_start_breaks = v;
        }
        if let Some(v) = patch.auto_start_focus {
            next.auto_start_focus = v;
        }
        if let Some(v) = patch.long_break_interval {
            next.long_break_interval = v;
        }
        *self = next;
        Ok(())
    }
}

impl SettingsPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        let durations = [
            ("focus_duration", self.focus_duration),
            ("short_break_duration", self.short_break_duration),
            ("long_break_duration", self.long_break_duration),
            ("long_break_interval", self.long_break_interval),
        ];
        for (field, value) in durations {
            if value == Some(0) {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    message: "must be a positive integer".into(),
                });
            }
        }
        Ok(())
    }
}
