use clap::Subcommand;

use focusflow_core::{SettingsPatch, Theme};

use super::{open_app, print_event};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print all settings as JSON
    Show,
    /// Print a single setting value
    Get { key: String },
    /// Update a single setting
    Set { key: String, value: String },
    /// Restore the default settings
    Reset,
}

fn patch_for(key: &str, value: &str) -> Result<SettingsPatch, Box<dyn std::error::Error>> {
    let mut patch = SettingsPatch::default();
    match key {
        "focus_duration" => patch.focus_duration = Some(value.parse()?),
        "short_break_duration" => patch.short_break_duration = Some(value.parse()?),
        "long_break_duration" => patch.long_break_duration = Some(value.parse()?),
        "long_break_interval" => patch.long_break_interval = Some(value.parse()?),
        "is_muted" => patch.is_muted = Some(value.parse()?),
        "auto_start_breaks" => patch.auto_start_breaks = Some(value.parse()?),
        "auto_start_focus" => patch.auto_start_focus = Some(value.parse()?),
        "theme" => patch.theme = Some(value.parse::<Theme>()?),
        other => return Err(format!("unknown config key: {other}").into()),
    }
    Ok(patch)
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app()?;

    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(app.settings())?);
        }
        ConfigAction::Get { key } => {
            let json = serde_json::to_value(app.settings())?;
            match json.get(&key) {
                Some(serde_json::Value::String(s)) => println!("{s}"),
                Some(other) => println!("{other}"),
                None => return Err(format!("unknown config key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let patch = patch_for(&key, &value)?;
            let event = app.update_settings(&patch)?;
            print_event(&event)?;
        }
        ConfigAction::Reset => {
            let event = app.reset_settings();
            print_event(&event)?;
        }
    }
    Ok(())
}
