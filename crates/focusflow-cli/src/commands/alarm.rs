use clap::Subcommand;
use serde::Serialize;

use focusflow_core::timetable::parse_hhmm;

use super::{open_app, print_event};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Set the alarm to a 24-hour HH:MM time
    Set {
        /// Alarm time, e.g. "07:30"
        time: String,
    },
    /// Remove the alarm entirely
    Clear,
    /// Stop ringing and disable until re-set
    Dismiss,
    /// Print the current alarm state as JSON
    Status,
}

#[derive(Serialize)]
struct AlarmStatus {
    set: bool,
    ringing: bool,
    display: Option<String>,
}

pub fn run(action: AlarmAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app()?;

    match action {
        AlarmAction::Set { time } => {
            let (hour, minute) = parse_hhmm(&time)?;
            let event = app.set_alarm(hour, minute)?;
            print_event(&event)?;
        }
        AlarmAction::Clear => {
            if let Some(event) = app.clear_alarm() {
                print_event(&event)?;
            } else {
                println!("no alarm set");
            }
        }
        AlarmAction::Dismiss => {
            if let Some(event) = app.dismiss_alarm() {
                print_event(&event)?;
            } else {
                println!("no alarm set");
            }
        }
        AlarmAction::Status => {
            let alarm = app.alarm();
            let status = AlarmStatus {
                set: alarm.is_set(),
                ringing: alarm.is_ringing(),
                display: alarm.formatted(),
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
