pub mod alarm;
pub mod config;
pub mod stats;
pub mod timer;
pub mod timetable;
pub mod watch;

use chrono::Local;
use focusflow_core::{DesktopGateway, Event, FocusFlow, Store, TonePlayer};

pub type App = FocusFlow<DesktopGateway, TonePlayer>;

/// Open the shared store and assemble the application.
pub fn open_app() -> Result<App, Box<dyn std::error::Error>> {
    let store = Store::open()?;
    Ok(FocusFlow::new(
        store,
        DesktopGateway::new(false),
        TonePlayer::new(),
        Local::now(),
    ))
}

pub fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}
