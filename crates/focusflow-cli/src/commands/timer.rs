use chrono::Local;
use clap::Subcommand;
use serde::Serialize;

use focusflow_core::SessionKind;

use super::{open_app, print_event};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the countdown for the current session
    Start,
    /// Pause, preserving the remaining time
    Pause,
    /// Stop and restore the full session duration
    Reset,
    /// Abandon the current session and advance to the next
    Skip,
    /// Print the current timer state as JSON
    Status,
}

#[derive(Serialize)]
struct TimerStatus {
    session: SessionKind,
    remaining: String,
    seconds_remaining: u32,
    running: bool,
    focus_cycle: u32,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app()?;

    match action {
        TimerAction::Start => {
            if let Some(event) = app.start_timer() {
                print_event(&event)?;
            } else {
                println!("timer already running");
            }
        }
        TimerAction::Pause => {
            if let Some(event) = app.pause_timer() {
                print_event(&event)?;
            } else {
                println!("timer not running");
            }
        }
        TimerAction::Reset => {
            let event = app.reset_timer();
            print_event(&event)?;
        }
        TimerAction::Skip => {
            let event = app.skip_timer(Local::now());
            print_event(&event)?;
        }
        TimerAction::Status => {
            let timer = app.timer();
            let status = TimerStatus {
                session: timer.session(),
                remaining: timer.format_remaining(),
                seconds_remaining: timer.seconds_remaining(),
                running: timer.is_running(),
                focus_cycle: timer.focus_cycle(),
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
