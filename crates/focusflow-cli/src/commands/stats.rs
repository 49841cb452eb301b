use chrono::Local;
use clap::Subcommand;
use serde::Serialize;

use super::open_app;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Print the full stats document as JSON
    Show,
    /// Today's completed sessions and the current streak
    Today,
}

#[derive(Serialize)]
struct TodayStats {
    date: String,
    completed_sessions: u32,
    streak: u32,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app()?;
    let stats = app.stats();

    match action {
        StatsAction::Show => {
            println!("{}", serde_json::to_string_pretty(stats)?);
        }
        StatsAction::Today => {
            let today = Local::now().date_naive();
            let summary = TodayStats {
                date: today.to_string(),
                completed_sessions: stats.today(today).completed_sessions,
                streak: stats.streak,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
