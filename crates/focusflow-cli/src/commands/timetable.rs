use clap::Subcommand;

use focusflow_core::Day;

use super::{open_app, print_event};

#[derive(Subcommand)]
pub enum TimetableAction {
    /// Add a study slot
    Add {
        #[arg(long)]
        subject: String,
        /// Weekday name, e.g. "monday"
        #[arg(long)]
        day: Day,
        /// Start time as HH:MM
        #[arg(long)]
        start: String,
        /// End time as HH:MM
        #[arg(long)]
        end: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List all entries in timetable order
    List {
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry by id
    Remove { id: String },
}

pub fn run(action: TimetableAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app()?;

    match action {
        TimetableAction::Add {
            subject,
            day,
            start,
            end,
            notes,
        } => {
            let event = app.add_entry(&subject, day, &start, &end, notes)?;
            print_event(&event)?;
        }
        TimetableAction::List { json } => {
            let entries = app.timetable().entries();
            if json {
                println!("{}", serde_json::to_string_pretty(entries)?);
            } else if entries.is_empty() {
                println!("timetable is empty");
            } else {
                for entry in entries {
                    println!(
                        "{:<9} {}-{}  {:<20} {}",
                        entry.day.to_string(),
                        entry.start_time,
                        entry.end_time,
                        entry.subject,
                        entry.id
                    );
                }
            }
        }
        TimetableAction::Remove { id } => {
            if let Some(event) = app.remove_entry(&id) {
                print_event(&event)?;
            } else {
                println!("no entry with id {id}");
            }
        }
    }
    Ok(())
}
