use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::SessionKind;

/// Every observable state change produces an Event.
/// The CLI prints them as JSON; tests assert on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        session: SessionKind,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        session: SessionKind,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    /// End-of-session transition, whether reached naturally or via skip.
    SessionAdvanced {
        completed: SessionKind,
        next: SessionKind,
        focus_cycle: u32,
        auto_started: bool,
        at: DateTime<Utc>,
    },
    AlarmScheduled {
        hour: u32,
        minute: u32,
        at: DateTime<Utc>,
    },
    AlarmFired {
        hour: u32,
        minute: u32,
        at: DateTime<Utc>,
    },
    AlarmDismissed {
        at: DateTime<Utc>,
    },
    AlarmCleared {
        at: DateTime<Utc>,
    },
    EntryAdded {
        entry_id: String,
        subject: String,
        at: DateTime<Utc>,
    },
    EntryRemoved {
        entry_id: String,
        at: DateTime<Utc>,
    },
    /// A timetable entry's start time was reached today.
    EntryDue {
        entry_id: String,
        subject: String,
        start_time: String,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        at: DateTime<Utc>,
    },
}
