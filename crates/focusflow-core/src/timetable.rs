//! Weekly study timetable and its reminder scheduler.
//!
//! The entry collection is the JSON array persisted under the `timetable`
//! key, kept sorted by (weekday index, start time) after every insertion.
//! Entries are immutable once created; the only mutation is deletion by id.
//!
//! [`TimetableScheduler`] is polled every 60 real-time seconds (plus once
//! at startup) and fires each entry at most once per calendar day.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;

pub const TIMETABLE_KEY: &str = "timetable";

/// Day of the week, Monday-first like the timetable grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    /// 0 = Monday .. 6 = Sunday.
    pub fn index(self) -> u32 {
        match self {
            Day::Monday => 0,
            Day::Tuesday => 1,
            Day::Wednesday => 2,
            Day::Thursday => 3,
            Day::Friday => 4,
            Day::Saturday => 5,
            Day::Sunday => 6,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => Day::Monday,
            Weekday::Tue => Day::Tuesday,
            Weekday::Wed => Day::Wednesday,
            Weekday::Thu => Day::Thursday,
            Weekday::Fri => Day::Friday,
            Weekday::Sat => Day::Saturday,
            Weekday::Sun => Day::Sunday,
        }
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Day {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monday" => Ok(Day::Monday),
            "tuesday" => Ok(Day::Tuesday),
            "wednesday" => Ok(Day::Wednesday),
            "thursday" => Ok(Day::Thursday),
            "friday" => Ok(Day::Friday),
            "saturday" => Ok(Day::Saturday),
            "sunday" => Ok(Day::Sunday),
            _ => Err(ValidationError::InvalidWeekday(s.to_string())),
        }
    }
}

/// One scheduled study slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: String,
    pub subject: String,
    pub day: Day,
    /// Zero-padded "HH:MM".
    pub start_time: String,
    pub end_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Parse a zero-padded "HH:MM" time-of-day string.
///
/// # Errors
/// Rejects anything that is not a valid 24-hour clock time.
pub fn parse_hhmm(s: &str) -> Result<(u32, u32), ValidationError> {
    let invalid = || ValidationError::InvalidTimeFormat(s.to_string());
    let (h, m) = s.split_once(':').ok_or_else(invalid)?;
    if h.len() != 2 || m.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

fn minutes_of_day(hhmm: &str) -> u32 {
    // Entries are validated on insertion; unparseable times sort first.
    parse_hhmm(hhmm).map(|(h, m)| h * 60 + m).unwrap_or(0)
}

/// Ordered entry collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timetable {
    entries: Vec<TimetableEntry>,
}

impl Timetable {
    pub fn entries(&self) -> &[TimetableEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert a new entry and re-sort the collection.
    ///
    /// # Errors
    /// Rejects an empty subject and malformed start/end times.
    pub fn add(
        &mut self,
        subject: &str,
        day: Day,
        start_time: &str,
        end_time: &str,
        notes: Option<String>,
    ) -> Result<Event, ValidationError> {
        if subject.trim().is_empty() {
            return Err(ValidationError::EmptyField("subject"));
        }
        parse_hhmm(start_time)?;
        parse_hhmm(end_time)?;
        let entry = TimetableEntry {
            id: uuid::Uuid::new_v4().to_string(),
            subject: subject.trim().to_string(),
            day,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            notes,
        };
        let event = Event::EntryAdded {
            entry_id: entry.id.clone(),
            subject: entry.subject.clone(),
            at: Utc::now(),
        };
        self.entries.push(entry);
        self.entries
            .sort_by_key(|e| (e.day.index(), minutes_of_day(&e.start_time)));
        Ok(event)
    }

    /// Delete an entry by id. Returns the removal event, or `None` when no
    /// entry matched.
    pub fn remove(&mut self, id: &str) -> Option<Event> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        (self.entries.len() < before).then(|| Event::EntryRemoved {
            entry_id: id.to_string(),
            at: Utc::now(),
        })
    }
}

/// Fires a reminder for each entry whose start time is reached today.
///
/// "Already notified" marks are keyed by (entry id, date), so a day
/// rollover implicitly re-arms every entry. There is no catch-up: a scan
/// that skips past a scheduled minute simply misses that occurrence.
#[derive(Debug, Default)]
pub struct TimetableScheduler {
    notified: HashSet<(String, NaiveDate)>,
}

impl TimetableScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan all entries against the current wall-clock minute.
    pub fn check(&mut self, timetable: &Timetable, now: DateTime<Local>) -> Vec<Event> {
        let today = now.date_naive();
        let day = Day::from_weekday(now.weekday());
        // Marks from previous days are never consulted again.
        self.notified.retain(|(_, date)| *date == today);

        let mut due = Vec::new();
        for entry in timetable.entries() {
            if entry.day != day {
                continue;
            }
            let Ok((hour, minute)) = parse_hhmm(&entry.start_time) else {
                continue;
            };
            if hour != now.hour() || minute != now.minute() {
                continue;
            }
            if !self.notified.insert((entry.id.clone(), today)) {
                continue;
            }
            due.push(Event::EntryDue {
                entry_id: entry.id.clone(),
                subject: entry.subject.clone(),
                start_time: entry.start_time.clone(),
                at: Utc::now(),
            });
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(date: (i32, u32, u32), h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(date.0, date.1, date.2, h, m, 30).unwrap()
    }

    // 2026-03-09 is a Monday.
    const MONDAY: (i32, u32, u32) = (2026, 3, 9);
    const TUESDAY: (i32, u32, u32) = (2026, 3, 10);

    #[test]
    fn entries_sort_by_day_then_start_time() {
        let mut tt = Timetable::default();
        tt.add("Chemistry", Day::Wednesday, "09:00", "10:00", None).unwrap();
        tt.add("Maths", Day::Monday, "14:00", "15:30", None).unwrap();
        tt.add("Physics", Day::Monday, "08:15", "09:45", None).unwrap();
        tt.add("History", Day::Sunday, "07:00", "08:00", None).unwrap();
        let order: Vec<&str> = tt.entries().iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(order, ["Physics", "Maths", "Chemistry", "History"]);
    }

    #[test]
    fn add_validates_subject_and_times() {
        let mut tt = Timetable::default();
        assert!(tt.add("  ", Day::Monday, "09:00", "10:00", None).is_err());
        assert!(tt.add("Maths", Day::Monday, "9:00", "10:00", None).is_err());
        assert!(tt.add("Maths", Day::Monday, "09:00", "24:00", None).is_err());
        assert!(tt.add("Maths", Day::Monday, "09:00", "10:00", None).is_ok());
    }

    #[test]
    fn remove_by_id() {
        let mut tt = Timetable::default();
        tt.add("Maths", Day::Monday, "09:00", "10:00", None).unwrap();
        let id = tt.entries()[0].id.clone();
        assert!(tt.remove("no-such-id").is_none());
        assert!(tt.remove(&id).is_some());
        assert!(tt.is_empty());
    }

    #[test]
    fn fires_once_per_entry_per_day() {
        let mut tt = Timetable::default();
        tt.add("Maths", Day::Monday, "14:00", "15:00", None).unwrap();
        let mut scheduler = TimetableScheduler::new();

        assert_eq!(scheduler.check(&tt, at(MONDAY, 13, 59)).len(), 0);
        assert_eq!(scheduler.check(&tt, at(MONDAY, 14, 0)).len(), 1);
        // Same minute scanned again: no duplicate.
        assert_eq!(scheduler.check(&tt, at(MONDAY, 14, 0)).len(), 0);
        assert_eq!(scheduler.check(&tt, at(MONDAY, 14, 1)).len(), 0);
    }

    #[test]
    fn wrong_day_never_fires() {
        let mut tt = Timetable::default();
        tt.add("Maths", Day::Monday, "14:00", "15:00", None).unwrap();
        let mut scheduler = TimetableScheduler::new();
        assert_eq!(scheduler.check(&tt, at(TUESDAY, 14, 0)).len(), 0);
    }

    #[test]
    fn day_rollover_rearms_entries() {
        let mut tt = Timetable::default();
        tt.add("Daily standup", Day::Monday, "09:00", "09:15", None).unwrap();
        tt.add("Same slot", Day::Tuesday, "09:00", "09:15", None).unwrap();
        let mut scheduler = TimetableScheduler::new();

        assert_eq!(scheduler.check(&tt, at(MONDAY, 9, 0)).len(), 1);
        // Next day, the Tuesday entry fires fresh.
        let due = scheduler.check(&tt, at(TUESDAY, 9, 0));
        assert_eq!(due.len(), 1);
        match &due[0] {
            Event::EntryDue { subject, .. } => assert_eq!(subject, "Same slot"),
            other => panic!("expected EntryDue, got {other:?}"),
        }
    }

    #[test]
    fn two_entries_same_minute_both_fire() {
        let mut tt = Timetable::default();
        tt.add("Maths", Day::Monday, "14:00", "15:00", None).unwrap();
        tt.add("Revision", Day::Monday, "14:00", "14:30", None).unwrap();
        let mut scheduler = TimetableScheduler::new();
        assert_eq!(scheduler.check(&tt, at(MONDAY, 14, 0)).len(), 2);
    }

    #[test]
    fn parse_hhmm_rejects_loose_formats() {
        assert!(parse_hhmm("09:00").is_ok());
        assert!(parse_hhmm("23:59").is_ok());
        assert!(parse_hhmm("9:00").is_err());
        assert!(parse_hhmm("09:0").is_err());
        assert!(parse_hhmm("0900").is_err());
        assert!(parse_hhmm("ab:cd").is_err());
        assert!(parse_hhmm("24:00").is_err());
    }

    #[test]
    fn day_round_trips_through_json_as_full_name() {
        let json = serde_json::to_string(&Day::Wednesday).unwrap();
        assert_eq!(json, "\"Wednesday\"");
        let day: Day = serde_json::from_str(&json).unwrap();
        assert_eq!(day, Day::Wednesday);
    }
}
