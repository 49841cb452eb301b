//! Single daily alarm.
//!
//! At most one alarm exists at a time, persisted under the `alarm` key
//! (absent document = no alarm). The monitor is tick-driven: the caller
//! invokes [`AlarmMonitor::tick`] once per real-time second with the
//! current wall-clock time.

use chrono::{DateTime, Local, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;

pub const ALARM_KEY: &str = "alarm";

/// The persisted alarm document. Ringing implies enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAlarm {
    pub hour: u32,
    pub minute: u32,
    pub is_enabled: bool,
    #[serde(default)]
    pub is_ringing: bool,
}

/// State machine over `{absent, set-and-waiting, ringing, dismissed}`.
#[derive(Debug, Clone, Default)]
pub struct AlarmMonitor {
    alarm: Option<StoredAlarm>,
}

impl AlarmMonitor {
    /// Wrap a loaded alarm document. A document claiming to ring while
    /// disabled is sanitized.
    pub fn new(alarm: Option<StoredAlarm>) -> Self {
        let alarm = alarm.map(|mut a| {
            if !a.is_enabled {
                a.is_ringing = false;
            }
            a
        });
        Self { alarm }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn alarm(&self) -> Option<&StoredAlarm> {
        self.alarm.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.alarm.map(|a| a.is_enabled).unwrap_or(false)
    }

    pub fn is_ringing(&self) -> bool {
        self.alarm.map(|a| a.is_ringing).unwrap_or(false)
    }

    /// 12-hour `HH:MM AM/PM` display. Only an enabled, non-ringing alarm
    /// has a display string.
    pub fn formatted(&self) -> Option<String> {
        let alarm = self.alarm?;
        if !alarm.is_enabled || alarm.is_ringing {
            return None;
        }
        let time = NaiveTime::from_hms_opt(alarm.hour, alarm.minute, 0)?;
        Some(time.format("%I:%M %p").to_string())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Create or overwrite the alarm as enabled and not ringing. Any
    /// active ringing stops (the caller silences the tone).
    ///
    /// # Errors
    /// Rejects an out-of-range hour or minute.
    pub fn set(&mut self, hour: u32, minute: u32) -> Result<Event, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidClockTime { hour, minute });
        }
        self.alarm = Some(StoredAlarm {
            hour,
            minute,
            is_enabled: true,
            is_ringing: false,
        });
        Ok(Event::AlarmScheduled {
            hour,
            minute,
            at: Utc::now(),
        })
    }

    /// Remove the alarm entirely.
    pub fn clear(&mut self) -> Option<Event> {
        self.alarm.take()?;
        Some(Event::AlarmCleared { at: Utc::now() })
    }

    /// Stop ringing and disable. The alarm must be explicitly re-set to
    /// fire again; it does not re-arm for the next day.
    pub fn dismiss(&mut self) -> Option<Event> {
        let alarm = self.alarm.as_mut()?;
        alarm.is_ringing = false;
        alarm.is_enabled = false;
        Some(Event::AlarmDismissed { at: Utc::now() })
    }

    /// One real-time second. Fires when the wall clock matches the alarm's
    /// hour and minute at second zero.
    ///
    /// The exact `second == 0` match is kept deliberately: if that single
    /// tick is missed (process suspended over the boundary), the alarm
    /// silently does not fire that day. Known limitation, not retried.
    pub fn tick(&mut self, now: DateTime<Local>) -> Option<Event> {
        let alarm = self.alarm.as_mut()?;
        if !alarm.is_enabled || alarm.is_ringing {
            return None;
        }
        if now.hour() == alarm.hour && now.minute() == alarm.minute && now.second() == 0 {
            alarm.is_ringing = true;
            return Some(Event::AlarmFired {
                hour: alarm.hour,
                minute: alarm.minute,
                at: Utc::now(),
            });
        }
        None
    }
}
