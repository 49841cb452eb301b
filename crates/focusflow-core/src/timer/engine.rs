//! Timer engine implementation.
//!
//! The engine is a tick-driven state machine. It holds no thread and no
//! clock: the caller invokes [`TimerEngine::tick`] once per real-time
//! second, making it the single timing authority.
//!
//! ## Session cycle
//!
//! ```text
//! Focus -> ShortBreak -> Focus -> ... -> Focus -> LongBreak -> Focus
//! ```
//!
//! A long break is inserted after `long_break_interval` completed focus
//! sessions; the cycle counter then restarts at 1.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Focus,
    ShortBreak,
    LongBreak,
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionKind::Focus => "Focus",
            SessionKind::ShortBreak => "Short Break",
            SessionKind::LongBreak => "Long Break",
        };
        f.write_str(label)
    }
}

/// Core timer state machine.
///
/// Serializable so the CLI can persist it between invocations, and
/// comparable so a store echo of our own snapshot is cheap to drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEngine {
    session: SessionKind,
    seconds_remaining: u32,
    running: bool,
    /// Focus sessions completed in the current cycle, 1-based.
    focus_cycle: u32,
}

impl TimerEngine {
    /// Create a fresh engine: paused at the start of a focus session.
    pub fn new(settings: &Settings) -> Self {
        Self {
            session: SessionKind::Focus,
            seconds_remaining: settings.focus_duration,
            running: false,
            focus_cycle: 1,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> SessionKind {
        self.session
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn focus_cycle(&self) -> u32 {
        self.focus_cycle
    }

    /// Remaining time as `MM:SS`, zero-padded, minutes unbounded.
    pub fn format_remaining(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.seconds_remaining / 60,
            self.seconds_remaining % 60
        )
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.running {
            return None;
        }
        self.running = true;
        Some(Event::TimerStarted {
            session: self.session,
            seconds_remaining: self.seconds_remaining,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        Some(Event::TimerPaused {
            seconds_remaining: self.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Stop and restore the full duration of the current session kind,
    /// reading live settings.
    pub fn reset(&mut self, settings: &Settings) -> Event {
        self.running = false;
        self.seconds_remaining = settings.duration_for(self.session);
        Event::TimerReset {
            session: self.session,
            seconds_remaining: self.seconds_remaining,
            at: Utc::now(),
        }
    }

    /// Abandon the remaining time and run the end-of-session transition,
    /// exactly as if the countdown had reached zero.
    pub fn skip(&mut self, settings: &Settings) -> Event {
        self.running = false;
        self.advance(settings)
    }

    /// One real-time second. Returns the transition event when the current
    /// session ends on this tick.
    pub fn tick(&mut self, settings: &Settings) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            return Some(self.advance(settings));
        }
        None
    }

    /// Re-baseline the remaining time after a duration edit. Deferred while
    /// running so an in-progress countdown is never corrupted.
    pub fn apply_settings(&mut self, settings: &Settings) {
        if !self.running {
            self.seconds_remaining = settings.duration_for(self.session);
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn advance(&mut self, settings: &Settings) -> Event {
        let completed = self.session;
        let next = match completed {
            SessionKind::Focus => {
                if self.focus_cycle >= settings.long_break_interval {
                    self.focus_cycle = 1;
                    SessionKind::LongBreak
                } else {
                    self.focus_cycle += 1;
                    SessionKind::ShortBreak
                }
            }
            SessionKind::ShortBreak | SessionKind::LongBreak => SessionKind::Focus,
        };
        self.running = match next {
            SessionKind::Focus => settings.auto_start_focus,
            _ => settings.auto_start_breaks,
        };
        self.session = next;
        self.seconds_remaining = settings.duration_for(next);
        Event::SessionAdvanced {
            completed,
            next,
            focus_cycle: self.focus_cycle,
            auto_started: self.running,
            at: Utc::now(),
        }
    }
}
