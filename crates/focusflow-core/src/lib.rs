//! # FocusFlow Core Library
//!
//! Core business logic for FocusFlow: a focus timer, a daily alarm clock,
//! and a weekly study timetable with desktop notifications. The CLI binary
//! is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Store**: synchronized key-value persistence; one JSON document per
//!   logical key, change signals to every local subscriber, cross-process
//!   pickup via polling
//! - **Timer Engine**: tick-driven session state machine (focus, short
//!   break, long break) with auto-start and long-break cycling
//! - **Alarm Monitor**: single wall-clock alarm with explicit dismiss
//! - **Timetable Scheduler**: fires each study slot once per day
//! - **Stats**: completed-session counts and the daily streak
//! - **Gateways**: desktop notifications and synthesized sound cues,
//!   both best-effort
//!
//! All timing is caller-driven: components expose `tick`/`check` methods
//! and [`FocusFlow`] composes them into one cooperative loop.

pub mod alarm;
pub mod app;
pub mod error;
pub mod events;
pub mod notify;
pub mod settings;
pub mod sound;
pub mod stats;
pub mod store;
pub mod timer;
pub mod timetable;

pub use alarm::{AlarmMonitor, StoredAlarm};
pub use app::FocusFlow;
pub use error::{CoreError, Result, StoreError, ValidationError};
pub use events::Event;
pub use notify::{DesktopGateway, Notice, NotificationGateway, Permission};
pub use settings::{Settings, SettingsPatch, Theme};
pub use sound::{NullSound, SoundGateway, TonePlayer};
pub use stats::{DailyStats, Stats};
pub use store::{Store, Subscription};
pub use timer::{SessionKind, TimerEngine};
pub use timetable::{Day, Timetable, TimetableEntry, TimetableScheduler};
