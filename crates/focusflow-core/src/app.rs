//! Application façade.
//!
//! [`FocusFlow`] owns the store, the three tick-driven state machines, the
//! stats aggregator, and the notification/sound gateways, and exposes the
//! consumer-facing read and write surface. All state transitions happen on
//! explicit calls or inside [`FocusFlow::tick`], one logical thread of
//! execution, so no two transitions for the same entity can interleave.
//!
//! The store is the sole mutation gateway to durable storage; the façade
//! persists exactly the entities an operation changed.

use chrono::{DateTime, Local};

use crate::alarm::{AlarmMonitor, StoredAlarm, ALARM_KEY};
use crate::error::ValidationError;
use crate::events::Event;
use crate::notify::{Notice, NotificationGateway, Permission};
use crate::settings::{Settings, SettingsPatch, SETTINGS_KEY};
use crate::sound::SoundGateway;
use crate::stats::{Stats, STATS_KEY};
use crate::store::{Store, Subscription};
use crate::timer::{SessionKind, TimerEngine};
use crate::timetable::{Day, Timetable, TimetableScheduler, TIMETABLE_KEY};

/// CLI-side persistence slot for the timer snapshot.
pub const TIMER_KEY: &str = "timer";

/// Timetable scan cadence, in ticks (= seconds).
const SCAN_INTERVAL_TICKS: u64 = 60;

pub struct FocusFlow<N: NotificationGateway, S: SoundGateway> {
    store: Store,
    settings: Settings,
    engine: TimerEngine,
    alarm: AlarmMonitor,
    timetable: Timetable,
    scheduler: TimetableScheduler,
    stats: Stats,
    notifier: N,
    sound: S,
    settings_sub: Subscription,
    alarm_sub: Subscription,
    timetable_sub: Subscription,
    stats_sub: Subscription,
    timer_sub: Subscription,
    ticks: u64,
}

impl<N: NotificationGateway, S: SoundGateway> FocusFlow<N, S> {
    /// Load every component from the store, seeding defaults for absent
    /// keys and reconciling a stale streak.
    pub fn new(mut store: Store, mut notifier: N, sound: S, now: DateTime<Local>) -> Self {
        let settings: Settings = store.get_or_init(SETTINGS_KEY, Settings::default);
        let mut stats: Stats = store.get_or_init(STATS_KEY, Stats::default);
        stats.reconcile(now.date_naive());
        store.set(STATS_KEY, &stats);
        let stored_alarm: Option<StoredAlarm> = store.get_or_init(ALARM_KEY, || None);
        let alarm = AlarmMonitor::new(stored_alarm);
        let timetable: Timetable = store.get_or_init(TIMETABLE_KEY, Timetable::default);
        let engine: TimerEngine = store.get_or_init(TIMER_KEY, || TimerEngine::new(&settings));

        let settings_sub = store.subscribe(SETTINGS_KEY);
        let alarm_sub = store.subscribe(ALARM_KEY);
        let timetable_sub = store.subscribe(TIMETABLE_KEY);
        let stats_sub = store.subscribe(STATS_KEY);
        let timer_sub = store.subscribe(TIMER_KEY);

        notifier.set_muted(settings.is_muted);
        // Alarm and timetable alerts need permission even when the timer
        // is never started.
        if notifier.permission() == Permission::Undecided {
            notifier.request_permission();
        }
        Self {
            store,
            settings,
            engine,
            alarm,
            timetable,
            scheduler: TimetableScheduler::new(),
            stats,
            notifier,
            sound,
            settings_sub,
            alarm_sub,
            timetable_sub,
            stats_sub,
            timer_sub,
            ticks: 0,
        }
    }

    // ── Read surface ─────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn alarm(&self) -> &AlarmMonitor {
        &self.alarm
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn sound(&self) -> &S {
        &self.sound
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn start_timer(&mut self) -> Option<Event> {
        if self.notifier.permission() == Permission::Undecided {
            self.notifier.request_permission();
        }
        let event = self.engine.start()?;
        self.persist_timer();
        Some(event)
    }

    pub fn pause_timer(&mut self) -> Option<Event> {
        let event = self.engine.pause()?;
        self.persist_timer();
        Some(event)
    }

    pub fn reset_timer(&mut self) -> Event {
        let event = self.engine.reset(&self.settings);
        self.persist_timer();
        event
    }

    pub fn skip_timer(&mut self, now: DateTime<Local>) -> Event {
        let event = self.engine.skip(&self.settings);
        self.after_advance(&event, now);
        event
    }

    // ── Alarm ────────────────────────────────────────────────────────

    pub fn set_alarm(&mut self, hour: u32, minute: u32) -> Result<Event, ValidationError> {
        let event = self.alarm.set(hour, minute)?;
        self.sound.stop_alarm();
        self.persist_alarm();
        Ok(event)
    }

    pub fn clear_alarm(&mut self) -> Option<Event> {
        let event = self.alarm.clear()?;
        self.sound.stop_alarm();
        self.persist_alarm();
        Some(event)
    }

    pub fn dismiss_alarm(&mut self) -> Option<Event> {
        let event = self.alarm.dismiss()?;
        self.sound.stop_alarm();
        self.persist_alarm();
        Some(event)
    }

    // ── Timetable ────────────────────────────────────────────────────

    pub fn add_entry(
        &mut self,
        subject: &str,
        day: Day,
        start_time: &str,
        end_time: &str,
        notes: Option<String>,
    ) -> Result<Event, ValidationError> {
        let event = self.timetable.add(subject, day, start_time, end_time, notes)?;
        self.store.set(TIMETABLE_KEY, &self.timetable);
        Ok(event)
    }

    pub fn remove_entry(&mut self, id: &str) -> Option<Event> {
        let event = self.timetable.remove(id)?;
        self.store.set(TIMETABLE_KEY, &self.timetable);
        Some(event)
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Event, ValidationError> {
        self.settings.apply(patch)?;
        self.settings_changed();
        Ok(Event::SettingsUpdated { at: chrono::Utc::now() })
    }

    pub fn reset_settings(&mut self) -> Event {
        self.settings = Settings::default();
        self.settings_changed();
        Event::SettingsUpdated { at: chrono::Utc::now() }
    }

    fn settings_changed(&mut self) {
        self.notifier.set_muted(self.settings.is_muted);
        // Duration edits re-baseline a paused timer; a running countdown
        // is left alone.
        self.engine.apply_settings(&self.settings);
        self.store.set(SETTINGS_KEY, &self.settings);
        self.persist_timer();
    }

    // ── Tick loop ────────────────────────────────────────────────────

    /// One cooperative step, called once per real-time second. Runs the
    /// timer and alarm ticks every call and the timetable scan every 60th
    /// call, the first scan happening immediately.
    pub fn tick(&mut self, now: DateTime<Local>) -> Vec<Event> {
        self.sync_from_store();

        let mut events = Vec::new();

        if let Some(event) = self.engine.tick(&self.settings) {
            self.after_advance(&event, now);
            events.push(event);
        } else if self.engine.is_running() {
            self.persist_timer();
        }

        if let Some(event) = self.alarm.tick(now) {
            if let Event::AlarmFired { hour, minute, .. } = event {
                self.notifier.dispatch(
                    &Notice::new("⏰ Alarm Time! Wake up!", "Your scheduled alarm is ringing.")
                        .tag(format!("focusflow-alarm-{hour}-{minute}")),
                );
                if !self.settings.is_muted {
                    self.sound.start_alarm();
                }
            }
            self.persist_alarm();
            events.push(event);
        }

        if self.ticks % SCAN_INTERVAL_TICKS == 0 {
            for event in self.scheduler.check(&self.timetable, now) {
                if let Event::EntryDue {
                    entry_id,
                    subject,
                    start_time,
                    ..
                } = &event
                {
                    let end_time = self
                        .timetable
                        .entries()
                        .iter()
                        .find(|e| &e.id == entry_id)
                        .map(|e| e.end_time.clone())
                        .unwrap_or_default();
                    self.notifier.dispatch(
                        &Notice::new(
                            format!("Time for {subject}!"),
                            format!(
                                "Your scheduled session for {subject} from {start_time} to {end_time} is starting now."
                            ),
                        )
                        .tag(format!("timetable-{entry_id}-{}", now.date_naive())),
                    );
                    if !self.settings.is_muted {
                        self.sound.play_cue();
                    }
                }
                events.push(event);
            }
        }

        self.ticks += 1;
        events
    }

    /// End-of-session bookkeeping, shared by natural completion and skip.
    fn after_advance(&mut self, event: &Event, now: DateTime<Local>) {
        let Event::SessionAdvanced { completed, next, .. } = event else {
            return;
        };
        if *completed == SessionKind::Focus {
            self.stats.record_completion(now.date_naive());
            self.store.set(STATS_KEY, &self.stats);
        }
        if !self.settings.is_muted {
            self.sound.play_cue();
        }
        self.notifier.dispatch(&Notice::new(
            format!("{next} Started!"),
            format!("Time for your {} session.", next.to_string().to_lowercase()),
        ));
        self.persist_timer();
    }

    /// Pick up commits made by other processes (and echoes of our own) and
    /// refresh the local views. Unchanged documents short-circuit upstream,
    /// so this settles immediately.
    fn sync_from_store(&mut self) {
        self.store.poll_external();
        if let Some(settings) = self.settings_sub.latest::<Settings>() {
            if settings != self.settings {
                self.settings = settings;
                self.notifier.set_muted(self.settings.is_muted);
                self.engine.apply_settings(&self.settings);
            }
        }
        if let Some(alarm) = self.alarm_sub.latest::<Option<StoredAlarm>>() {
            if alarm != self.alarm.alarm().copied() {
                self.alarm = AlarmMonitor::new(alarm);
            }
        }
        if let Some(timetable) = self.timetable_sub.latest::<Timetable>() {
            self.timetable = timetable;
        }
        if let Some(stats) = self.stats_sub.latest::<Stats>() {
            self.stats = stats;
        }
        // Timer commands issued by another process (pause, skip, reset)
        // replace the local engine; echoes of our own persists compare
        // equal and fall through.
        if let Some(engine) = self.timer_sub.latest::<TimerEngine>() {
            if engine != self.engine {
                self.engine = engine;
            }
        }
    }

    fn persist_timer(&mut self) {
        self.store.set(TIMER_KEY, &self.engine);
    }

    fn persist_alarm(&mut self) {
        self.store.set(ALARM_KEY, &self.alarm.alarm().copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingGateway;
    use crate::sound::RecordingSound;
    use chrono::TimeZone;

    type TestApp = FocusFlow<RecordingGateway, RecordingSound>;

    fn local(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 9, h, m, s).unwrap()
    }

    fn app() -> TestApp {
        FocusFlow::new(
            Store::open_memory().unwrap(),
            RecordingGateway::default(),
            RecordingSound::default(),
            local(8, 0, 0),
        )
    }

    fn one_second_focus(app: &mut TestApp) {
        app.update_settings(&SettingsPatch {
            focus_duration: Some(1),
            ..Default::default()
        })
        .unwrap();
    }

    #[test]
    fn start_requests_permission_once() {
        let mut app = app();
        app.start_timer();
        app.pause_timer();
        app.start_timer();
        assert_eq!(app.notifier().requests, 1);
    }

    #[test]
    fn focus_completion_records_stats_and_alerts() {
        let mut app = app();
        one_second_focus(&mut app);
        app.start_timer();
        let events = app.tick(local(8, 0, 1));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::SessionAdvanced { next: SessionKind::ShortBreak, .. })));
        assert_eq!(app.stats().streak, 1);
        assert_eq!(app.stats().today(local(8, 0, 1).date_naive()).completed_sessions, 1);
        assert_eq!(app.sound().cues, 1);
        let notice = app.notifier().dispatched.last().unwrap();
        assert_eq!(notice.title, "Short Break Started!");
        assert_eq!(notice.body, "Time for your short break session.");
        // auto_start_breaks default: the break is already running.
        assert!(app.timer().is_running());
    }

    #[test]
    fn skip_during_break_does_not_record_stats() {
        let mut app = app();
        app.skip_timer(local(9, 0, 0)); // Focus -> ShortBreak, 1 completion
        app.skip_timer(local(9, 5, 0)); // ShortBreak -> Focus, no completion
        assert_eq!(app.stats().today(local(9, 0, 0).date_naive()).completed_sessions, 1);
        assert_eq!(app.timer().session(), SessionKind::Focus);
    }

    #[test]
    fn mute_suppresses_cues_and_notifications() {
        let mut app = app();
        assert_eq!(app.notifier().permission(), Permission::Granted);
        app.update_settings(&SettingsPatch {
            is_muted: Some(true),
            ..Default::default()
        })
        .unwrap();
        app.skip_timer(local(9, 0, 0));
        assert_eq!(app.sound().cues, 0);
        assert!(app.notifier().dispatched.is_empty());
    }

    #[test]
    fn alarm_rings_then_dismisses() {
        let mut app = app();
        app.set_alarm(7, 30).unwrap();
        assert_eq!(app.alarm().formatted().as_deref(), Some("07:30 AM"));

        let events = app.tick(local(7, 30, 0));
        assert!(events.iter().any(|e| matches!(e, Event::AlarmFired { .. })));
        assert!(app.alarm().is_ringing());
        assert!(app.sound().alarm_ringing);
        let notice = app.notifier().dispatched.last().unwrap();
        assert_eq!(notice.tag.as_deref(), Some("focusflow-alarm-7-30"));

        app.dismiss_alarm().unwrap();
        assert!(!app.alarm().is_ringing());
        assert!(!app.alarm().is_set());
        assert!(!app.sound().alarm_ringing);
    }

    #[test]
    fn startup_scan_fires_due_entry() {
        let mut app = app();
        // 2026-03-09 is a Monday.
        app.add_entry("Maths", Day::Monday, "08:00", "09:30", None).unwrap();
        let events = app.tick(local(8, 0, 10));
        assert!(events.iter().any(|e| matches!(e, Event::EntryDue { .. })));
        let notice = app.notifier().dispatched.last().unwrap();
        assert_eq!(notice.title, "Time for Maths!");
        assert!(notice.body.contains("from 08:00 to 09:30"));
        assert_eq!(app.sound().cues, 1);
        // Later ticks do not re-fire the entry.
        let mut later = app.tick(local(8, 0, 11));
        assert!(later.drain(..).all(|e| !matches!(e, Event::EntryDue { .. })));
    }

    #[test]
    fn state_survives_reopen_through_shared_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        {
            let store = Store::open_at(&path).unwrap();
            let mut app = FocusFlow::new(
                store,
                RecordingGateway::default(),
                RecordingSound::default(),
                local(8, 0, 0),
            );
            app.set_alarm(6, 15).unwrap();
            app.add_entry("Physics", Day::Friday, "10:00", "11:00", None).unwrap();
            app.start_timer();
        }
        let store = Store::open_at(&path).unwrap();
        let app: TestApp = FocusFlow::new(
            store,
            RecordingGateway::default(),
            RecordingSound::default(),
            local(8, 5, 0),
        );
        assert!(app.alarm().is_set());
        assert_eq!(app.timetable().len(), 1);
        assert!(app.timer().is_running());
    }

    #[test]
    fn cross_process_timer_pause_stops_running_countdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let mut watcher = FocusFlow::new(
            Store::open_at(&path).unwrap(),
            RecordingGateway::default(),
            RecordingSound::default(),
            local(8, 0, 0),
        );
        watcher.start_timer();
        watcher.tick(local(8, 0, 1));
        assert!(watcher.timer().is_running());

        // Another process loads the shared state and pauses.
        let mut other: TestApp = FocusFlow::new(
            Store::open_at(&path).unwrap(),
            RecordingGateway::default(),
            RecordingSound::default(),
            local(8, 0, 1),
        );
        assert!(other.pause_timer().is_some());
        let remaining = other.timer().seconds_remaining();

        // The next tick adopts the pause instead of overwriting it.
        watcher.tick(local(8, 0, 2));
        assert!(!watcher.timer().is_running());
        assert_eq!(watcher.timer().seconds_remaining(), remaining);
    }

    #[test]
    fn cross_process_settings_write_rebaselines_paused_timer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let mut app = FocusFlow::new(
            Store::open_at(&path).unwrap(),
            RecordingGateway::default(),
            RecordingSound::default(),
            local(8, 0, 0),
        );
        assert_eq!(app.timer().seconds_remaining(), 25 * 60);

        let mut other = Store::open_at(&path).unwrap();
        let mut settings: Settings = other.get("settings").unwrap();
        settings.focus_duration = 50 * 60;
        other.set("settings", &settings);

        app.tick(local(8, 0, 1));
        assert_eq!(app.settings().focus_duration, 50 * 60);
        assert_eq!(app.timer().seconds_remaining(), 50 * 60);
    }
}
