//! Completed-session statistics and daily streak.
//!
//! Persisted under the `stats` key. The streak counts consecutive calendar
//! days with at least one completed focus session:
//!
//! - first-ever completion, or a gap of more than one day: streak = 1
//! - completion exactly one day after the previous one: streak + 1
//! - repeat completions on the same day: unchanged

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const STATS_KEY: &str = "stats";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub completed_sessions: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub daily: BTreeMap<NaiveDate, DailyStats>,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub last_completed_date: Option<NaiveDate>,
}

impl Stats {
    /// Record one completed focus session for `today`.
    pub fn record_completion(&mut self, today: NaiveDate) {
        self.daily.entry(today).or_default().completed_sessions += 1;

        self.streak = match self.last_completed_date {
            Some(last) if last == today => self.streak,
            Some(last) if (today - last).num_days() == 1 => self.streak + 1,
            _ => 1,
        };
        self.last_completed_date = Some(today);
    }

    /// Stale-streak cleanup, applied on load: a gap of more than one day
    /// since the last completion zeroes the streak even without a new
    /// completion.
    pub fn reconcile(&mut self, today: NaiveDate) {
        if let Some(last) = self.last_completed_date {
            if (today - last).num_days() > 1 {
                self.streak = 0;
            }
        }
    }

    pub fn today(&self, today: NaiveDate) -> DailyStats {
        self.daily.get(&today).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn first_completion_starts_streak_at_one() {
        let mut stats = Stats::default();
        stats.record_completion(day(1));
        assert_eq!(stats.streak, 1);
        assert_eq!(stats.today(day(1)).completed_sessions, 1);
        assert_eq!(stats.last_completed_date, Some(day(1)));
    }

    #[test]
    fn same_day_repeats_count_sessions_not_streak() {
        let mut stats = Stats::default();
        stats.record_completion(day(1));
        stats.record_completion(day(1));
        stats.record_completion(day(1));
        assert_eq!(stats.streak, 1);
        assert_eq!(stats.today(day(1)).completed_sessions, 3);
    }

    #[test]
    fn consecutive_days_extend_streak() {
        let mut stats = Stats::default();
        stats.record_completion(day(1));
        stats.record_completion(day(2));
        stats.record_completion(day(3));
        assert_eq!(stats.streak, 3);
    }

    #[test]
    fn gap_longer_than_one_day_resets_to_one() {
        // Day 1, day 2, skip day 3 entirely, complete on day 4.
        let mut stats = Stats::default();
        stats.record_completion(day(1));
        assert_eq!(stats.streak, 1);
        stats.record_completion(day(2));
        assert_eq!(stats.streak, 2);
        stats.record_completion(day(4));
        assert_eq!(stats.streak, 1);
    }

    #[test]
    fn reconcile_zeroes_stale_streak() {
        let mut stats = Stats::default();
        stats.record_completion(day(1));
        stats.record_completion(day(2));
        stats.reconcile(day(3));
        assert_eq!(stats.streak, 2, "yesterday still counts");
        stats.reconcile(day(5));
        assert_eq!(stats.streak, 0);
        // Daily history is untouched.
        assert_eq!(stats.today(day(2)).completed_sessions, 1);
    }

    #[test]
    fn json_maps_dates_to_daily_counts() {
        let mut stats = Stats::default();
        stats.record_completion(day(7));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["daily"]["2026-03-07"]["completed_sessions"], 1);
        assert_eq!(json["streak"], 1);
        let back: Stats = serde_json::from_value(json).unwrap();
        assert_eq!(back, stats);
    }
}
