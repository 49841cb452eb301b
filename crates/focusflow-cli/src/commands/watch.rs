use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use clap::Args;

use super::open_app;

#[derive(Args)]
pub struct WatchArgs {
    /// Stop after this many ticks (default: run until interrupted)
    #[arg(long)]
    ticks: Option<u64>,
}

/// Sleeps out the remainder of each period against a fixed schedule, so
/// the cost of the work between waits does not accumulate as drift.
struct Pacer {
    period: Duration,
    deadline: Instant,
}

impl Pacer {
    fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: Instant::now() + period,
        }
    }

    /// Sleep until the next deadline. A deadline already in the past
    /// returns immediately and the schedule advances one period.
    fn wait(&mut self) {
        if let Some(remaining) = self.deadline.checked_duration_since(Instant::now()) {
            thread::sleep(remaining);
        }
        self.deadline += self.period;
    }
}

/// The always-on loop: one tick per second drives the timer countdown and
/// the alarm check; the timetable scan runs on every 60th tick. This loop
/// is the single timing authority -- one-shot commands never advance time.
pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app()?;
    let mut remaining = args.ticks;
    let mut pacer = Pacer::new(Duration::from_secs(1));

    loop {
        if let Some(0) = remaining {
            break;
        }
        for event in app.tick(Local::now()) {
            println!("{}", serde_json::to_string(&event)?);
        }
        remaining = remaining.map(|n| n - 1);
        if remaining != Some(0) {
            pacer.wait();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacer_absorbs_work_time() {
        let mut pacer = Pacer::new(Duration::from_millis(50));
        let start = Instant::now();
        for _ in 0..6 {
            thread::sleep(Duration::from_millis(30)); // simulated tick cost
            pacer.wait();
        }
        let elapsed = start.elapsed();
        // Six periods on a fixed schedule, not six (work + period) sums.
        assert!(elapsed >= Duration::from_millis(290), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(440), "elapsed {elapsed:?}");
    }

    #[test]
    fn pacer_does_not_block_after_overrun() {
        let mut pacer = Pacer::new(Duration::from_millis(10));
        thread::sleep(Duration::from_millis(50)); // overran several periods
        let start = Instant::now();
        pacer.wait();
        assert!(start.elapsed() < Duration::from_millis(10));
    }
}
