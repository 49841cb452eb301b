//! Session-cycling focus timer.

mod engine;

pub use engine::{SessionKind, TimerEngine};
