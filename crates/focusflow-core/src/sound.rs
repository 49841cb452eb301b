//! Sound cues.
//!
//! Two effects: a short single tone for session changes and timetable
//! reminders, and a repeating tone that rings until explicitly stopped.
//! Audio output is opened on a dedicated thread because the stream handle
//! is not `Send`; failures are logged and skipped, never propagated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rodio::source::SineWave;
use rodio::{OutputStream, Sink, Source};

pub trait SoundGateway {
    /// Short single tone.
    fn play_cue(&mut self);

    /// Start the repeating alarm tone. Restarting while ringing is a no-op.
    fn start_alarm(&mut self);

    /// Stop the repeating alarm tone.
    fn stop_alarm(&mut self);
}

const CUE_HZ: f32 = 440.0;
const ALARM_HZ: f32 = 660.0;
const GAIN: f32 = 0.1;

fn play_tone(sink: &Sink, freq: f32, length: Duration) {
    let source = SineWave::new(freq).take_duration(length).amplify(GAIN);
    sink.append(source);
}

/// Synthesized tones through the default audio output.
#[derive(Default)]
pub struct TonePlayer {
    alarm_stop: Option<Arc<AtomicBool>>,
}

impl TonePlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SoundGateway for TonePlayer {
    fn play_cue(&mut self) {
        thread::spawn(|| {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "audio output unavailable, cue skipped");
                    return;
                }
            };
            let _stream = stream;
            let sink = match Sink::try_new(&handle) {
                Ok(sink) => sink,
                Err(e) => {
                    tracing::warn!(error = %e, "audio sink unavailable, cue skipped");
                    return;
                }
            };
            play_tone(&sink, CUE_HZ, Duration::from_millis(500));
            sink.sleep_until_end();
        });
    }

    fn start_alarm(&mut self) {
        if self.alarm_stop.is_some() {
            return;
        }
        let stop = Arc::new(AtomicBool::new(false));
        self.alarm_stop = Some(stop.clone());
        thread::spawn(move || {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "audio output unavailable, alarm tone skipped");
                    return;
                }
            };
            let _stream = stream;
            let sink = match Sink::try_new(&handle) {
                Ok(sink) => sink,
                Err(e) => {
                    tracing::warn!(error = %e, "audio sink unavailable, alarm tone skipped");
                    return;
                }
            };
            while !stop.load(Ordering::Relaxed) {
                play_tone(&sink, ALARM_HZ, Duration::from_millis(300));
                sink.sleep_until_end();
                thread::sleep(Duration::from_millis(200));
            }
        });
    }

    fn stop_alarm(&mut self) {
        if let Some(stop) = self.alarm_stop.take() {
            stop.store(true, Ordering::Relaxed);
        }
    }
}

impl Drop for TonePlayer {
    fn drop(&mut self) {
        self.stop_alarm();
    }
}

/// No-op gateway for headless use.
#[derive(Debug, Default)]
pub struct NullSound;

impl SoundGateway for NullSound {
    fn play_cue(&mut self) {}
    fn start_alarm(&mut self) {}
    fn stop_alarm(&mut self) {}
}

/// Gateway that records calls instead of playing audio. Used by tests.
#[derive(Debug, Default)]
pub struct RecordingSound {
    pub cues: u32,
    pub alarm_ringing: bool,
    pub alarm_starts: u32,
}

impl SoundGateway for RecordingSound {
    fn play_cue(&mut self) {
        self.cues += 1;
    }

    fn start_alarm(&mut self) {
        if !self.alarm_ringing {
            self.alarm_ringing = true;
            self.alarm_starts += 1;
        }
    }

    fn stop_alarm(&mut self) {
        self.alarm_ringing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sound_tracks_alarm_state() {
        let mut sound = RecordingSound::default();
        sound.start_alarm();
        sound.start_alarm();
        assert!(sound.alarm_ringing);
        assert_eq!(sound.alarm_starts, 1);
        sound.stop_alarm();
        assert!(!sound.alarm_ringing);
    }
}
