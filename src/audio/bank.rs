use std::sync::Arc;

use crossbeam::queue::SegQueue;

use crate::audio::clock::ClockTime;
use crate::audio::instruments::string_frequency;

/// One discrete sound, described fully at scheduling time so the render
/// side never needs mutable shared synthesis state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundKind {
    Click { accent: bool },
    Kick,
    HiHat { open: bool },
    BassOn { root_hz: f32 },
    BassOff,
    GuitarNote { freq_hz: f32, duration: f32 },
}

/// Ephemeral: produced by the scheduler, consumed once by the render
/// thread, never reused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundEvent {
    /// Output-clock time the sound is due, in seconds.
    pub time: f64,
    pub kind: SoundKind,
    pub gain: f32,
}

/// Producer-side facade the scheduler talks to. Every `schedule_*` call is
/// fire-and-forget: it builds one timed event and pushes it on the
/// lock-free queue shared with the render thread. Bad input is logged and
/// skipped; a dropped sound must never take down the session.
#[derive(Clone)]
pub struct SoundBank {
    queue: Arc<SegQueue<SoundEvent>>,
    time: ClockTime,
}

impl SoundBank {
    pub fn new(queue: Arc<SegQueue<SoundEvent>>, time: ClockTime) -> Self {
        Self { queue, time }
    }

    /// Push one event, clamping the target time so nothing is ever
    /// scheduled earlier than the clock's current output time.
    fn submit(&self, time: f64, kind: SoundKind, gain: f32) {
        let time = time.max(self.time.now());
        self.queue.push(SoundEvent { time, kind, gain });
    }

    pub fn schedule_click(&self, time: f64, accent: bool, gain: f32) {
        self.submit(time, SoundKind::Click { accent }, gain);
    }

    pub fn schedule_kick(&self, time: f64, gain: f32) {
        self.submit(time, SoundKind::Kick, gain);
    }

    pub fn schedule_hi_hat(&self, time: f64, open: bool, gain: f32) {
        self.submit(time, SoundKind::HiHat { open }, gain);
    }

    /// Start the sustained backing pad. One per session; it does not
    /// terminate on its own.
    pub fn start_bass_drone(&self, root_hz: f32, gain: f32) {
        let now = self.time.now();
        self.submit(now, SoundKind::BassOn { root_hz }, gain);
    }

    pub fn stop_bass_drone(&self) {
        let now = self.time.now();
        self.submit(now, SoundKind::BassOff, 0.0);
    }

    pub fn schedule_guitar_note(
        &self,
        time: f64,
        string_index: u32,
        fret: u32,
        duration: f32,
        gain: f32,
    ) {
        match string_frequency(string_index, fret) {
            Some(freq_hz) => {
                self.submit(time, SoundKind::GuitarNote { freq_hz, duration }, gain);
            }
            None => {
                log::warn!(
                    "skipping demo note with invalid string index {}",
                    string_index
                );
            }
        }
    }
}
