use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use serde::Serialize;

use crate::sequencing::{BeatPosition, Progression};

/// Supported tempo range; anything outside is clamped, never rejected.
pub const MIN_TEMPO_BPM: u32 = 40;
pub const MAX_TEMPO_BPM: u32 = 200;

/// Inputs for one playback session, supplied by the owning screen.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tempo_bpm: u32,
    pub volume: f32,
    pub metronome_enabled: bool,
    pub backing_track_enabled: bool,
    pub progression: Progression,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: 120,
            volume: 0.8,
            metronome_enabled: true,
            backing_track_enabled: false,
            progression: Progression::default(),
        }
    }
}

/// Immutable copy of the session counters and flags, pushed to the UI on
/// every boundary and readable at any time without blocking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub is_running: bool,
    pub tempo_bpm: u32,
    pub beat: u32,
    pub subdivision: u32,
    pub bar_count: u64,
    pub chord_index: u32,
    pub needs_user_interaction: bool,
}

/// Live session state shared between the controller (parameter writes),
/// the scheduler thread (counter writes, parameter reads) and any UI
/// reader. Everything is an atomic: the scheduler reads tempo and volume
/// fresh on every boundary, so slider changes land without a restart, and
/// snapshot reads never take a lock.
pub struct SharedState {
    tempo_bpm: AtomicU32,
    volume_bits: AtomicU32,
    running: AtomicBool,
    metronome: AtomicBool,
    backing_track: AtomicBool,
    needs_user_interaction: AtomicBool,

    subdivision: AtomicU32,
    beat: AtomicU32,
    bar: AtomicU64,
    chord_index: AtomicU32,
    last_event_time_bits: AtomicU64,
}

impl SharedState {
    pub fn new(config: &SessionConfig) -> Self {
        let state = Self {
            tempo_bpm: AtomicU32::new(0),
            volume_bits: AtomicU32::new(0),
            running: AtomicBool::new(false),
            metronome: AtomicBool::new(config.metronome_enabled),
            backing_track: AtomicBool::new(config.backing_track_enabled),
            needs_user_interaction: AtomicBool::new(false),

            subdivision: AtomicU32::new(0),
            beat: AtomicU32::new(1),
            bar: AtomicU64::new(0),
            chord_index: AtomicU32::new(0),
            last_event_time_bits: AtomicU64::new(0f64.to_bits()),
        };
        state.set_tempo(config.tempo_bpm);
        state.set_volume(config.volume);
        state
    }

    pub fn tempo_bpm(&self) -> u32 {
        self.tempo_bpm.load(Ordering::Acquire)
    }

    pub fn set_tempo(&self, bpm: u32) {
        self.tempo_bpm
            .store(bpm.clamp(MIN_TEMPO_BPM, MAX_TEMPO_BPM), Ordering::Release);
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Acquire))
    }

    pub fn set_volume(&self, volume: f32) {
        // Non-finite input from a UI binding is ignored rather than clamped
        if !volume.is_finite() {
            return;
        }
        self.volume_bits
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn metronome_enabled(&self) -> bool {
        self.metronome.load(Ordering::Acquire)
    }

    pub fn set_metronome_enabled(&self, enabled: bool) {
        self.metronome.store(enabled, Ordering::Release);
    }

    pub fn backing_track_enabled(&self) -> bool {
        self.backing_track.load(Ordering::Acquire)
    }

    pub fn set_backing_track_enabled(&self, enabled: bool) {
        self.backing_track.store(enabled, Ordering::Release);
    }

    pub fn needs_user_interaction(&self) -> bool {
        self.needs_user_interaction.load(Ordering::Acquire)
    }

    pub fn set_needs_user_interaction(&self, needs: bool) {
        self.needs_user_interaction.store(needs, Ordering::Release);
    }

    /// AudioClock time of the most recently scheduled boundary.
    pub fn last_event_time(&self) -> f64 {
        f64::from_bits(self.last_event_time_bits.load(Ordering::Acquire))
    }

    /// Publish the counters of a just-scheduled boundary. Called only from
    /// the scheduler thread, so counter updates stay ordered.
    pub fn record_boundary(&self, position: BeatPosition, time: f64) {
        self.subdivision
            .store(position.subdivision, Ordering::Release);
        self.beat.store(position.beat, Ordering::Release);
        self.bar.store(position.bar, Ordering::Release);
        self.chord_index
            .store(position.chord_index, Ordering::Release);
        self.last_event_time_bits
            .store(time.to_bits(), Ordering::Release);
    }

    pub fn reset_counters(&self) {
        self.subdivision.store(0, Ordering::Release);
        self.beat.store(1, Ordering::Release);
        self.bar.store(0, Ordering::Release);
        self.chord_index.store(0, Ordering::Release);
        self.last_event_time_bits
            .store(0f64.to_bits(), Ordering::Release);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            is_running: self.is_running(),
            tempo_bpm: self.tempo_bpm(),
            beat: self.beat.load(Ordering::Acquire),
            subdivision: self.subdivision.load(Ordering::Acquire),
            bar_count: self.bar.load(Ordering::Acquire),
            chord_index: self.chord_index.load(Ordering::Acquire),
            needs_user_interaction: self.needs_user_interaction(),
        }
    }
}
