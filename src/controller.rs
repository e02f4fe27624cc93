use std::sync::{Arc, Mutex};

use crossbeam::queue::SegQueue;
use serde::{Deserialize, Serialize};

use crate::audio::bank::{SoundBank, SoundEvent};
use crate::audio::clock::{AudioClock, ClockTime, DeviceClock};
use crate::audio::rack::VoiceRack;
use crate::audio::DEFAULT_SAMPLE_RATE;
use crate::error::EngineError;
use crate::events::{SnapshotQueue, SnapshotReceiver};
use crate::scheduler::{LookaheadScheduler, SchedulerHandle, START_OFFSET_SECS};
use crate::sequencing::Progression;
use crate::session::{SessionConfig, SharedState, Snapshot};

/// Seconds per note in a demo preview.
const DEMO_STEP_SECS: f64 = 0.4;
const DEMO_STEP_SLOW_SECS: f64 = 0.75;

/// One note of a demo preview: string (0 = low E) and fret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoNote {
    pub string_index: u32,
    pub fret: u32,
}

/// Owner of one playback session: one clock plus at most one scheduler,
/// exposing the start/stop/tempo/volume surface the screens bind to.
/// Controllers are fully independent of each other; dropping one tears its
/// session down.
pub struct PlaybackController {
    clock: Box<dyn AudioClock>,
    time: ClockTime,
    shared: Arc<SharedState>,
    bank: SoundBank,
    snapshots: SnapshotQueue,
    scheduler: Option<SchedulerHandle>,
    progression: Progression,
}

impl PlaybackController {
    /// Controller backed by the default output device. The device is not
    /// opened until the first successful `start()` or `play_demo()`.
    pub fn new(config: SessionConfig) -> Self {
        let events = Arc::new(SegQueue::new());
        let rack = Arc::new(Mutex::new(VoiceRack::new(
            Arc::clone(&events),
            DEFAULT_SAMPLE_RATE as f32,
        )));
        let clock = DeviceClock::new(rack, DEFAULT_SAMPLE_RATE);
        Self::with_clock(Box::new(clock), events, config)
    }

    /// Controller around an arbitrary clock; `events` must be the queue
    /// whatever renders the session consumes. This is the seam tests and
    /// headless callers use with [`crate::audio::clock::ManualClock`].
    pub fn with_clock(
        clock: Box<dyn AudioClock>,
        events: Arc<SegQueue<SoundEvent>>,
        config: SessionConfig,
    ) -> Self {
        let time = clock.time();
        let shared = Arc::new(SharedState::new(&config));
        let bank = SoundBank::new(events, time.clone());
        Self {
            clock,
            time,
            shared,
            bank,
            snapshots: SnapshotQueue::new(),
            scheduler: None,
            progression: config.progression,
        }
    }

    /// Begin playback. On `NeedsUserInteraction` the session stays stopped
    /// and the snapshot flag asks the UI to retry after a user gesture.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.shared.is_running() {
            return Ok(());
        }

        if let Err(err) = self.clock.ensure_running() {
            if err == EngineError::NeedsUserInteraction {
                self.shared.set_needs_user_interaction(true);
            }
            return Err(err);
        }
        self.shared.set_needs_user_interaction(false);

        self.shared.reset_counters();
        self.shared.set_running(true);

        // One drone per session, rooted on the progression's first chord.
        if self.shared.backing_track_enabled() {
            if let Some(root_hz) = self.progression.first_root() {
                self.bank.start_bass_drone(root_hz, self.shared.volume());
            }
        }

        let scheduler = LookaheadScheduler::new(
            self.time.clone(),
            self.bank.clone(),
            Arc::clone(&self.shared),
            self.snapshots.sender(),
            self.progression.len(),
        );
        self.scheduler = Some(scheduler.spawn());
        Ok(())
    }

    /// Stop playback and reset counters. Idempotent; safe from a teardown
    /// path. Sound already committed to the render queue finishes
    /// naturally, but nothing new is scheduled once this returns.
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.scheduler.take() {
            handle.stop();
        }
        if self.shared.is_running() {
            self.bank.stop_bass_drone();
        }
        self.shared.set_running(false);
        self.shared.reset_counters();
    }

    pub fn toggle(&mut self) -> Result<(), EngineError> {
        if self.shared.is_running() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    /// Clamped to the supported range; lands on the next unscheduled
    /// boundary without restarting playback.
    pub fn set_tempo(&self, bpm: u32) {
        self.shared.set_tempo(bpm);
    }

    /// Clamped to 0..=1; affects subsequently scheduled sounds only.
    pub fn set_volume(&self, volume: f32) {
        self.shared.set_volume(volume);
    }

    pub fn set_metronome_enabled(&self, enabled: bool) {
        self.shared.set_metronome_enabled(enabled);
    }

    pub fn set_backing_track_enabled(&self, enabled: bool) {
        self.shared.set_backing_track_enabled(enabled);
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Read-only copy of the current counters and flags. Never blocks.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshot()
    }

    /// Receiver fed one snapshot per scheduled boundary, for push-style UI
    /// binding.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.snapshots.receiver()
    }

    /// One-shot note preview through the guitar voices, bypassing the
    /// metronome path entirely. Invalid notes are skipped, not fatal.
    pub fn play_demo(&mut self, notes: &[DemoNote], slow: bool) -> Result<(), EngineError> {
        if let Err(err) = self.clock.ensure_running() {
            if err == EngineError::NeedsUserInteraction {
                self.shared.set_needs_user_interaction(true);
            }
            return Err(err);
        }
        self.shared.set_needs_user_interaction(false);

        let step = if slow {
            DEMO_STEP_SLOW_SECS
        } else {
            DEMO_STEP_SECS
        };
        let volume = self.shared.volume();
        let mut at = self.time.now() + START_OFFSET_SECS;
        for note in notes {
            self.bank
                .schedule_guitar_note(at, note.string_index, note.fret, step as f32 * 0.9, volume);
            at += step;
        }
        Ok(())
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop();
        self.clock.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::bank::SoundKind;
    use crate::audio::clock::ManualClock;
    use std::sync::atomic::Ordering;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn start_schedules_and_stop_resets() {
        let clock = ManualClock::new();
        let events = Arc::new(SegQueue::new());
        let mut controller = PlaybackController::with_clock(
            Box::new(clock),
            Arc::clone(&events),
            SessionConfig::default(),
        );

        assert!(controller.start().is_ok());
        assert!(controller.is_running());

        // The spawn-time pump commits the first boundary immediately.
        thread::sleep(Duration::from_millis(60));
        let first = events.pop().expect("no opening click");
        assert_eq!(first.kind, SoundKind::Click { accent: true });

        controller.stop();
        assert!(!controller.is_running());
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.subdivision, 0);
        assert_eq!(snapshot.beat, 1);
        assert_eq!(snapshot.bar_count, 0);
    }

    #[test]
    fn stop_is_idempotent_and_safe_before_start() {
        let clock = ManualClock::new();
        let events = Arc::new(SegQueue::new());
        let mut controller = PlaybackController::with_clock(
            Box::new(clock),
            Arc::clone(&events),
            SessionConfig::default(),
        );

        controller.stop();
        controller.stop();
        assert!(!controller.is_running());

        assert!(controller.start().is_ok());
        controller.stop();
        controller.stop();
        assert!(!controller.is_running());
    }

    #[test]
    fn toggle_flips_running_state() {
        let clock = ManualClock::new();
        let events = Arc::new(SegQueue::new());
        let mut controller = PlaybackController::with_clock(
            Box::new(clock),
            Arc::clone(&events),
            SessionConfig::default(),
        );

        assert!(controller.toggle().is_ok());
        assert!(controller.is_running());
        assert!(controller.toggle().is_ok());
        assert!(!controller.is_running());
    }

    #[test]
    fn suspended_clock_gates_start_until_gesture() {
        let clock = ManualClock::suspended();
        let flag = clock.suspend_flag();
        let events = Arc::new(SegQueue::new());
        let mut controller = PlaybackController::with_clock(
            Box::new(clock),
            Arc::clone(&events),
            SessionConfig::default(),
        );

        assert_eq!(controller.start(), Err(EngineError::NeedsUserInteraction));
        assert!(!controller.is_running());
        assert!(controller.snapshot().needs_user_interaction);

        // The scheduler never ticked: nothing was scheduled.
        thread::sleep(Duration::from_millis(60));
        assert!(events.pop().is_none());

        // User gesture unblocks audio; the retry succeeds and clears the
        // flag.
        flag.store(false, Ordering::Release);
        assert!(controller.start().is_ok());
        assert!(controller.is_running());
        assert!(!controller.snapshot().needs_user_interaction);
    }

    #[test]
    fn tempo_and_volume_are_clamped() {
        let clock = ManualClock::new();
        let events = Arc::new(SegQueue::new());
        let controller = PlaybackController::with_clock(
            Box::new(clock),
            Arc::clone(&events),
            SessionConfig::default(),
        );

        controller.set_tempo(1);
        assert_eq!(controller.snapshot().tempo_bpm, 40);
        controller.set_tempo(999);
        assert_eq!(controller.snapshot().tempo_bpm, 200);
    }

    #[test]
    fn demo_notes_are_spaced_and_bad_notes_skipped() {
        let clock = ManualClock::new();
        let events = Arc::new(SegQueue::new());
        let mut controller = PlaybackController::with_clock(
            Box::new(clock),
            Arc::clone(&events),
            SessionConfig::default(),
        );

        let notes = [
            DemoNote {
                string_index: 0,
                fret: 0,
            },
            DemoNote {
                string_index: 42,
                fret: 0,
            },
            DemoNote {
                string_index: 1,
                fret: 2,
            },
        ];
        assert!(controller.play_demo(&notes, false).is_ok());

        let mut scheduled = Vec::new();
        while let Some(event) = events.pop() {
            scheduled.push(event);
        }

        // The out-of-range string was dropped
        assert_eq!(scheduled.len(), 2);
        assert!(scheduled
            .iter()
            .all(|e| matches!(e.kind, SoundKind::GuitarNote { .. })));
        // Slot spacing is preserved even across the skipped note
        let gap = scheduled[1].time - scheduled[0].time;
        assert!((gap - 2.0 * DEMO_STEP_SECS).abs() < 1e-9);
    }

    #[test]
    fn slow_demo_spreads_notes_further_apart() {
        let clock = ManualClock::new();
        let events = Arc::new(SegQueue::new());
        let mut controller = PlaybackController::with_clock(
            Box::new(clock),
            Arc::clone(&events),
            SessionConfig::default(),
        );

        let notes = [
            DemoNote {
                string_index: 0,
                fret: 0,
            },
            DemoNote {
                string_index: 1,
                fret: 0,
            },
        ];
        assert!(controller.play_demo(&notes, true).is_ok());

        let first = events.pop().unwrap();
        let second = events.pop().unwrap();
        assert!((second.time - first.time - DEMO_STEP_SLOW_SECS).abs() < 1e-9);
    }

    #[test]
    fn backing_track_starts_drone_on_first_chord_root() {
        let clock = ManualClock::new();
        let events = Arc::new(SegQueue::new());
        let config = SessionConfig {
            backing_track_enabled: true,
            metronome_enabled: false,
            progression: Progression::new(vec![crate::sequencing::Chord::new("Am", 110.0)]),
            ..SessionConfig::default()
        };
        let mut controller =
            PlaybackController::with_clock(Box::new(clock), Arc::clone(&events), config);

        assert!(controller.start().is_ok());
        thread::sleep(Duration::from_millis(60));

        let mut kinds = Vec::new();
        while let Some(event) = events.pop() {
            kinds.push(event.kind);
        }
        assert!(kinds.contains(&SoundKind::BassOn { root_hz: 110.0 }));

        controller.stop();
        let mut saw_off = false;
        while let Some(event) = events.pop() {
            if event.kind == SoundKind::BassOff {
                saw_off = true;
            }
        }
        assert!(saw_off, "stop() must stop the drone explicitly");
    }

    #[test]
    fn sessions_are_independent() {
        let make = || {
            let events: Arc<SegQueue<SoundEvent>> = Arc::new(SegQueue::new());
            PlaybackController::with_clock(
                Box::new(ManualClock::new()),
                Arc::clone(&events),
                SessionConfig::default(),
            )
        };

        let explore = make();
        let exercise = make();

        explore.set_tempo(60);
        exercise.set_tempo(180);
        assert_eq!(explore.snapshot().tempo_bpm, 60);
        assert_eq!(exercise.snapshot().tempo_bpm, 180);
    }
}
