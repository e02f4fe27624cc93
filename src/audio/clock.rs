use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::output::AudioOutput;
use crate::audio::rack::VoiceRack;
use crate::error::EngineError;

/// Monotonic time source tied to the audio output pipeline, plus the
/// pipeline's lifecycle. Only the cheap [`ClockTime`] handle crosses
/// threads; the clock itself stays with its owning screen, so the trait
/// does not require `Send` (the device-backed stream isn't).
pub trait AudioClock {
    /// Shareable read-only handle for `now()` queries.
    fn time(&self) -> ClockTime;

    /// Bring the output pipeline up. Fails fast with
    /// [`EngineError::NeedsUserInteraction`] when the platform refuses to
    /// run audio without a user gesture; callers must not retry in a loop.
    fn ensure_running(&mut self) -> Result<(), EngineError>;

    /// Release the underlying pipeline. Idempotent.
    fn dispose(&mut self);
}

struct ClockState {
    frames: AtomicU64,
    sample_rate: AtomicU32,
}

/// Handle onto a clock's current output time. Cloning is cheap; all clones
/// observe the same time. `now()` never goes backward within a session.
#[derive(Clone)]
pub struct ClockTime {
    state: Arc<ClockState>,
}

impl ClockTime {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state: Arc::new(ClockState {
                frames: AtomicU64::new(0),
                sample_rate: AtomicU32::new(sample_rate.max(1)),
            }),
        }
    }

    /// Current output time in seconds.
    pub fn now(&self) -> f64 {
        let frames = self.state.frames.load(Ordering::Acquire);
        let rate = self.state.sample_rate.load(Ordering::Acquire);
        frames as f64 / rate as f64
    }

    pub fn sample_rate(&self) -> u32 {
        self.state.sample_rate.load(Ordering::Acquire)
    }

    pub(crate) fn advance_frames(&self, frames: u64) {
        self.state.frames.fetch_add(frames, Ordering::AcqRel);
    }

    pub(crate) fn set_sample_rate(&self, sample_rate: u32) {
        self.state
            .sample_rate
            .store(sample_rate.max(1), Ordering::Release);
    }
}

/// cpal-backed clock: frames advance inside the render callback, so
/// `now()` tracks what the device has actually been asked to play.
pub struct DeviceClock {
    time: ClockTime,
    rack: Arc<Mutex<VoiceRack>>,
    output: Option<AudioOutput>,
}

impl DeviceClock {
    pub fn new(rack: Arc<Mutex<VoiceRack>>, sample_rate: u32) -> Self {
        Self {
            time: ClockTime::new(sample_rate),
            rack,
            output: None,
        }
    }
}

impl AudioClock for DeviceClock {
    fn time(&self) -> ClockTime {
        self.time.clone()
    }

    fn ensure_running(&mut self) -> Result<(), EngineError> {
        if self.output.is_none() {
            let output = AudioOutput::new(Arc::clone(&self.rack), self.time.clone())?;
            self.output = Some(output);
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.output = None;
    }
}

/// Caller-advanced clock for tests and headless use. Time only moves when
/// `advance` is called; the suspended flag models a platform that refuses
/// to run audio until a user gesture.
pub struct ManualClock {
    time: ClockTime,
    suspended: Arc<AtomicBool>,
}

/// Rate chosen so one frame is one microsecond.
const MANUAL_CLOCK_RATE: u32 = 1_000_000;

impl ManualClock {
    pub fn new() -> Self {
        Self {
            time: ClockTime::new(MANUAL_CLOCK_RATE),
            suspended: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A clock whose pipeline starts suspended; `ensure_running` fails
    /// with `NeedsUserInteraction` until the flag is cleared.
    pub fn suspended() -> Self {
        Self {
            time: ClockTime::new(MANUAL_CLOCK_RATE),
            suspended: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flag shared with the clock; clear it to simulate the user gesture
    /// that unblocks audio.
    pub fn suspend_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.suspended)
    }

    pub fn advance(&self, seconds: f64) {
        self.time
            .advance_frames((seconds * MANUAL_CLOCK_RATE as f64) as u64);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for ManualClock {
    fn time(&self) -> ClockTime {
        self.time.clone()
    }

    fn ensure_running(&mut self) -> Result<(), EngineError> {
        if self.suspended.load(Ordering::Acquire) {
            Err(EngineError::NeedsUserInteraction)
        } else {
            Ok(())
        }
    }

    fn dispose(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_is_monotonic_and_shared() {
        let clock = ManualClock::new();
        let a = clock.time();
        let b = clock.time();

        assert_eq!(a.now(), 0.0);
        clock.advance(0.5);
        assert_eq!(a.now(), 0.5);
        assert_eq!(b.now(), 0.5);

        clock.advance(0.25);
        assert!(a.now() > 0.5);
    }

    #[test]
    fn suspended_clock_gates_until_flag_cleared() {
        let mut clock = ManualClock::suspended();
        let flag = clock.suspend_flag();

        assert_eq!(
            clock.ensure_running(),
            Err(EngineError::NeedsUserInteraction)
        );

        flag.store(false, Ordering::Release);
        assert_eq!(clock.ensure_running(), Ok(()));
    }
}
