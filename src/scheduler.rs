use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel;
use crossbeam::select;

use crate::audio::bank::SoundBank;
use crate::audio::clock::ClockTime;
use crate::events::SnapshotSender;
use crate::sequencing::{BeatPosition, BeatStateMachine};
use crate::session::SharedState;

/// Wall-time poll period. Coarse is fine: boundaries are pre-scheduled a
/// whole window ahead, so audio timing never rides on this interval.
pub const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How far ahead of the output clock boundaries are scheduled.
pub const SCHEDULE_AHEAD_SECS: f64 = 0.1;

/// Offset of the first boundary after start, so the opening accent is
/// guaranteed to land after `now()`.
pub const START_OFFSET_SECS: f64 = 0.05;

/// The control loop keeping audio gap-free on a coarse, non-real-time
/// polling mechanism: each pump schedules every boundary that falls inside
/// the lookahead window, advancing the beat state machine and reading the
/// live tempo for each boundary rather than a value captured at start.
pub struct LookaheadScheduler {
    beat: BeatStateMachine,
    bank: SoundBank,
    shared: Arc<SharedState>,
    snapshots: SnapshotSender,
    time: ClockTime,
    first_boundary: f64,
    last_boundary: Option<f64>,
}

impl LookaheadScheduler {
    pub fn new(
        time: ClockTime,
        bank: SoundBank,
        shared: Arc<SharedState>,
        snapshots: SnapshotSender,
        progression_len: usize,
    ) -> Self {
        let first_boundary = time.now() + START_OFFSET_SECS;
        Self {
            beat: BeatStateMachine::new(progression_len),
            bank,
            shared,
            snapshots,
            time,
            first_boundary,
            last_boundary: None,
        }
    }

    /// Schedule everything due inside the lookahead window. Never blocks.
    pub fn pump(&mut self) {
        let horizon = self.time.now() + SCHEDULE_AHEAD_SECS;
        loop {
            // Each boundary's distance from the previous one is derived
            // from the tempo as it is *now*, so a tempo change lands on
            // the next unscheduled boundary without a restart.
            let due = match self.last_boundary {
                Some(last) => last + 30.0 / self.shared.tempo_bpm() as f64,
                None => self.first_boundary,
            };
            if due >= horizon {
                break;
            }
            let position = self.beat.advance();
            self.emit(position, due);
            self.last_boundary = Some(due);
        }
    }

    fn emit(&mut self, position: BeatPosition, at: f64) {
        let volume = self.shared.volume();

        if self.shared.metronome_enabled() {
            self.bank.schedule_click(at, position.is_downbeat(), volume);
        }

        if self.shared.backing_track_enabled() {
            match position.subdivision {
                0 | 4 => self.bank.schedule_kick(at, volume),
                2 | 6 => self.bank.schedule_hi_hat(at, false, volume * 0.6),
                7 => self.bank.schedule_hi_hat(at, true, volume * 0.5),
                _ => {}
            }
        }

        self.shared.record_boundary(position, at);
        self.snapshots.send(self.shared.snapshot());
    }

    /// Move the scheduler onto its own poll thread. The first pump runs
    /// before the first tick so the opening boundary is committed
    /// immediately.
    pub fn spawn(mut self) -> SchedulerHandle {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let thread = thread::spawn(move || {
            self.pump();
            let ticker = channel::tick(POLL_INTERVAL);
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => self.pump(),
                }
            }
        });
        SchedulerHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        }
    }
}

/// Owner handle for a running scheduler thread.
pub struct SchedulerHandle {
    stop_tx: Option<channel::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop the poll loop and wait for it to exit. After this returns no
    /// further sound events or snapshot pushes occur; sound already
    /// committed to the render queue plays out naturally.
    pub fn stop(&mut self) {
        // Dropping the sender disconnects the channel, which wakes the
        // select immediately instead of waiting out the current tick.
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
