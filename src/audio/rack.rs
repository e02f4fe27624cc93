use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use crossbeam::queue::SegQueue;

use crate::audio::bank::{SoundEvent, SoundKind};
use crate::audio::instruments::{BassDrone, Click, GuitarVoice, HiHat, KickDrum};
use crate::audio::AudioGenerator;

#[derive(Clone, Copy)]
struct PendingEvent(SoundEvent);

impl PartialEq for PendingEvent {
    fn eq(&self, other: &Self) -> bool {
        self.0.time == other.0.time
    }
}

impl Eq for PendingEvent {}

impl PartialOrd for PendingEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.time.total_cmp(&other.0.time)
    }
}

/// Render-side consumer of scheduled sound events. Drains the queue into a
/// time-ordered pending heap, triggers voices when output time reaches each
/// event, and mixes everything to one sample. Small round-robin pools let
/// events of the same kind overlap without sharing synthesis state.
pub struct VoiceRack {
    queue: Arc<SegQueue<SoundEvent>>,
    pending: BinaryHeap<Reverse<PendingEvent>>,

    clicks: [Click; 2],
    next_click: usize,
    kick: KickDrum,
    hats: [HiHat; 2],
    next_hat: usize,
    drone: BassDrone,
    guitars: [GuitarVoice; 4],
    next_guitar: usize,
}

impl VoiceRack {
    pub fn new(queue: Arc<SegQueue<SoundEvent>>, sample_rate: f32) -> Self {
        Self {
            queue,
            pending: BinaryHeap::new(),

            clicks: [Click::new(sample_rate), Click::new(sample_rate)],
            next_click: 0,
            kick: KickDrum::new(sample_rate),
            hats: [HiHat::new(sample_rate), HiHat::new(sample_rate)],
            next_hat: 0,
            drone: BassDrone::new(sample_rate),
            guitars: [
                GuitarVoice::new(sample_rate),
                GuitarVoice::new(sample_rate),
                GuitarVoice::new(sample_rate),
                GuitarVoice::new(sample_rate),
            ],
            next_guitar: 0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for click in self.clicks.iter_mut() {
            click.set_sample_rate(sample_rate);
        }
        self.kick.set_sample_rate(sample_rate);
        for hat in self.hats.iter_mut() {
            hat.set_sample_rate(sample_rate);
        }
        self.drone.set_sample_rate(sample_rate);
        for guitar in self.guitars.iter_mut() {
            guitar.set_sample_rate(sample_rate);
        }
    }

    fn trigger(&mut self, event: SoundEvent) {
        match event.kind {
            SoundKind::Click { accent } => {
                self.clicks[self.next_click].trigger(accent, event.gain);
                self.next_click = (self.next_click + 1) % self.clicks.len();
            }
            SoundKind::Kick => self.kick.trigger(event.gain),
            SoundKind::HiHat { open } => {
                self.hats[self.next_hat].trigger(open, event.gain);
                self.next_hat = (self.next_hat + 1) % self.hats.len();
            }
            SoundKind::BassOn { root_hz } => self.drone.start(root_hz, event.gain),
            SoundKind::BassOff => self.drone.stop(),
            SoundKind::GuitarNote { freq_hz, duration } => {
                self.guitars[self.next_guitar].pluck(freq_hz, duration, event.gain);
                self.next_guitar = (self.next_guitar + 1) % self.guitars.len();
            }
        }
    }

    /// Render one mono sample at output time `now` (seconds).
    pub fn next_sample(&mut self, now: f64) -> f32 {
        while let Some(event) = self.queue.pop() {
            self.pending.push(Reverse(PendingEvent(event)));
        }

        while self
            .pending
            .peek()
            .map_or(false, |Reverse(next)| next.0.time <= now)
        {
            if let Some(Reverse(due)) = self.pending.pop() {
                self.trigger(due.0);
            }
        }

        let mut mix = 0.0;
        for click in self.clicks.iter_mut() {
            mix += click.next_sample();
        }
        mix += self.kick.next_sample();
        for hat in self.hats.iter_mut() {
            mix += hat.next_sample();
        }
        mix += self.drone.next_sample();
        for guitar in self.guitars.iter_mut() {
            mix += guitar.next_sample();
        }
        mix
    }
}
