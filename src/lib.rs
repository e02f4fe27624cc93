//! Real-time practice playback engine: metronome click, synthesized
//! backing track and tempo-locked beat/chord counters for guitar-practice
//! screens. Screens drive a [`PlaybackController`] and render its
//! [`Snapshot`]s; everything time-critical lives behind it.

pub mod audio;
pub mod controller;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod sequencing;
pub mod session;

pub use audio::bank::{SoundBank, SoundEvent, SoundKind};
pub use audio::clock::{AudioClock, ClockTime, DeviceClock, ManualClock};
pub use controller::{DemoNote, PlaybackController};
pub use error::EngineError;
pub use events::SnapshotReceiver;
pub use sequencing::{Chord, Progression};
pub use session::{SessionConfig, Snapshot, MAX_TEMPO_BPM, MIN_TEMPO_BPM};
