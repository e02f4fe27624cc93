pub mod beat;
pub mod progression;

pub use beat::{BeatPosition, BeatStateMachine, SUBDIVISIONS_PER_BAR};
pub use progression::{Chord, Progression};
