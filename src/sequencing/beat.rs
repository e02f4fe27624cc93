/// Eighth-note slots in a four-beat bar.
pub const SUBDIVISIONS_PER_BAR: u32 = 8;

/// Counters for one eighth-note boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatPosition {
    /// Eighth-note slot within the bar, 0..=7.
    pub subdivision: u32,
    /// Beat within the bar, 1..=4. Derived: `subdivision / 2 + 1`.
    pub beat: u32,
    /// Completed-bar count, monotonically increasing while running.
    pub bar: u64,
    /// Index into the externally supplied chord list.
    pub chord_index: u32,
}

impl BeatPosition {
    /// First subdivision of the bar, rendered with the accented click.
    pub fn is_downbeat(&self) -> bool {
        self.subdivision == 0
    }
}

/// Subdivision/beat/bar/chord counters and their transition rules. The only
/// transition is "advance one eighth-note"; it is always defined and has no
/// terminal state. The first `advance()` yields the initial downbeat.
#[derive(Debug, Clone)]
pub struct BeatStateMachine {
    subdivision: u32,
    bar: u64,
    progression_len: u32,
    started: bool,
}

impl BeatStateMachine {
    pub fn new(progression_len: usize) -> Self {
        Self {
            subdivision: 0,
            bar: 0,
            progression_len: progression_len as u32,
            started: false,
        }
    }

    /// Step to the next boundary and return the position to play there.
    pub fn advance(&mut self) -> BeatPosition {
        if !self.started {
            self.started = true;
        } else {
            self.subdivision += 1;
            if self.subdivision == SUBDIVISIONS_PER_BAR {
                self.subdivision = 0;
                self.bar += 1;
            }
        }
        self.position()
    }

    /// Counters at the most recently advanced boundary.
    pub fn position(&self) -> BeatPosition {
        BeatPosition {
            subdivision: self.subdivision,
            beat: self.subdivision / 2 + 1,
            bar: self.bar,
            // With no chords supplied, chord advance is a no-op.
            chord_index: if self.progression_len == 0 {
                0
            } else {
                (self.bar % self.progression_len as u64) as u32
            },
        }
    }

    pub fn reset(&mut self) {
        self.subdivision = 0;
        self.bar = 0;
        self.started = false;
    }
}
