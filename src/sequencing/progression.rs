use serde::{Deserialize, Serialize};

/// One chord of a practice progression. The root frequency drives the
/// backing-track drone; the name is only carried through for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub name: String,
    pub root_hz: f32,
}

impl Chord {
    pub fn new(name: impl Into<String>, root_hz: f32) -> Self {
        Self {
            name: name.into(),
            root_hz,
        }
    }
}

/// Read-only chord list supplied by curriculum data at session creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    chords: Vec<Chord>,
}

impl Progression {
    pub fn new(chords: Vec<Chord>) -> Self {
        Self { chords }
    }

    /// Curriculum data arrives from the app layer as JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn chord(&self, index: usize) -> Option<&Chord> {
        self.chords.get(index)
    }

    /// Root of the first chord; the drone's pitch for the whole session.
    pub fn first_root(&self) -> Option<f32> {
        self.chords.first().map(|chord| chord.root_hz)
    }
}
