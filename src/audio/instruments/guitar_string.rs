use crate::audio::envelopes::{AREnvelope, CurveType};
use crate::audio::oscillators::SineOscillator;
use crate::audio::AudioGenerator;

/// Open-string frequencies for standard tuning, low E to high E.
pub const OPEN_STRING_HZ: [f32; 6] = [82.41, 110.00, 146.83, 196.00, 246.94, 329.63];

/// Frequency of `string_index` (0 = low E) fretted at `fret` semitones.
/// Returns `None` for a string index outside the six-string range.
pub fn string_frequency(string_index: u32, fret: u32) -> Option<f32> {
    let base = *OPEN_STRING_HZ.get(string_index as usize)?;
    Some(base * 2.0_f32.powf(fret as f32 / 12.0))
}

/// Plucked-note voice for demo playback: three harmonic partials under a
/// pluck envelope whose decay follows the requested note duration.
pub struct GuitarVoice {
    partials: [SineOscillator; 3],
    amp_envelope: AREnvelope,
    gain: f32,
}

impl GuitarVoice {
    pub fn new(sample_rate: f32) -> Self {
        let mut voice = Self {
            partials: [
                SineOscillator::new(110.0, sample_rate),
                SineOscillator::new(220.0, sample_rate),
                SineOscillator::new(330.0, sample_rate),
            ],
            amp_envelope: AREnvelope::new(sample_rate),
            gain: 0.0,
        };

        voice.amp_envelope.set_attack_time(0.005);
        voice.amp_envelope.set_attack_curve(CurveType::Logarithmic);
        voice.amp_envelope.set_release_curve(CurveType::Exponential);

        voice
    }

    pub fn pluck(&mut self, freq_hz: f32, duration: f32, gain: f32) {
        for (i, partial) in self.partials.iter_mut().enumerate() {
            partial.set_frequency(freq_hz * (i + 1) as f32);
            partial.reset();
        }
        self.amp_envelope.set_release_time(duration.max(0.05));
        self.gain = gain;
        self.amp_envelope.trigger();
    }

    pub fn is_active(&self) -> bool {
        self.amp_envelope.is_active()
    }
}

impl AudioGenerator for GuitarVoice {
    fn next_sample(&mut self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }

        let amp_env = self.amp_envelope.next_sample();
        let sample = self.partials[0].next_sample()
            + self.partials[1].next_sample() * 0.5
            + self.partials[2].next_sample() * 0.25;
        sample * amp_env * self.gain * 0.4
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        for partial in self.partials.iter_mut() {
            partial.set_sample_rate(sample_rate);
        }
        self.amp_envelope.set_sample_rate(sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_string_frequencies() {
        assert_eq!(string_frequency(0, 0), Some(82.41));
        assert_eq!(string_frequency(5, 0), Some(329.63));
        assert_eq!(string_frequency(6, 0), None);
    }

    #[test]
    fn fretting_raises_by_semitones() {
        // 12th fret doubles the open-string frequency
        let open = string_frequency(1, 0).unwrap();
        let octave = string_frequency(1, 12).unwrap();
        assert!((octave - open * 2.0).abs() < 0.01);

        // 5th fret of low E ≈ open A
        let fretted = string_frequency(0, 5).unwrap();
        assert!((fretted - 110.0).abs() < 0.2);
    }

    #[test]
    fn voice_duration_follows_pluck_request() {
        let run = |duration: f32| {
            let mut voice = GuitarVoice::new(44_100.0);
            voice.pluck(220.0, duration, 1.0);
            let mut samples = 0u32;
            while voice.is_active() {
                voice.next_sample();
                samples += 1;
                assert!(samples < 200_000, "voice never died out");
            }
            samples
        };

        assert!(run(0.8) > run(0.2) * 2);
    }
}
