use crate::audio::envelopes::{AREnvelope, CurveType};
use crate::audio::oscillators::SineOscillator;
use crate::audio::AudioGenerator;

const BEAT_FREQUENCY: f32 = 880.0;
const ACCENT_FREQUENCY: f32 = 1320.0;

/// Metronome click: two sine partials (fundamental plus octave) under a
/// fast percussive envelope. The bar's first subdivision gets a higher,
/// louder accent variant.
pub struct Click {
    fundamental: SineOscillator,
    octave: SineOscillator,
    amp_envelope: AREnvelope,
    gain: f32,
}

impl Click {
    pub fn new(sample_rate: f32) -> Self {
        let mut click = Self {
            fundamental: SineOscillator::new(BEAT_FREQUENCY, sample_rate),
            octave: SineOscillator::new(BEAT_FREQUENCY * 2.0, sample_rate),
            amp_envelope: AREnvelope::new(sample_rate),
            gain: 0.0,
        };

        click.amp_envelope.set_attack_time(0.002);
        // Short decay keeps clicks percussive even at high tempo.
        click.amp_envelope.set_release_time(0.08);
        click.amp_envelope.set_attack_curve(CurveType::Logarithmic);
        click.amp_envelope.set_release_curve(CurveType::Exponential);

        click
    }

    pub fn trigger(&mut self, accent: bool, gain: f32) {
        let freq = if accent {
            ACCENT_FREQUENCY
        } else {
            BEAT_FREQUENCY
        };
        self.fundamental.set_frequency(freq);
        self.octave.set_frequency(freq * 2.0);
        self.gain = gain * if accent { 1.0 } else { 0.7 };

        self.fundamental.reset();
        self.octave.reset();
        self.amp_envelope.trigger();
    }

    pub fn is_active(&self) -> bool {
        self.amp_envelope.is_active()
    }
}

impl AudioGenerator for Click {
    fn next_sample(&mut self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }

        let amp_env = self.amp_envelope.next_sample();
        let sample = self.fundamental.next_sample() + self.octave.next_sample() * 0.5;
        sample * amp_env * self.gain * 0.6
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.fundamental.set_sample_rate(sample_rate);
        self.octave.set_sample_rate(sample_rate);
        self.amp_envelope.set_sample_rate(sample_rate);
    }
}
