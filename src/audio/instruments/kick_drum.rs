use crate::audio::envelopes::{AREnvelope, CurveType};
use crate::audio::oscillators::SineOscillator;
use crate::audio::AudioGenerator;

/// Kick drum: sine oscillator with a fast downward frequency sweep.
pub struct KickDrum {
    oscillator: SineOscillator,
    amp_envelope: AREnvelope,
    freq_envelope: AREnvelope,
    base_frequency: f32,
    frequency_ratio: f32,
    gain: f32,
}

impl KickDrum {
    pub fn new(sample_rate: f32) -> Self {
        let mut kick = Self {
            oscillator: SineOscillator::new(60.0, sample_rate),
            amp_envelope: AREnvelope::new(sample_rate),
            freq_envelope: AREnvelope::new(sample_rate),
            base_frequency: 60.0,
            frequency_ratio: 7.0,
            gain: 0.0,
        };

        kick.amp_envelope.set_attack_time(0.005);
        kick.amp_envelope.set_release_time(0.2);
        kick.amp_envelope.set_attack_curve(CurveType::Logarithmic);
        kick.amp_envelope.set_release_curve(CurveType::Exponential);

        kick.freq_envelope.set_attack_time(0.002);
        kick.freq_envelope.set_release_time(0.05);
        kick.freq_envelope.set_attack_curve(CurveType::Exponential);
        kick.freq_envelope.set_release_curve(CurveType::Exponential);

        kick
    }

    pub fn trigger(&mut self, gain: f32) {
        self.gain = gain;
        self.amp_envelope.trigger();
        self.freq_envelope.trigger();
        self.oscillator.reset();
    }

    pub fn is_active(&self) -> bool {
        self.amp_envelope.is_active()
    }
}

impl AudioGenerator for KickDrum {
    fn next_sample(&mut self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }

        let amp_env = self.amp_envelope.next_sample();
        let freq_env = self.freq_envelope.next_sample();

        // Sweep from base_frequency * ratio down to base_frequency
        let start_freq = self.base_frequency * self.frequency_ratio;
        let current_freq = self.base_frequency + (freq_env * (start_freq - self.base_frequency));
        self.oscillator.set_frequency(current_freq);

        self.oscillator.next_sample() * amp_env * self.gain
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.oscillator.set_sample_rate(sample_rate);
        self.amp_envelope.set_sample_rate(sample_rate);
        self.freq_envelope.set_sample_rate(sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kick_produces_sound_then_decays() {
        let mut kick = KickDrum::new(44_100.0);
        assert_eq!(kick.next_sample(), 0.0);

        kick.trigger(1.0);
        let mut peak = 0.0f32;
        let mut samples = 0;
        while kick.is_active() {
            peak = peak.max(kick.next_sample().abs());
            samples += 1;
            assert!(samples < 20_000, "kick never died out");
        }

        assert!(peak > 0.1, "kick peak too quiet: {}", peak);
        assert_eq!(kick.next_sample(), 0.0);
    }
}
