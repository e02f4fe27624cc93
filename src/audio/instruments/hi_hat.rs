use crate::audio::envelopes::{AREnvelope, CurveType};
use crate::audio::filters::{FilterMode, SVF};
use crate::audio::oscillators::NoiseGenerator;
use crate::audio::{AudioGenerator, AudioProcessor};

const CLOSED_LENGTH: f32 = 0.05;
const OPEN_LENGTH: f32 = 0.25;

/// Hi-hat: noise through three bandpass filters, saturated. An open hit
/// simply lengthens the decay.
pub struct HiHat {
    noise_generator: NoiseGenerator,

    // Three bandpass filters at different frequencies
    filter_7500: SVF,
    filter_7000: SVF,
    filter_8000: SVF,

    amp_envelope: AREnvelope,
    gain: f32,
}

impl HiHat {
    pub fn new(sample_rate: f32) -> Self {
        let mut hihat = Self {
            noise_generator: NoiseGenerator::new(),

            // Q ≈ center_freq / bandwidth; for BW = 0.3 * center, Q ≈ 3.33
            filter_7500: SVF::new(7500.0, 3.33, FilterMode::Bandpass, sample_rate),
            filter_7000: SVF::new(7000.0, 3.33, FilterMode::Bandpass, sample_rate),
            filter_8000: SVF::new(8000.0, 3.33, FilterMode::Bandpass, sample_rate),

            amp_envelope: AREnvelope::new(sample_rate),
            gain: 0.0,
        };

        hihat.amp_envelope.set_attack_time(0.001);
        hihat.amp_envelope.set_attack_curve(CurveType::Logarithmic);
        hihat.amp_envelope.set_release_curve(CurveType::Exponential);
        hihat.amp_envelope.set_release_time(CLOSED_LENGTH);

        hihat
    }

    pub fn trigger(&mut self, open: bool, gain: f32) {
        let length = if open { OPEN_LENGTH } else { CLOSED_LENGTH };
        self.amp_envelope.set_release_time(length - 0.001);
        self.gain = gain;
        self.amp_envelope.trigger();
    }

    pub fn is_active(&self) -> bool {
        self.amp_envelope.is_active()
    }
}

impl AudioGenerator for HiHat {
    fn next_sample(&mut self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }

        let noise = self.noise_generator.next_sample();

        let filtered_7500 = self.filter_7500.process(noise);
        let filtered_7000 = self.filter_7000.process(noise);
        let filtered_8000 = self.filter_8000.process(noise);

        let filtered_sum = filtered_7500 + filtered_7000 + filtered_8000;

        // tanh keeps the summed bands from spiking
        let saturated = filtered_sum.tanh() * 0.33;

        let amp_env = self.amp_envelope.next_sample();
        saturated * amp_env * self.gain
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.noise_generator.set_sample_rate(sample_rate);
        self.filter_7500.set_sample_rate(sample_rate);
        self.filter_7000.set_sample_rate(sample_rate);
        self.filter_8000.set_sample_rate(sample_rate);
        self.amp_envelope.set_sample_rate(sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_samples(open: bool) -> u32 {
        let mut hat = HiHat::new(44_100.0);
        hat.trigger(open, 1.0);
        let mut samples = 0;
        while hat.is_active() {
            hat.next_sample();
            samples += 1;
            assert!(samples < 50_000, "hi-hat never died out");
        }
        samples
    }

    #[test]
    fn open_hat_rings_longer_than_closed() {
        assert!(active_samples(true) > active_samples(false) * 2);
    }

    #[test]
    fn hat_is_silent_when_idle() {
        let mut hat = HiHat::new(44_100.0);
        for _ in 0..100 {
            assert_eq!(hat.next_sample(), 0.0);
        }
    }
}
