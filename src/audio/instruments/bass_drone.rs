use crate::audio::envelopes::GateEnvelope;
use crate::audio::filters::{FilterMode, SVF};
use crate::audio::oscillators::SineOscillator;
use crate::audio::{AudioGenerator, AudioProcessor};

/// Sustained backing pad on the harmonic root: two slightly detuned sines
/// through a lowpass. Started once per session, stopped explicitly.
pub struct BassDrone {
    oscillator: SineOscillator,
    detuned: SineOscillator,
    lowpass: SVF,
    gate: GateEnvelope,
    gain: f32,
}

impl BassDrone {
    pub fn new(sample_rate: f32) -> Self {
        let mut drone = Self {
            oscillator: SineOscillator::new(110.0, sample_rate),
            detuned: SineOscillator::new(110.5, sample_rate),
            lowpass: SVF::new(400.0, 0.707, FilterMode::Lowpass, sample_rate),
            gate: GateEnvelope::new(sample_rate),
            gain: 0.0,
        };

        // Slow swell in, gentle fade out
        drone.gate.set_attack_time(0.4);
        drone.gate.set_release_time(0.6);

        drone
    }

    pub fn start(&mut self, root_hz: f32, gain: f32) {
        self.oscillator.set_frequency(root_hz);
        self.detuned.set_frequency(root_hz * 1.004);
        self.gain = gain;
        self.gate.gate_on();
    }

    pub fn stop(&mut self) {
        self.gate.gate_off();
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }
}

impl AudioGenerator for BassDrone {
    fn next_sample(&mut self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }

        let env = self.gate.next_sample();
        let raw = self.oscillator.next_sample() + self.detuned.next_sample();
        self.lowpass.process(raw * 0.5) * env * self.gain * 0.4
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.oscillator.set_sample_rate(sample_rate);
        self.detuned.set_sample_rate(sample_rate);
        self.lowpass.set_sample_rate(sample_rate);
        self.gate.set_sample_rate(sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drone_sustains_until_stopped() {
        let mut drone = BassDrone::new(44_100.0);
        drone.start(110.0, 1.0);

        // Run two seconds; the drone must still be sounding.
        let mut late_peak = 0.0f32;
        for i in 0..88_200 {
            let sample = drone.next_sample().abs();
            if i > 80_000 {
                late_peak = late_peak.max(sample);
            }
        }
        assert!(drone.is_active());
        assert!(late_peak > 0.01, "drone faded on its own: {}", late_peak);

        drone.stop();
        let mut samples = 0;
        while drone.is_active() {
            drone.next_sample();
            samples += 1;
            assert!(samples < 100_000, "drone never released");
        }
        assert_eq!(drone.next_sample(), 0.0);
    }
}
