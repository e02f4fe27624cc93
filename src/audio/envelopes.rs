use crate::audio::AudioGenerator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveType {
    Linear,
    Exponential,
    Logarithmic,
}

fn apply_curve(progress: f32, curve_type: CurveType) -> f32 {
    match curve_type {
        CurveType::Linear => progress,
        CurveType::Exponential => progress * progress,
        CurveType::Logarithmic => 1.0 - (1.0 - progress).powi(2),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EnvelopeState {
    Idle,
    Attack,
    Release,
}

/// Percussive attack/release envelope. Triggered sounds run attack to full
/// level, then decay to silence without a sustain stage.
pub struct AREnvelope {
    attack_time: f32,
    release_time: f32,
    attack_curve: CurveType,
    release_curve: CurveType,
    sample_rate: f32,

    state: EnvelopeState,
    current_level: f32,
    attack_samples: u32,
    release_samples: u32,
    current_sample: u32,
}

impl AREnvelope {
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            attack_time: 0.01,
            release_time: 0.1,
            attack_curve: CurveType::Logarithmic,
            release_curve: CurveType::Exponential,
            sample_rate,

            state: EnvelopeState::Idle,
            current_level: 0.0,
            attack_samples: 0,
            release_samples: 0,
            current_sample: 0,
        };
        env.calculate_parameters();
        env
    }

    pub fn set_attack_time(&mut self, time: f32) {
        self.attack_time = time.max(0.001);
        self.calculate_parameters();
    }

    pub fn set_release_time(&mut self, time: f32) {
        self.release_time = time.max(0.001);
        self.calculate_parameters();
    }

    pub fn set_attack_curve(&mut self, curve: CurveType) {
        self.attack_curve = curve;
    }

    pub fn set_release_curve(&mut self, curve: CurveType) {
        self.release_curve = curve;
    }

    fn calculate_parameters(&mut self) {
        self.attack_samples = (self.attack_time * self.sample_rate) as u32;
        self.release_samples = (self.release_time * self.sample_rate) as u32;
    }

    pub fn trigger(&mut self) {
        self.state = EnvelopeState::Attack;
        self.current_sample = 0;
        self.calculate_parameters();
    }

    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }
}

impl AudioGenerator for AREnvelope {
    fn next_sample(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => 0.0,

            EnvelopeState::Attack => {
                if self.current_sample >= self.attack_samples {
                    self.state = EnvelopeState::Release;
                    self.current_sample = 0;
                    self.current_level = 1.0;
                } else {
                    let progress = self.current_sample as f32 / self.attack_samples as f32;
                    self.current_level = apply_curve(progress, self.attack_curve);
                    self.current_sample += 1;
                }
                self.current_level
            }

            EnvelopeState::Release => {
                if self.current_sample >= self.release_samples {
                    self.state = EnvelopeState::Idle;
                    self.current_level = 0.0;
                } else {
                    let progress = self.current_sample as f32 / self.release_samples as f32;
                    self.current_level = 1.0 - apply_curve(progress, self.release_curve);
                    self.current_sample += 1;
                }
                self.current_level
            }
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.calculate_parameters();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GateState {
    Idle,
    Attack,
    Sustain,
    Release,
}

/// Gated attack/sustain/release envelope. Holds at full level until
/// explicitly released; used for sustained sounds like the bass drone.
pub struct GateEnvelope {
    attack_time: f32,
    release_time: f32,
    sample_rate: f32,

    state: GateState,
    current_level: f32,
    attack_samples: u32,
    release_samples: u32,
    current_sample: u32,
}

impl GateEnvelope {
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            attack_time: 0.2,
            release_time: 0.3,
            sample_rate,

            state: GateState::Idle,
            current_level: 0.0,
            attack_samples: 0,
            release_samples: 0,
            current_sample: 0,
        };
        env.calculate_parameters();
        env
    }

    pub fn set_attack_time(&mut self, time: f32) {
        self.attack_time = time.max(0.001);
        self.calculate_parameters();
    }

    pub fn set_release_time(&mut self, time: f32) {
        self.release_time = time.max(0.001);
        self.calculate_parameters();
    }

    fn calculate_parameters(&mut self) {
        self.attack_samples = (self.attack_time * self.sample_rate) as u32;
        self.release_samples = (self.release_time * self.sample_rate) as u32;
    }

    pub fn gate_on(&mut self) {
        self.state = GateState::Attack;
        self.current_sample = 0;
        self.calculate_parameters();
    }

    pub fn gate_off(&mut self) {
        if self.state == GateState::Attack || self.state == GateState::Sustain {
            self.state = GateState::Release;
            self.current_sample = 0;
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != GateState::Idle
    }
}

impl AudioGenerator for GateEnvelope {
    fn next_sample(&mut self) -> f32 {
        match self.state {
            GateState::Idle => 0.0,

            GateState::Attack => {
                if self.current_sample >= self.attack_samples {
                    self.state = GateState::Sustain;
                    self.current_level = 1.0;
                } else {
                    let progress = self.current_sample as f32 / self.attack_samples as f32;
                    self.current_level = apply_curve(progress, CurveType::Logarithmic);
                    self.current_sample += 1;
                }
                self.current_level
            }

            GateState::Sustain => 1.0,

            GateState::Release => {
                if self.current_sample >= self.release_samples {
                    self.state = GateState::Idle;
                    self.current_level = 0.0;
                } else {
                    let progress = self.current_sample as f32 / self.release_samples as f32;
                    // Capped at the level reached when the gate closed, so an
                    // early gate_off doesn't jump upward.
                    self.current_level = (1.0 - apply_curve(progress, CurveType::Exponential))
                        .min(self.current_level);
                    self.current_sample += 1;
                }
                self.current_level
            }
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.calculate_parameters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44_100.0;

    #[test]
    fn ar_envelope_runs_attack_then_release_to_silence() {
        let mut env = AREnvelope::new(SAMPLE_RATE);
        env.set_attack_time(0.01);
        env.set_release_time(0.02);

        assert_eq!(env.next_sample(), 0.0);
        assert!(!env.is_active());

        env.trigger();
        assert!(env.is_active());

        let mut max_level = 0.0f32;
        let mut samples = 0;
        while env.is_active() {
            let level = env.next_sample();
            assert!((0.0..=1.0).contains(&level));
            max_level = max_level.max(level);
            samples += 1;
            assert!(samples < 10_000, "envelope never finished");
        }

        let expected = ((0.01 + 0.02) * SAMPLE_RATE) as i32;
        assert!((samples - expected).abs() <= 2, "ran {} samples", samples);
        assert!((max_level - 1.0).abs() < 0.001);
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn ar_envelope_retrigger_restarts_attack() {
        let mut env = AREnvelope::new(SAMPLE_RATE);
        env.set_attack_time(0.01);
        env.set_release_time(0.01);

        env.trigger();
        for _ in 0..600 {
            env.next_sample();
        }
        env.trigger();
        // Right after a retrigger we are at the foot of the attack ramp.
        assert!(env.next_sample() < 0.1);
        assert!(env.is_active());
    }

    #[test]
    fn gate_envelope_sustains_until_released() {
        let mut env = GateEnvelope::new(SAMPLE_RATE);
        env.set_attack_time(0.005);
        env.set_release_time(0.01);

        env.gate_on();
        // Run well past the attack; level must hold at 1.0.
        for _ in 0..2000 {
            env.next_sample();
        }
        assert_eq!(env.next_sample(), 1.0);
        assert!(env.is_active());

        env.gate_off();
        let mut samples = 0;
        while env.is_active() {
            let level = env.next_sample();
            assert!((0.0..=1.0).contains(&level));
            samples += 1;
            assert!(samples < 10_000, "release never finished");
        }
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn gate_off_when_idle_is_a_no_op() {
        let mut env = GateEnvelope::new(SAMPLE_RATE);
        env.gate_off();
        assert!(!env.is_active());
        assert_eq!(env.next_sample(), 0.0);
    }
}
