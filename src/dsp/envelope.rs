//! Attack/release gain envelope for cue tones.

/// Linear ramp from silence to `peak` over `attack` seconds, then a linear
/// ramp back to silence that lands exactly at the end of the tone.
///
/// Both edges are ramps so tones never click on or off.
#[derive(Debug, Clone)]
pub struct ToneEnvelope {
    /// Peak gain reached at the end of the attack.
    pub peak: f64,
    /// Attack time in seconds.
    pub attack: f64,
    /// Total tone length in seconds (attack included).
    pub duration: f64,
    sample_rate: f64,
    counter: usize,
}

impl ToneEnvelope {
    pub fn new(peak: f64, attack: f64, duration: f64, sample_rate: f64) -> Self {
        ToneEnvelope {
            peak,
            attack,
            duration,
            sample_rate,
            counter: 0,
        }
    }

    /// Gain at `t` seconds after the tone starts.
    pub fn level_at(&self, t: f64) -> f64 {
        if t < 0.0 || t >= self.duration {
            return 0.0;
        }
        // Tones shorter than the attack never reach the peak.
        let attack = self.attack.min(self.duration);
        if t < attack {
            return self.peak * t / attack;
        }
        let release = self.duration - attack;
        if release <= 0.0 {
            return 0.0;
        }
        self.peak * (1.0 - (t - attack) / release)
    }

    /// Generate the next envelope sample.
    pub fn next_sample(&mut self) -> f64 {
        let t = self.counter as f64 / self.sample_rate;
        self.counter += 1;
        self.level_at(t)
    }

    /// Number of samples this envelope spans.
    pub fn len_samples(&self) -> usize {
        (self.duration * self.sample_rate).ceil() as usize
    }
}
