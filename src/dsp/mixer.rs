//! Mixer: sums overlapping cue tones into one output buffer.

/// Summing mixer over a growable buffer.
///
/// Samples whose magnitude stays within `knee` pass through untouched; louder
/// sums bend smoothly toward, but never past, full scale.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    pub knee: f64,
    buffer: Vec<f64>,
}

impl Mixer {
    pub fn new(master_gain: f64) -> Self {
        Mixer {
            master_gain,
            knee: 1.0,
            buffer: Vec::new(),
        }
    }

    /// Set the level above which overlapping voices are compressed.
    pub fn with_knee(mut self, knee: f64) -> Self {
        self.knee = knee.clamp(0.0, 1.0);
        self
    }

    /// Grow the buffer with silence so it holds at least `num_samples`.
    pub fn ensure_len(&mut self, num_samples: usize) {
        if self.buffer.len() < num_samples {
            self.buffer.resize(num_samples, 0.0);
        }
    }

    /// Add a sample at the given index; out-of-range indices are ignored.
    pub fn add(&mut self, index: usize, sample: f64) {
        if let Some(slot) = self.buffer.get_mut(index) {
            *slot += sample;
        }
    }

    /// Mixed output with master gain and soft clipping applied.
    pub fn output(&self) -> Vec<f64> {
        self.buffer
            .iter()
            .map(|&s| soft_clip(s * self.master_gain, self.knee))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Identity up to `knee`, then a tanh curve that approaches 1.0.
fn soft_clip(x: f64, knee: f64) -> f64 {
    let magnitude = x.abs();
    if magnitude <= knee {
        return x;
    }
    let headroom = 1.0 - knee;
    if headroom <= 0.0 {
        return x.clamp(-1.0, 1.0);
    }
    x.signum() * (knee + headroom * ((magnitude - knee) / headroom).tanh())
}
