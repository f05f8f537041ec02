//! Tone sink: the renderer seam and an offline implementation.
//!
//! [`ToneRenderer`] is the capability the encoder plays through. It schedules
//! tones against the sink's clock and returns immediately; audio is produced
//! later on the sink's own timeline.
//!
//! [`OfflineSink`] keeps scheduled voices on a sample clock and renders them
//! into a buffer on demand, which the host hands to its audio output.

use log::debug;

use crate::config::AlertConfig;
use crate::error::AudioError;

use super::alarm::{ALARM_LOW_HZ, ALARM_WAVEFORM, alarm_frequency_at};
use super::envelope::ToneEnvelope;
use super::mixer::Mixer;
use super::oscillator::{Oscillator, Waveform};

/// Something that can schedule tones on a shared audio clock.
pub trait ToneRenderer {
    /// The sink's clock, in seconds. Sequences are scheduled relative to it.
    fn current_time(&self) -> f64;

    /// Schedule one enveloped tone starting at `start_time`.
    fn render_tone(
        &mut self,
        frequency: f64,
        duration: f64,
        start_time: f64,
        waveform: Waveform,
    ) -> Result<(), AudioError>;

    /// Schedule the 440/880 Hz sawtooth klaxon starting at `start_time`.
    fn render_alarm(&mut self, start_time: f64, duration: f64) -> Result<(), AudioError>;

    /// Release the sink at session end. Later scheduling may fail.
    fn close(&mut self) {}
}

/// What a scheduled voice plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceKind {
    Tone { frequency: f64, waveform: Waveform },
    Alarm,
}

/// A voice waiting in the sink's queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledVoice {
    pub kind: VoiceKind,
    /// Absolute start on the sink clock, in seconds.
    pub start_time: f64,
    pub duration: f64,
}

/// Renders scheduled voices into a mono sample buffer.
#[derive(Debug, Clone)]
pub struct OfflineSink {
    pub sample_rate: f64,
    pub peak_gain: f64,
    pub attack: f64,
    pub alarm_rate: f64,
    /// Furthest a voice may end past the clock, in seconds.
    pub horizon: f64,
    clock: f64,
    queue: Vec<ScheduledVoice>,
    closed: bool,
}

impl OfflineSink {
    pub fn new(sample_rate: f64) -> Self {
        Self::from_config(&AlertConfig {
            sample_rate,
            ..AlertConfig::default()
        })
    }

    pub fn from_config(config: &AlertConfig) -> Self {
        OfflineSink {
            sample_rate: config.sample_rate,
            peak_gain: config.peak_gain,
            attack: config.attack_seconds,
            alarm_rate: config.alarm_rate_hz,
            horizon: config.max_schedule_seconds,
            clock: 0.0,
            queue: Vec::new(),
            closed: false,
        }
    }

    /// Voices scheduled since the last [`take_samples`](Self::take_samples).
    pub fn pending(&self) -> &[ScheduledVoice] {
        &self.queue
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn validate(&self, frequency: f64, duration: f64, start_time: f64) -> Result<(), AudioError> {
        if self.closed {
            return Err(AudioError::Closed);
        }
        let valid = frequency.is_finite()
            && frequency > 0.0
            && duration.is_finite()
            && duration > 0.0
            && start_time.is_finite()
            && start_time >= 0.0;
        if !valid {
            return Err(AudioError::InvalidTone {
                frequency,
                duration,
                start: start_time,
            });
        }
        let requested = start_time.max(self.clock) + duration - self.clock;
        if requested > self.horizon {
            return Err(AudioError::BufferOverflow {
                requested_seconds: requested,
                limit_seconds: self.horizon,
            });
        }
        Ok(())
    }

    fn schedule(&mut self, kind: VoiceKind, start_time: f64, duration: f64) {
        // Late starts play immediately, like a live audio clock.
        let start_time = start_time.max(self.clock);
        self.queue.push(ScheduledVoice {
            kind,
            start_time,
            duration,
        });
    }

    /// Render every pending voice into mono samples, starting at the clock.
    pub fn render(&self) -> Vec<f64> {
        // A lone voice never exceeds the peak gain, so only overlaps are shaped.
        let mut mixer = Mixer::new(1.0).with_knee(self.peak_gain);
        for voice in &self.queue {
            let offset = ((voice.start_time - self.clock) * self.sample_rate).round() as usize;
            let mut envelope =
                ToneEnvelope::new(self.peak_gain, self.attack, voice.duration, self.sample_rate);
            let len = envelope.len_samples();
            mixer.ensure_len(offset + len);

            let mut osc = match voice.kind {
                VoiceKind::Tone {
                    frequency,
                    waveform,
                } => Oscillator::new(waveform, frequency, self.sample_rate),
                VoiceKind::Alarm => Oscillator::new(ALARM_WAVEFORM, ALARM_LOW_HZ, self.sample_rate),
            };
            for i in 0..len {
                if voice.kind == VoiceKind::Alarm {
                    osc.frequency = alarm_frequency_at(i as f64 / self.sample_rate, self.alarm_rate);
                }
                let sample = osc.next_sample() * envelope.next_sample();
                mixer.add(offset + i, sample);
            }
        }
        mixer.output()
    }

    /// Render pending voices as f32, clear the queue, and advance the clock
    /// past the rendered audio.
    pub fn take_samples(&mut self) -> Vec<f32> {
        let samples = self.render();
        self.clock += samples.len() as f64 / self.sample_rate;
        self.queue.clear();
        samples.iter().map(|&s| s as f32).collect()
    }

    /// Render pending voices to 16-bit PCM without consuming them.
    pub fn render_pcm_i16(&self) -> Vec<i16> {
        self.render()
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f64) as i16)
            .collect()
    }
}

impl ToneRenderer for OfflineSink {
    fn current_time(&self) -> f64 {
        self.clock
    }

    fn render_tone(
        &mut self,
        frequency: f64,
        duration: f64,
        start_time: f64,
        waveform: Waveform,
    ) -> Result<(), AudioError> {
        self.validate(frequency, duration, start_time)?;
        debug!("tone {frequency}Hz {duration}s {waveform} at {start_time}s");
        self.schedule(
            VoiceKind::Tone {
                frequency,
                waveform,
            },
            start_time,
            duration,
        );
        Ok(())
    }

    fn render_alarm(&mut self, start_time: f64, duration: f64) -> Result<(), AudioError> {
        self.validate(ALARM_LOW_HZ, duration, start_time)?;
        debug!("alarm {duration}s at {start_time}s");
        self.schedule(VoiceKind::Alarm, start_time, duration);
        Ok(())
    }

    /// Stop accepting voices. Already queued voices can still be rendered.
    fn close(&mut self) {
        self.closed = true;
    }
}
