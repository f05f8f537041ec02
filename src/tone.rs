//! Tone descriptors and sequences produced by the encoder.

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;

/// One fully specified tone, scheduled relative to a sequence origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneDescriptor {
    /// Hz, positive.
    pub frequency: f64,
    /// Seconds, positive.
    pub duration: f64,
    /// Seconds after the sequence origin, non-negative.
    pub start_offset: f64,
    pub waveform: Waveform,
}

impl ToneDescriptor {
    pub fn new(frequency: f64, duration: f64, start_offset: f64, waveform: Waveform) -> Self {
        ToneDescriptor {
            frequency,
            duration,
            start_offset,
            waveform,
        }
    }
}

/// The klaxon alarm used for failing merge checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmDescriptor {
    pub duration: f64,
    pub start_offset: f64,
}

/// A single scheduled sound: a plain tone or the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Sound {
    Tone(ToneDescriptor),
    Alarm(AlarmDescriptor),
}


/// Ordered sounds sharing one scheduling origin. Order is playback order;
/// overlaps are allowed and play simultaneously.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneSequence {
    pub sounds: Vec<Sound>,
}

impl ToneSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_tone(&mut self, tone: ToneDescriptor) {
        self.sounds.push(Sound::Tone(tone));
    }

    pub fn push_alarm(&mut self, alarm: AlarmDescriptor) {
        self.sounds.push(Sound::Alarm(alarm));
    }

    /// Plain tones, in order; alarms are skipped.
    pub fn tones(&self) -> impl Iterator<Item = &ToneDescriptor> {
        self.sounds.iter().filter_map(|s| match s {
            Sound::Tone(t) => Some(t),
            Sound::Alarm(_) => None,
        })
    }

    pub fn has_alarm(&self) -> bool {
        self.sounds.iter().any(|s| matches!(s, Sound::Alarm(_)))
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_sequence_keeps_order() {
        let mut seq = ToneSequence::new();
        seq.push_tone(ToneDescriptor::new(500.0, 0.2, 0.0, Waveform::Sine));
        seq.push_alarm(AlarmDescriptor {
            duration: 1.5,
            start_offset: 0.2,
        });
        seq.push_tone(ToneDescriptor::new(300.0, 0.1, 0.0, Waveform::Sine));
        assert_eq!(seq.len(), 3);
        assert!(matches!(seq.sounds[1], Sound::Alarm(_)));
        assert!(seq.has_alarm());
        assert_eq!(seq.tones().count(), 2);
    }

    #[test]
    fn sound_json_shape() {
        let sound = Sound::Tone(ToneDescriptor::new(440.0, 0.3, 0.2, Waveform::Triangle));
        let json = serde_json::to_value(sound).unwrap();
        assert_eq!(json["type"], "tone");
        assert_eq!(json["waveform"], "triangle");
        assert_eq!(json["startOffset"], 0.2);
    }
}
