//! Event encoder: classified events in, tone sequences out.
//!
//! Every cue except the build-deployed chord opens with the signature tone
//! (a sine at the subject's signature frequency), immediately followed by
//! the event's own sound. Status texts pick their sound from ordered keyword
//! tables: the text is trimmed and lowercased, and the first rule with any
//! matching keyword wins.

use log::debug;

use crate::config::AlertConfig;
use crate::dsp::engine::ToneRenderer;
use crate::dsp::oscillator::Waveform;
use crate::error::AudioError;
use crate::event::ClassifiedEvent;
use crate::signature::signature_frequency;
use crate::tone::{AlarmDescriptor, Sound, ToneDescriptor, ToneSequence};

/// Lowercased marker that turns a new comment into the celebration chord.
pub const BUILD_DEPLOYED_MARKER: &str = "pr is build and deployed:";

/// C major triad (C4, E4, G4).
pub const DEPLOY_CHORD_HZ: [f64; 3] = [261.63, 329.63, 392.00];
pub const DEPLOY_CHORD_SECONDS: f64 = 1.0;

/// Length of the signature tone that opens every other cue.
pub const SIGNATURE_SECONDS: f64 = 0.2;

/// The sound that follows the signature tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventSound {
    Tone {
        frequency: f64,
        duration: f64,
        waveform: Waveform,
    },
    Alarm,
}

const fn tone(frequency: f64, duration: f64, waveform: Waveform) -> EventSound {
    EventSound::Tone {
        frequency,
        duration,
        waveform,
    }
}

struct KeywordRule {
    keywords: &'static [&'static str],
    sound: EventSound,
}

const COMMENT_EDITED: EventSound = tone(440.0, 0.3, Waveform::Triangle);
const COMMENT_DELETED: EventSound = tone(329.63, 0.4, Waveform::Sawtooth);
const MERGE_STATUS_ITEM_ADDED: EventSound = tone(440.0, 0.3, Waveform::Square);

const MERGE_STATUS_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["success"],
        sound: tone(523.25, 0.5, Waveform::Sine),
    },
    KeywordRule {
        keywords: &["failure", "error", "failing"],
        sound: EventSound::Alarm,
    },
];
const MERGE_STATUS_FALLBACK: EventSound = tone(349.23, 0.2, Waveform::Triangle);

const PR_STATUS_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["open"],
        sound: tone(659.25, 0.6, Waveform::Sine),
    },
    KeywordRule {
        keywords: &["closed"],
        sound: tone(587.33, 0.6, Waveform::Square),
    },
    KeywordRule {
        keywords: &["merged"],
        sound: tone(698.46, 0.6, Waveform::Triangle),
    },
];
const PR_STATUS_FALLBACK: EventSound = tone(622.25, 0.4, Waveform::Sawtooth);

/// First rule whose keywords appear in the normalized status text.
fn match_status(text: &str, rules: &[KeywordRule], fallback: EventSound) -> EventSound {
    let normalized = text.trim().to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| normalized.contains(k)))
        .map_or(fallback, |rule| rule.sound)
}

/// Pitch and length of a new comment's tone, derived from its markup size.
pub fn comment_sound(size: usize) -> EventSound {
    tone(
        200.0 + (size % 1800) as f64,
        0.1 + (size % 2000) as f64 / 1000.0,
        Waveform::Sine,
    )
}

/// Encodes events with a configurable alarm length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Encoder {
    pub alarm_seconds: f64,
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder { alarm_seconds: 1.5 }
    }
}

impl Encoder {
    pub fn from_config(config: &AlertConfig) -> Self {
        Encoder {
            alarm_seconds: config.alarm_seconds,
        }
    }

    /// The sound an event maps to, or `None` for the deploy chord.
    pub fn event_sound(&self, event: &ClassifiedEvent) -> Option<EventSound> {
        let sound = match event {
            ClassifiedEvent::NewComment { text, size } => {
                if text.to_lowercase().contains(BUILD_DEPLOYED_MARKER) {
                    return None;
                }
                comment_sound(*size)
            }
            ClassifiedEvent::CommentEdited => COMMENT_EDITED,
            ClassifiedEvent::CommentDeleted => COMMENT_DELETED,
            // An added item sounds the same whatever its text says.
            ClassifiedEvent::MergeStatusItemAdded => MERGE_STATUS_ITEM_ADDED,
            ClassifiedEvent::MergeStatusChanged { status_text } => {
                match_status(status_text, MERGE_STATUS_RULES, MERGE_STATUS_FALLBACK)
            }
            ClassifiedEvent::PrStatusChanged { status_text } => {
                match_status(status_text, PR_STATUS_RULES, PR_STATUS_FALLBACK)
            }
        };
        Some(sound)
    }

    /// Encode an event for the given subject into a sequence starting at 0.
    pub fn encode(&self, event: &ClassifiedEvent, subject_id: Option<&str>) -> ToneSequence {
        let mut sequence = ToneSequence::new();

        let Some(sound) = self.event_sound(event) else {
            for frequency in DEPLOY_CHORD_HZ {
                sequence.push_tone(ToneDescriptor::new(
                    frequency,
                    DEPLOY_CHORD_SECONDS,
                    0.0,
                    Waveform::Sine,
                ));
            }
            return sequence;
        };

        sequence.push_tone(ToneDescriptor::new(
            signature_frequency(subject_id),
            SIGNATURE_SECONDS,
            0.0,
            Waveform::Sine,
        ));
        match sound {
            EventSound::Tone {
                frequency,
                duration,
                waveform,
            } => sequence.push_tone(ToneDescriptor::new(
                frequency,
                duration,
                SIGNATURE_SECONDS,
                waveform,
            )),
            EventSound::Alarm => sequence.push_alarm(AlarmDescriptor {
                duration: self.alarm_seconds,
                start_offset: SIGNATURE_SECONDS,
            }),
        }
        sequence
    }
}

/// Schedule every sound of `sequence` on `renderer`, relative to its clock.
///
/// Stops at the first sink failure; sounds already scheduled keep playing.
pub fn play<R: ToneRenderer + ?Sized>(
    sequence: &ToneSequence,
    renderer: &mut R,
) -> Result<(), AudioError> {
    let origin = renderer.current_time();
    for sound in &sequence.sounds {
        match sound {
            Sound::Tone(t) => {
                renderer.render_tone(t.frequency, t.duration, origin + t.start_offset, t.waveform)?
            }
            Sound::Alarm(a) => renderer.render_alarm(origin + a.start_offset, a.duration)?,
        }
    }
    debug!(
        "scheduled {} sound(s) at {origin}s: {}",
        sequence.len(),
        describe(sequence)
    );
    Ok(())
}

fn describe(sequence: &ToneSequence) -> String {
    sequence
        .sounds
        .iter()
        .map(|s| match s {
            Sound::Tone(t) => format!("{}Hz/{}s/{}", t.frequency, t.duration, t.waveform),
            Sound::Alarm(a) => format!("alarm/{}s", a.duration),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
