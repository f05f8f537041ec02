//! Klaxon alarm: a sawtooth whose pitch sweeps between two frequencies.

use super::oscillator::Waveform;

pub const ALARM_LOW_HZ: f64 = 440.0;
pub const ALARM_HIGH_HZ: f64 = 880.0;
pub const ALARM_WAVEFORM: Waveform = Waveform::Sawtooth;

/// Instantaneous alarm frequency `t` seconds after the alarm starts.
///
/// One sweep cycle lasts `1 / rate_hz` seconds: linear rise from
/// [`ALARM_LOW_HZ`] to [`ALARM_HIGH_HZ`] over the first half, linear fall
/// back over the second. The last cycle may be cut short by the alarm's
/// duration.
pub fn alarm_frequency_at(t: f64, rate_hz: f64) -> f64 {
    if t <= 0.0 || rate_hz <= 0.0 {
        return ALARM_LOW_HZ;
    }
    let phase = (t * rate_hz).fract();
    let span = ALARM_HIGH_HZ - ALARM_LOW_HZ;
    if phase < 0.5 {
        ALARM_LOW_HZ + span * phase * 2.0
    } else {
        ALARM_HIGH_HZ - span * (phase - 0.5) * 2.0
    }
}
