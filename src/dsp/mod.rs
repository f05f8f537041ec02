//! Tone rendering: oscillators, envelopes, the klaxon sweep, and the
//! offline sink that turns scheduled cues into samples.

pub mod alarm;
pub mod engine;
pub mod envelope;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
