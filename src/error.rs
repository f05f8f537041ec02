use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AlertError {
    Audio(AudioError),
    Config(ConfigError),
    Decode(String),
}

/// Failures raised by a tone sink while scheduling.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    InvalidTone { frequency: f64, duration: f64, start: f64 },
    BufferOverflow { requested_seconds: f64, limit_seconds: f64 },
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectorError {
    Empty,
    UnexpectedChar { ch: char, pos: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Json(String),
    Selector { field: &'static str, error: SelectorError },
    Invalid(String),
}

impl fmt::Display for AlertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertError::Audio(e) => write!(f, "Audio error: {e}"),
            AlertError::Config(e) => write!(f, "Config error: {e}"),
            AlertError::Decode(msg) => write!(f, "Decode error: {msg}"),
        }
    }
}

impl std::error::Error for AlertError {}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::InvalidTone {
                frequency,
                duration,
                start,
            } => write!(
                f,
                "Invalid tone {frequency}Hz for {duration}s starting at {start}s"
            ),
            AudioError::BufferOverflow {
                requested_seconds,
                limit_seconds,
            } => write!(
                f,
                "Tone ends at {requested_seconds}s, past the {limit_seconds}s schedule horizon"
            ),
            AudioError::Closed => write!(f, "Audio sink is closed"),
        }
    }
}

impl std::error::Error for AudioError {}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorError::Empty => write!(f, "Empty selector"),
            SelectorError::UnexpectedChar { ch, pos } => {
                write!(f, "Unexpected char '{ch}' in selector at pos {pos}")
            }
        }
    }
}

impl std::error::Error for SelectorError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(msg) => write!(f, "Invalid config JSON: {msg}"),
            ConfigError::Selector { field, error } => write!(f, "Bad selector for {field}: {error}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<AudioError> for AlertError {
    fn from(e: AudioError) -> Self {
        AlertError::Audio(e)
    }
}

impl From<ConfigError> for AlertError {
    fn from(e: ConfigError) -> Self {
        AlertError::Config(e)
    }
}
