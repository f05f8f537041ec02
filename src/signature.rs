//! Signature tones: a stable per-pull-request "who" prefix.
//!
//! Every cue starts with a short sine tone whose pitch is derived from the
//! subject identifier, so two open pull requests sound different.

/// Frequency used when no subject identifier is known (A4).
pub const DEFAULT_SIGNATURE_HZ: f64 = 440.0;

/// Lowest signature frequency (A3).
pub const SIGNATURE_FLOOR_HZ: f64 = 220.0;

/// Width of the signature band; frequencies stay below floor + span (C6-ish).
pub const SIGNATURE_SPAN_HZ: i64 = 880;

/// 32-bit polynomial rolling hash over UTF-16 code units.
///
/// `hash = hash * 31 + unit`, wrapped to the signed 32-bit range after
/// every step.
pub fn hash_code(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0_i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Derive the signature frequency for a subject.
///
/// Pure: the same identifier always yields the same pitch in
/// `[220, 1100)` Hz. `None` yields [`DEFAULT_SIGNATURE_HZ`].
pub fn signature_frequency(subject_id: Option<&str>) -> f64 {
    match subject_id {
        None => DEFAULT_SIGNATURE_HZ,
        Some(id) => {
            // Widen before abs(): i32::MIN has no positive counterpart.
            let hash = i64::from(hash_code(id)).abs();
            SIGNATURE_FLOOR_HZ + (hash % SIGNATURE_SPAN_HZ) as f64
        }
    }
}

/// Does the page path look like a pull request view?
pub fn is_pull_request_path(path: &str, marker: &str) -> bool {
    path.contains(marker)
}

/// Extract the numeric segment that follows `marker` in a page path.
///
/// `"/owner/repo/pull/42/files"` with marker `"/pull/"` gives `Some("42")`.
/// A marker followed by no digits gives `None`.
pub fn subject_from_path(path: &str, marker: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    let mut rest = path;
    while let Some(idx) = rest.find(marker) {
        let after = &rest[idx + marker.len()..];
        let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            return Some(digits);
        }
        rest = after;
    }
    None
}
