//! Alert configuration: page selectors, tracked attributes, and audio
//! settings. Every field has a default, so hosts may pass a partial object.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mutation::Selector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertConfig {
    /// Discussion region holding the timeline.
    pub discussion_selector: String,
    /// A timeline entry (comment, review, event).
    pub timeline_item_selector: String,
    /// The container removed when a comment is deleted.
    pub comment_container_selector: String,
    pub merge_status_list_selector: String,
    pub merge_status_item_selector: String,
    /// The open/closed/merged badge.
    pub pr_status_selector: String,

    /// Attribute bumped when a comment body is edited.
    pub body_version_attribute: String,
    /// Attribute watched on merge-status items and the status badge.
    pub status_class_attribute: String,

    /// Path segment preceding the pull request number.
    pub path_marker: String,

    pub sample_rate: f64,
    pub peak_gain: f64,
    pub attack_seconds: f64,
    pub alarm_seconds: f64,
    pub alarm_rate_hz: f64,
    /// How far ahead of the sink clock a voice may end.
    pub max_schedule_seconds: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        AlertConfig {
            discussion_selector: ".js-discussion".to_string(),
            timeline_item_selector: ".js-timeline-item".to_string(),
            comment_container_selector: ".js-comment-container".to_string(),
            merge_status_list_selector: ".merge-status-list".to_string(),
            merge_status_item_selector: ".merge-status-item".to_string(),
            pr_status_selector: "span.State".to_string(),
            body_version_attribute: "data-body-version".to_string(),
            status_class_attribute: "class".to_string(),
            path_marker: "/pull/".to_string(),
            sample_rate: 44100.0,
            peak_gain: 0.5,
            attack_seconds: 0.01,
            alarm_seconds: 1.5,
            alarm_rate_hz: 4.0,
            max_schedule_seconds: 30.0,
        }
    }
}

/// Selectors parsed once from an [`AlertConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct Selectors {
    pub timeline_item: Selector,
    pub comment_container: Selector,
    pub merge_status_item: Selector,
    pub pr_status: Selector,
}

impl AlertConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AlertConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("sampleRate", self.sample_rate),
            ("attackSeconds", self.attack_seconds),
            ("alarmSeconds", self.alarm_seconds),
            ("alarmRateHz", self.alarm_rate_hz),
            ("maxScheduleSeconds", self.max_schedule_seconds),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if !(0.0..=1.0).contains(&self.peak_gain) {
            return Err(ConfigError::Invalid(format!(
                "peakGain must be within [0, 1], got {}",
                self.peak_gain
            )));
        }
        if self.path_marker.is_empty() {
            return Err(ConfigError::Invalid("pathMarker must not be empty".to_string()));
        }
        if self.body_version_attribute.is_empty() || self.status_class_attribute.is_empty() {
            return Err(ConfigError::Invalid("tracked attribute names must not be empty".to_string()));
        }
        // Region selectors are handed to the host as-is but must still parse.
        parse_selector("discussionSelector", &self.discussion_selector)?;
        parse_selector("mergeStatusListSelector", &self.merge_status_list_selector)?;
        self.selectors().map(|_| ())
    }

    /// Selectors the classifier matches records against.
    pub fn selectors(&self) -> Result<Selectors, ConfigError> {
        Ok(Selectors {
            timeline_item: parse_selector("timelineItemSelector", &self.timeline_item_selector)?,
            comment_container: parse_selector(
                "commentContainerSelector",
                &self.comment_container_selector,
            )?,
            merge_status_item: parse_selector(
                "mergeStatusItemSelector",
                &self.merge_status_item_selector,
            )?,
            pr_status: parse_selector("prStatusSelector", &self.pr_status_selector)?,
        })
    }
}

fn parse_selector(field: &'static str, text: &str) -> Result<Selector, ConfigError> {
    Selector::parse(text).map_err(|error| ConfigError::Selector { field, error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SelectorError;

    #[test]
    fn defaults_are_valid() {
        let config = AlertConfig::default();
        assert!(config.validate().is_ok());
        let selectors = config.selectors().unwrap();
        assert_eq!(selectors.pr_status.tag.as_deref(), Some("span"));
        assert_eq!(selectors.pr_status.classes, vec!["State".to_string()]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AlertConfig::from_json(r#"{ "sampleRate": 22050, "pathMarker": "/merge_requests/" }"#)
            .unwrap();
        assert_eq!(config.sample_rate, 22050.0);
        assert_eq!(config.path_marker, "/merge_requests/");
        assert_eq!(config.timeline_item_selector, ".js-timeline-item");
        assert_eq!(config.alarm_seconds, 1.5);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AlertConfig::from_json(r#"{ "sampleRate": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AlertConfig::from_json(r#"{ "peakGain": 2.0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AlertConfig::from_json(r#"{ "pathMarker": "" }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(AlertConfig::from_json("not json"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn rejects_bad_region_selector() {
        assert!(matches!(
            AlertConfig::from_json(r#"{ "discussionSelector": "" }"#),
            Err(ConfigError::Selector {
                field: "discussionSelector",
                error: SelectorError::Empty,
            })
        ));
    }

    #[test]
    fn rejects_bad_selector() {
        let err = AlertConfig::from_json(r#"{ "mergeStatusItemSelector": "div > .x" }"#).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Selector {
                field: "mergeStatusItemSelector",
                error: SelectorError::UnexpectedChar { ch: ' ', pos: 3 },
            }
        );
    }
}
