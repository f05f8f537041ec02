use serde::{Deserialize, Serialize};

/// A semantic page occurrence derived from raw mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClassifiedEvent {
    /// A timeline item appeared. `size` is the serialized markup length.
    NewComment { text: String, size: usize },
    CommentEdited,
    CommentDeleted,
    MergeStatusItemAdded,
    MergeStatusChanged { status_text: String },
    PrStatusChanged { status_text: String },
}

impl ClassifiedEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClassifiedEvent::NewComment { .. } => "newComment",
            ClassifiedEvent::CommentEdited => "commentEdited",
            ClassifiedEvent::CommentDeleted => "commentDeleted",
            ClassifiedEvent::MergeStatusItemAdded => "mergeStatusItemAdded",
            ClassifiedEvent::MergeStatusChanged { .. } => "mergeStatusChanged",
            ClassifiedEvent::PrStatusChanged { .. } => "prStatusChanged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_tag_matches_name() {
        let events = [
            ClassifiedEvent::NewComment {
                text: "hi".to_string(),
                size: 2,
            },
            ClassifiedEvent::CommentDeleted,
            ClassifiedEvent::PrStatusChanged {
                status_text: "Merged".to_string(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["kind"], event.name());
        }
    }

    #[test]
    fn payload_fields_are_camel_case() {
        let json = serde_json::to_value(ClassifiedEvent::MergeStatusChanged {
            status_text: "success".to_string(),
        })
        .unwrap();
        assert_eq!(json["statusText"], "success");
    }
}
