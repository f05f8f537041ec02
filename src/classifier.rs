//! Change classifier: raw mutation batches in, semantic events out.
//!
//! Each region has an ordered list of rules. Every record in a batch is
//! offered to every rule of its region in table order, and the events the
//! rules produce are concatenated. Records no rule recognizes produce
//! nothing; malformed records (an edit with no comment ancestor, a text
//! node where an element was expected) are dropped the same way.

use crate::config::{AlertConfig, Selectors};
use crate::error::ConfigError;
use crate::event::ClassifiedEvent;
use crate::mutation::{MutationBatch, MutationRecord, Region};

type RuleFn = fn(&Classifier, &MutationRecord) -> Vec<ClassifiedEvent>;

struct Rule {
    region: Region,
    name: &'static str,
    apply: RuleFn,
}

/// Rule table. Order within a region is emission order for a record.
const RULES: &[Rule] = &[
    Rule {
        region: Region::Discussion,
        name: "timeline item added",
        apply: Classifier::timeline_item_added,
    },
    Rule {
        region: Region::Discussion,
        name: "comment container removed",
        apply: Classifier::comment_container_removed,
    },
    Rule {
        region: Region::Discussion,
        name: "comment body changed",
        apply: Classifier::comment_body_changed,
    },
    Rule {
        region: Region::MergeStatus,
        name: "merge status item added",
        apply: Classifier::merge_status_item_added,
    },
    Rule {
        region: Region::MergeStatus,
        name: "merge status item changed",
        apply: Classifier::merge_status_item_changed,
    },
    Rule {
        region: Region::PrStatus,
        name: "status badge class changed",
        apply: Classifier::pr_status_changed,
    },
];

/// Stateless classifier over parsed selectors and tracked attribute names.
#[derive(Debug, Clone)]
pub struct Classifier {
    selectors: Selectors,
    body_version_attribute: String,
    status_class_attribute: String,
}

impl Classifier {
    pub fn new(config: &AlertConfig) -> Result<Self, ConfigError> {
        Ok(Classifier {
            selectors: config.selectors()?,
            body_version_attribute: config.body_version_attribute.clone(),
            status_class_attribute: config.status_class_attribute.clone(),
        })
    }

    /// Classify one batch. Pure: the same batch always yields the same events.
    pub fn classify(&self, batch: &MutationBatch) -> Vec<ClassifiedEvent> {
        let mut events = Vec::new();
        for record in &batch.records {
            for rule in RULES.iter().filter(|r| r.region == batch.region) {
                let produced = (rule.apply)(self, record);
                if !produced.is_empty() {
                    log::debug!("{}: {} event(s)", rule.name, produced.len());
                }
                events.extend(produced);
            }
        }
        events
    }

    fn timeline_item_added(&self, record: &MutationRecord) -> Vec<ClassifiedEvent> {
        record
            .added_matching(&self.selectors.timeline_item)
            .map(|item| ClassifiedEvent::NewComment {
                text: item.text_content.clone(),
                size: item.content_size(),
            })
            .collect()
    }

    fn comment_container_removed(&self, record: &MutationRecord) -> Vec<ClassifiedEvent> {
        let removed = record.removed_matching(&self.selectors.comment_container);
        vec![ClassifiedEvent::CommentDeleted; removed]
    }

    fn comment_body_changed(&self, record: &MutationRecord) -> Vec<ClassifiedEvent> {
        let tracked = match record {
            MutationRecord::CharacterData { .. } => true,
            MutationRecord::Attributes { attribute_name, .. } => {
                *attribute_name == self.body_version_attribute
            }
            MutationRecord::ChildList { .. } => false,
        };
        if tracked && record.closest(&self.selectors.timeline_item).is_some() {
            vec![ClassifiedEvent::CommentEdited]
        } else {
            Vec::new()
        }
    }

    fn merge_status_item_added(&self, record: &MutationRecord) -> Vec<ClassifiedEvent> {
        record
            .added_matching(&self.selectors.merge_status_item)
            .map(|_| ClassifiedEvent::MergeStatusItemAdded)
            .collect()
    }

    fn merge_status_item_changed(&self, record: &MutationRecord) -> Vec<ClassifiedEvent> {
        match record {
            MutationRecord::Attributes { target, .. }
                if self.selectors.merge_status_item.matches(target) =>
            {
                vec![ClassifiedEvent::MergeStatusChanged {
                    status_text: target.text_content.clone(),
                }]
            }
            _ => Vec::new(),
        }
    }

    fn pr_status_changed(&self, record: &MutationRecord) -> Vec<ClassifiedEvent> {
        match record {
            MutationRecord::Attributes {
                target,
                attribute_name,
                ..
            } if *attribute_name == self.status_class_attribute
                && self.selectors.pr_status.matches(target) =>
            {
                vec![ClassifiedEvent::PrStatusChanged {
                    status_text: target.text_content.clone(),
                }]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{ElementSnapshot, NodeSnapshot};

    fn classifier() -> Classifier {
        Classifier::new(&AlertConfig::default()).unwrap()
    }

    fn element(tag: &str, classes: &[&str]) -> NodeSnapshot {
        NodeSnapshot::Element(ElementSnapshot::new(tag, classes))
    }

    fn child_list(added: Vec<NodeSnapshot>, removed: Vec<NodeSnapshot>) -> MutationRecord {
        MutationRecord::ChildList {
            target: element("div", &["js-discussion"]),
            added_nodes: added,
            removed_nodes: removed,
        }
    }

    #[test]
    fn new_timeline_item_snapshots_content() {
        let html = "x".repeat(57);
        let item = NodeSnapshot::Element(
            ElementSnapshot::new("div", &["js-timeline-item"])
                .with_text("Looks good")
                .with_html(&html),
        );
        let batch = MutationBatch::new(Region::Discussion, vec![child_list(vec![item], vec![])]);
        assert_eq!(
            classifier().classify(&batch),
            vec![ClassifiedEvent::NewComment {
                text: "Looks good".to_string(),
                size: 57,
            }]
        );
    }

    #[test]
    fn removed_container_yields_exactly_one_delete() {
        let batch = MutationBatch::new(
            Region::Discussion,
            vec![child_list(vec![], vec![element("div", &["js-comment-container"])])],
        );
        assert_eq!(classifier().classify(&batch), vec![ClassifiedEvent::CommentDeleted]);
    }

    #[test]
    fn added_before_removed_within_a_record() {
        let batch = MutationBatch::new(
            Region::Discussion,
            vec![child_list(
                vec![element("div", &["js-timeline-item"])],
                vec![element("div", &["js-comment-container"])],
            )],
        );
        let events = classifier().classify(&batch);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ClassifiedEvent::NewComment { size: 0, .. }));
        assert_eq!(events[1], ClassifiedEvent::CommentDeleted);
    }

    #[test]
    fn text_nodes_and_unmatched_elements_are_ignored() {
        let batch = MutationBatch::new(
            Region::Discussion,
            vec![child_list(
                vec![
                    NodeSnapshot::Text {
                        data: "js-timeline-item".to_string(),
                    },
                    element("div", &["reaction"]),
                ],
                vec![NodeSnapshot::Other, element("div", &["js-timeline-item"])],
            )],
        );
        assert!(classifier().classify(&batch).is_empty());
    }

    #[test]
    fn character_data_inside_comment_is_an_edit() {
        let record = MutationRecord::CharacterData {
            target: NodeSnapshot::Text {
                data: "fixed typo".to_string(),
            },
            ancestors: vec![
                ElementSnapshot::new("p", &[]),
                ElementSnapshot::new("div", &["js-timeline-item"]),
            ],
        };
        let batch = MutationBatch::new(Region::Discussion, vec![record]);
        assert_eq!(classifier().classify(&batch), vec![ClassifiedEvent::CommentEdited]);
    }

    #[test]
    fn edit_without_comment_ancestor_is_dropped() {
        let record = MutationRecord::CharacterData {
            target: NodeSnapshot::Text {
                data: "sidebar".to_string(),
            },
            ancestors: vec![ElementSnapshot::new("div", &["js-discussion"])],
        };
        let batch = MutationBatch::new(Region::Discussion, vec![record]);
        assert!(classifier().classify(&batch).is_empty());
    }

    #[test]
    fn body_version_attribute_is_an_edit_other_attributes_are_not() {
        let edit = |attr: &str| MutationRecord::Attributes {
            target: ElementSnapshot::new("div", &["comment-body"]),
            attribute_name: attr.to_string(),
            ancestors: vec![ElementSnapshot::new("div", &["js-timeline-item"])],
        };
        let batch = MutationBatch::new(
            Region::Discussion,
            vec![edit("data-body-version"), edit("aria-hidden")],
        );
        assert_eq!(classifier().classify(&batch), vec![ClassifiedEvent::CommentEdited]);
    }

    #[test]
    fn merge_status_items() {
        let added = MutationRecord::ChildList {
            target: element("div", &["merge-status-list"]),
            added_nodes: vec![element("div", &["merge-status-item"])],
            removed_nodes: vec![],
        };
        let changed = MutationRecord::Attributes {
            target: ElementSnapshot::new("div", &["merge-status-item"])
                .with_text("  CI / build  Failing after 3m "),
            attribute_name: "class".to_string(),
            ancestors: vec![],
        };
        let unrelated = MutationRecord::Attributes {
            target: ElementSnapshot::new("div", &["merge-status-icon"]),
            attribute_name: "class".to_string(),
            ancestors: vec![],
        };
        let batch = MutationBatch::new(Region::MergeStatus, vec![added, changed, unrelated]);
        assert_eq!(
            classifier().classify(&batch),
            vec![
                ClassifiedEvent::MergeStatusItemAdded,
                ClassifiedEvent::MergeStatusChanged {
                    status_text: "  CI / build  Failing after 3m ".to_string(),
                },
            ]
        );
    }

    #[test]
    fn pr_status_class_change() {
        let record = |attr: &str| MutationRecord::Attributes {
            target: ElementSnapshot::new("span", &["State", "State--merged"]).with_text(" Merged "),
            attribute_name: attr.to_string(),
            ancestors: vec![],
        };
        let batch = MutationBatch::new(Region::PrStatus, vec![record("class"), record("title")]);
        assert_eq!(
            classifier().classify(&batch),
            vec![ClassifiedEvent::PrStatusChanged {
                status_text: " Merged ".to_string(),
            }]
        );
    }

    #[test]
    fn pr_status_ignores_other_elements() {
        let record = MutationRecord::Attributes {
            target: ElementSnapshot::new("div", &["State"]).with_text("Open"),
            attribute_name: "class".to_string(),
            ancestors: vec![],
        };
        let batch = MutationBatch::new(Region::PrStatus, vec![record]);
        assert!(classifier().classify(&batch).is_empty());
    }

    #[test]
    fn rules_are_scoped_to_their_region() {
        let item = child_list(vec![element("div", &["js-timeline-item"])], vec![]);
        let batch = MutationBatch::new(Region::MergeStatus, vec![item]);
        assert!(classifier().classify(&batch).is_empty());
    }

    #[test]
    fn classify_is_repeatable() {
        let batch = MutationBatch::new(
            Region::Discussion,
            vec![
                child_list(vec![element("div", &["js-timeline-item"])], vec![]),
                child_list(vec![], vec![element("div", &["js-comment-container"])]),
            ],
        );
        let c = classifier();
        assert_eq!(c.classify(&batch), c.classify(&batch));
    }
}
