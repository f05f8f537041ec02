//! Raw structural-mutation records, as delivered by the host page.
//!
//! The host serializes each DOM mutation into a [`MutationRecord`] carrying
//! just enough of the affected nodes to classify it: tag, classes, text
//! content, serialized markup, and the chain of element ancestors. Records
//! are read-only input; nothing here mutates them.

use serde::{Deserialize, Serialize};

use crate::error::SelectorError;

/// A page region that can be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Region {
    /// The comment timeline.
    Discussion,
    /// The list of merge checks.
    MergeStatus,
    /// The open/closed/merged badge.
    PrStatus,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Discussion, Region::MergeStatus, Region::PrStatus];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Discussion => "discussion",
            Region::MergeStatus => "mergeStatus",
            Region::PrStatus => "prStatus",
        }
    }

    pub fn from_name(name: &str) -> Option<Region> {
        Region::ALL.into_iter().find(|r| r.as_str() == name)
    }
}

// ── Selectors ───────────────────────────────────────────────

/// A compound selector: an optional tag name followed by classes,
/// e.g. `span.State` or `.js-timeline-item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub tag: Option<String>,
    pub classes: Vec<String>,
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let chars: Vec<char> = input.trim().chars().collect();
        if chars.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut pos = 0;
        let read_ident = |pos: &mut usize| -> String {
            let start = *pos;
            while *pos < chars.len() && is_ident_char(chars[*pos]) {
                *pos += 1;
            }
            chars[start..*pos].iter().collect()
        };

        let tag = read_ident(&mut pos);
        let mut classes = Vec::new();
        while pos < chars.len() {
            if chars[pos] != '.' {
                return Err(SelectorError::UnexpectedChar { ch: chars[pos], pos });
            }
            pos += 1;
            let class = read_ident(&mut pos);
            if class.is_empty() {
                return match chars.get(pos) {
                    Some(&ch) => Err(SelectorError::UnexpectedChar { ch, pos }),
                    None => Err(SelectorError::Empty),
                };
            }
            classes.push(class);
        }

        Ok(Selector {
            tag: if tag.is_empty() { None } else { Some(tag) },
            classes,
        })
    }

    pub fn matches(&self, element: &ElementSnapshot) -> bool {
        let tag_ok = self
            .tag
            .as_ref()
            .is_none_or(|t| t.eq_ignore_ascii_case(&element.tag_name));
        tag_ok && self.classes.iter().all(|c| element.has_class(c))
    }
}

// ── Node snapshots ──────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub tag_name: String,
    pub classes: Vec<String>,
    /// Concatenated text of the element and its descendants.
    pub text_content: String,
    /// Serialized markup of the element's children.
    #[serde(rename = "innerHTML")]
    pub inner_html: String,
}

impl ElementSnapshot {
    pub fn new(tag_name: &str, classes: &[&str]) -> Self {
        ElementSnapshot {
            tag_name: tag_name.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text_content = text.to_string();
        self
    }

    pub fn with_html(mut self, html: &str) -> Self {
        self.inner_html = html.to_string();
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Length of the serialized markup in UTF-16 code units, the unit the
    /// host page measures strings in.
    pub fn content_size(&self) -> usize {
        self.inner_html.encode_utf16().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "camelCase")]
pub enum NodeSnapshot {
    Element(ElementSnapshot),
    Text { data: String },
    Other,
}

impl NodeSnapshot {
    pub fn as_element(&self) -> Option<&ElementSnapshot> {
        match self {
            NodeSnapshot::Element(e) => Some(e),
            _ => None,
        }
    }

    fn matches(&self, selector: &Selector) -> bool {
        self.as_element().is_some_and(|e| selector.matches(e))
    }
}

// ── Records ─────────────────────────────────────────────────

/// One DOM-level change.
///
/// `ancestors` lists the target's element ancestors, nearest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MutationRecord {
    ChildList {
        target: NodeSnapshot,
        #[serde(default)]
        added_nodes: Vec<NodeSnapshot>,
        #[serde(default)]
        removed_nodes: Vec<NodeSnapshot>,
    },
    Attributes {
        target: ElementSnapshot,
        attribute_name: String,
        #[serde(default)]
        ancestors: Vec<ElementSnapshot>,
    },
    CharacterData {
        target: NodeSnapshot,
        #[serde(default)]
        ancestors: Vec<ElementSnapshot>,
    },
}

impl MutationRecord {
    /// Elements among the added nodes that match `selector`.
    pub fn added_matching<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = &'a ElementSnapshot> {
        let nodes: &[NodeSnapshot] = match self {
            MutationRecord::ChildList { added_nodes, .. } => added_nodes,
            _ => &[],
        };
        nodes
            .iter()
            .filter_map(NodeSnapshot::as_element)
            .filter(move |e| selector.matches(e))
    }

    /// Number of removed nodes that are elements matching `selector`.
    pub fn removed_matching(&self, selector: &Selector) -> usize {
        match self {
            MutationRecord::ChildList { removed_nodes, .. } => {
                removed_nodes.iter().filter(|n| n.matches(selector)).count()
            }
            _ => 0,
        }
    }

    /// Nearest inclusive ancestor of the target matching `selector`.
    pub fn closest(&self, selector: &Selector) -> Option<&ElementSnapshot> {
        let (own, ancestors) = match self {
            MutationRecord::ChildList { target, .. } => (target.as_element(), &[][..]),
            MutationRecord::Attributes {
                target, ancestors, ..
            } => (Some(target), ancestors.as_slice()),
            MutationRecord::CharacterData { target, ancestors } => {
                (target.as_element(), ancestors.as_slice())
            }
        };
        own.into_iter()
            .chain(ancestors.iter())
            .find(|e| selector.matches(e))
    }
}

/// Records delivered together for one observed region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationBatch {
    pub region: Region,
    pub records: Vec<MutationRecord>,
}

impl MutationBatch {
    pub fn new(region: Region, records: Vec<MutationRecord>) -> Self {
        MutationBatch { region, records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_class_and_tag_selectors() {
        let s = Selector::parse(".js-timeline-item").unwrap();
        assert_eq!(s.tag, None);
        assert_eq!(s.classes, vec!["js-timeline-item"]);

        let s = Selector::parse(" span.State ").unwrap();
        assert_eq!(s.tag.as_deref(), Some("span"));

        let s = Selector::parse("div.a.b").unwrap();
        assert_eq!(s.classes, vec!["a", "b"]);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("div."), Err(SelectorError::Empty));
        assert_eq!(
            Selector::parse("#main"),
            Err(SelectorError::UnexpectedChar { ch: '#', pos: 0 })
        );
        assert_eq!(
            Selector::parse(".a..b"),
            Err(SelectorError::UnexpectedChar { ch: '.', pos: 3 })
        );
    }

    #[test]
    fn selector_matching() {
        let state = Selector::parse("span.State").unwrap();
        assert!(state.matches(&ElementSnapshot::new("SPAN", &["State", "State--open"])));
        assert!(!state.matches(&ElementSnapshot::new("div", &["State"])));
        assert!(!state.matches(&ElementSnapshot::new("span", &["Label"])));

        let item = Selector::parse(".merge-status-item").unwrap();
        assert!(item.matches(&ElementSnapshot::new("div", &["merge-status-item", "px-2"])));
    }

    #[test]
    fn content_size_counts_utf16_units() {
        let e = ElementSnapshot::new("div", &[]).with_html("<p>h\u{e9}\u{1F600}</p>");
        // <p> (3) + h (1) + é (1) + emoji (2) + </p> (4)
        assert_eq!(e.content_size(), 11);
    }

    #[test]
    fn closest_is_inclusive_and_nearest_first() {
        let item = Selector::parse(".js-timeline-item").unwrap();
        let record = MutationRecord::CharacterData {
            target: NodeSnapshot::Text {
                data: "edited".to_string(),
            },
            ancestors: vec![
                ElementSnapshot::new("p", &[]),
                ElementSnapshot::new("div", &["js-timeline-item"]).with_text("inner"),
                ElementSnapshot::new("div", &["js-timeline-item"]).with_text("outer"),
            ],
        };
        assert_eq!(record.closest(&item).unwrap().text_content, "inner");

        let record = MutationRecord::Attributes {
            target: ElementSnapshot::new("div", &["js-timeline-item"]).with_text("self"),
            attribute_name: "data-body-version".to_string(),
            ancestors: vec![],
        };
        assert_eq!(record.closest(&item).unwrap().text_content, "self");
    }

    #[test]
    fn record_json_shape() {
        let json = r#"{
            "region": "discussion",
            "records": [
                {
                    "type": "childList",
                    "target": { "nodeType": "element", "tagName": "div" },
                    "addedNodes": [
                        { "nodeType": "element", "tagName": "div", "classes": ["js-timeline-item"],
                          "textContent": "hi", "innerHTML": "<p>hi</p>" },
                        { "nodeType": "text", "data": "\n" }
                    ]
                },
                { "type": "characterData", "target": { "nodeType": "text", "data": "x" } }
            ]
        }"#;
        let batch: MutationBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.region, Region::Discussion);
        assert_eq!(batch.records.len(), 2);
        let item = Selector::parse(".js-timeline-item").unwrap();
        let added: Vec<_> = batch.records[0].added_matching(&item).collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].content_size(), 9);
    }

    #[test]
    fn region_names_round_trip() {
        for region in Region::ALL {
            assert_eq!(Region::from_name(region.as_str()), Some(region));
        }
        assert_eq!(Region::from_name("sidebar"), None);
    }
}
