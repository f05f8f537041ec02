//! Observation coordinator: region subscriptions and the batch queue.
//!
//! The host pushes each mutation batch it receives; batches are queued and
//! then drained synchronously in arrival order. Every classified event is
//! played on its own, so one failing cue never silences the next.

use std::collections::{HashMap, VecDeque};

use log::{debug, info, warn};
use serde::Serialize;

use crate::classifier::Classifier;
use crate::config::AlertConfig;
use crate::dsp::engine::ToneRenderer;
use crate::error::{AlertError, ConfigError};
use crate::event::ClassifiedEvent;
use crate::mutation::{MutationBatch, MutationRecord, Region};
use crate::session::Session;
use crate::signature::is_pull_request_path;

/// Which records a region subscription delivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
    pub character_data: bool,
    pub attributes: bool,
    /// Attribute names to report; empty means all.
    pub attribute_filter: Vec<String>,
}

impl ObserveOptions {
    /// The narrowest options the classifier's rules for `region` need.
    pub fn for_region(region: Region, config: &AlertConfig) -> Self {
        match region {
            Region::Discussion => ObserveOptions {
                child_list: true,
                subtree: true,
                character_data: true,
                attributes: true,
                attribute_filter: vec![config.body_version_attribute.clone()],
            },
            Region::MergeStatus => ObserveOptions {
                child_list: true,
                subtree: true,
                character_data: false,
                attributes: true,
                attribute_filter: vec![config.status_class_attribute.clone()],
            },
            Region::PrStatus => ObserveOptions {
                child_list: false,
                subtree: false,
                character_data: false,
                attributes: true,
                attribute_filter: vec![config.status_class_attribute.clone()],
            },
        }
    }

    pub fn accepts(&self, record: &MutationRecord) -> bool {
        match record {
            MutationRecord::ChildList { .. } => self.child_list,
            MutationRecord::CharacterData { .. } => self.character_data,
            MutationRecord::Attributes { attribute_name, .. } => {
                self.attributes
                    && (self.attribute_filter.is_empty()
                        || self.attribute_filter.iter().any(|a| a == attribute_name))
            }
        }
    }
}

/// An event whose playback failed.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedEvent {
    pub event: ClassifiedEvent,
    pub error: AlertError,
}

/// Outcome of draining the queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainReport {
    /// Events scheduled, in order.
    pub played: Vec<ClassifiedEvent>,
    pub failed: Vec<FailedEvent>,
}

pub struct Coordinator<R: ToneRenderer> {
    session: Session<R>,
    classifier: Classifier,
    config: AlertConfig,
    subscriptions: HashMap<Region, ObserveOptions>,
    queue: VecDeque<MutationBatch>,
}

impl<R: ToneRenderer> Coordinator<R> {
    pub fn new(session: Session<R>, config: &AlertConfig) -> Result<Self, ConfigError> {
        Ok(Coordinator {
            session,
            classifier: Classifier::new(config)?,
            config: config.clone(),
            subscriptions: HashMap::new(),
            queue: VecDeque::new(),
        })
    }

    /// Selector the host uses to locate `region` on the page.
    pub fn region_selector(&self, region: Region) -> &str {
        match region {
            Region::Discussion => &self.config.discussion_selector,
            Region::MergeStatus => &self.config.merge_status_list_selector,
            Region::PrStatus => &self.config.pr_status_selector,
        }
    }

    /// Subscribe to a region the host found on the page. Returns `None`
    /// when the session's page is not a pull request.
    pub fn observe(&mut self, region: Region) -> Option<&ObserveOptions> {
        if !self.session.is_pull_request_page() {
            debug!("not a pull request page; not observing {}", region.as_str());
            return None;
        }
        let options = ObserveOptions::for_region(region, &self.config);
        info!(
            "observing {} ({})",
            region.as_str(),
            self.region_selector(region)
        );
        Some(self.subscriptions.entry(region).or_insert(options))
    }

    /// Subscribe to every region in `found`, provided `path` is a pull
    /// request page. Regions the host could not find are simply skipped.
    /// Returns the number of subscriptions made.
    pub fn observe_page(&mut self, path: &str, found: &[Region]) -> usize {
        if !is_pull_request_path(path, &self.config.path_marker) {
            debug!("{path} is not a pull request page; not observing");
            return 0;
        }
        for region in Region::ALL {
            if found.contains(&region) {
                self.observe(region);
            } else {
                debug!("{} not found; skipping", region.as_str());
            }
        }
        self.subscriptions.len()
    }

    pub fn is_observing(&self, region: Region) -> bool {
        self.subscriptions.contains_key(&region)
    }

    /// Queue a batch. Records outside the region's options are dropped;
    /// batches for unobserved regions are dropped whole.
    pub fn push(&mut self, mut batch: MutationBatch) -> bool {
        let Some(options) = self.subscriptions.get(&batch.region) else {
            debug!("dropping batch for unobserved region {}", batch.region.as_str());
            return false;
        };
        batch.records.retain(|r| options.accepts(r));
        self.queue.push_back(batch);
        true
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Classify and play every queued batch, oldest first.
    pub fn drain(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        while let Some(batch) = self.queue.pop_front() {
            for event in self.classifier.classify(&batch) {
                match self.session.play_event(&event) {
                    Ok(_) => report.played.push(event),
                    Err(error) => {
                        warn!("no sound for {}: {error}", event.name());
                        report.failed.push(FailedEvent { event, error });
                    }
                }
            }
        }
        report
    }

    /// Push one batch and drain immediately.
    pub fn dispatch(&mut self, batch: MutationBatch) -> DrainReport {
        self.push(batch);
        self.drain()
    }

    pub fn session(&self) -> &Session<R> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<R> {
        &mut self.session
    }

    /// Drop all subscriptions and queued batches, and end the session.
    pub fn shutdown(&mut self) {
        self.subscriptions.clear();
        self.queue.clear();
        self.session.end();
    }
}
