pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod dsp;
pub mod encoder;
pub mod error;
pub mod event;
pub mod mutation;
pub mod session;
pub mod signature;
pub mod tone;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::AlertConfig;
use crate::coordinator::{Coordinator, DrainReport, ObserveOptions};
use crate::dsp::engine::OfflineSink;
use crate::error::AlertError;
use crate::event::ClassifiedEvent;
use crate::mutation::{MutationBatch, Region};
use crate::session::Session;
use crate::tone::ToneSequence;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the pr_chime version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: signature frequency for a pull request number.
#[wasm_bindgen]
pub fn signature_frequency(subject_id: Option<String>) -> f64 {
    signature::signature_frequency(subject_id.as_deref())
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_err)
}

/// Parse a host-supplied config object; `undefined`/`null` means defaults.
fn config_from_js(value: JsValue) -> Result<AlertConfig, AlertError> {
    if value.is_undefined() || value.is_null() {
        return Ok(AlertConfig::default());
    }
    let config: AlertConfig =
        serde_wasm_bindgen::from_value(value).map_err(|e| AlertError::Decode(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureView<'a> {
    event: &'a ClassifiedEvent,
    error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DrainView<'a> {
    played: &'a [ClassifiedEvent],
    failed: Vec<FailureView<'a>>,
}

impl<'a> From<&'a DrainReport> for DrainView<'a> {
    fn from(report: &'a DrainReport) -> Self {
        DrainView {
            played: &report.played,
            failed: report
                .failed
                .iter()
                .map(|f| FailureView {
                    event: &f.event,
                    error: f.error.to_string(),
                })
                .collect(),
        }
    }
}

/// WASM-exposed alert session for one pull request page.
///
/// The host observes the page, serializes each mutation batch, and pushes it
/// here. Scheduled cues are rendered into f32 samples via `takeSamples` for
/// playback through an AudioWorklet or AudioBuffer.
#[wasm_bindgen]
pub struct PrAlert {
    coordinator: Coordinator<OfflineSink>,
}

#[wasm_bindgen]
impl PrAlert {
    /// Start a session for the page at `pathname` with an optional config.
    #[wasm_bindgen(constructor)]
    pub fn new(pathname: &str, config: JsValue) -> Result<PrAlert, JsValue> {
        let config = config_from_js(config).map_err(js_err)?;
        let session = Session::for_path(pathname, OfflineSink::from_config(&config), &config);
        let coordinator = Coordinator::new(session, &config).map_err(js_err)?;
        Ok(PrAlert { coordinator })
    }

    #[wasm_bindgen(getter = subjectId)]
    pub fn subject_id(&self) -> Option<String> {
        self.coordinator.session().subject_id().map(str::to_string)
    }

    #[wasm_bindgen(getter = sampleRate)]
    pub fn sample_rate(&self) -> f64 {
        self.coordinator.session().renderer().sample_rate
    }

    /// Selector for a region name (`discussion`, `mergeStatus`, `prStatus`).
    #[wasm_bindgen(js_name = regionSelector)]
    pub fn region_selector(&self, region: &str) -> Result<String, JsValue> {
        let region = parse_region(region)?;
        Ok(self.coordinator.region_selector(region).to_string())
    }

    #[wasm_bindgen(getter = isPullRequestPage)]
    pub fn is_pull_request_page(&self) -> bool {
        self.coordinator.session().is_pull_request_page()
    }

    /// Subscribe to a region the host located; returns the observe options
    /// to hand to the host's mutation observer, or `undefined` when the page
    /// is not a pull request.
    pub fn observe(&mut self, region: &str) -> Result<JsValue, JsValue> {
        let region = parse_region(region)?;
        let options: Option<&ObserveOptions> = self.coordinator.observe(region);
        to_js(&options)
    }

    /// Queue one serialized mutation batch. Returns false when the batch's
    /// region is not observed.
    #[wasm_bindgen(js_name = pushBatch)]
    pub fn push_batch(&mut self, batch: JsValue) -> Result<bool, JsValue> {
        let batch: MutationBatch = serde_wasm_bindgen::from_value(batch)
            .map_err(|e| js_err(AlertError::Decode(e.to_string())))?;
        Ok(self.coordinator.push(batch))
    }

    /// Classify and schedule everything queued.
    pub fn drain(&mut self) -> Result<JsValue, JsValue> {
        let report = self.coordinator.drain();
        to_js(&DrainView::from(&report))
    }

    /// Render scheduled cues to mono f32 samples and clear them.
    #[wasm_bindgen(js_name = takeSamples)]
    pub fn take_samples(&mut self) -> Vec<f32> {
        self.coordinator.session_mut().renderer_mut().take_samples()
    }

    /// Scheduled cues as a WAV file, without clearing them.
    #[wasm_bindgen(js_name = pendingWav)]
    pub fn pending_wav(&self) -> Vec<u8> {
        dsp::renderer::render_wav(self.coordinator.session().renderer())
    }

    pub fn shutdown(&mut self) {
        self.coordinator.shutdown();
    }

    // Manual triggers, mirroring the six event paths.

    #[wasm_bindgen(js_name = newComment)]
    pub fn new_comment(&mut self, text: Option<String>) -> Result<JsValue, JsValue> {
        sequence_to_js(self.coordinator.session_mut().new_comment(text.as_deref()))
    }

    #[wasm_bindgen(js_name = editComment)]
    pub fn edit_comment(&mut self) -> Result<JsValue, JsValue> {
        sequence_to_js(self.coordinator.session_mut().edit_comment())
    }

    #[wasm_bindgen(js_name = deleteComment)]
    pub fn delete_comment(&mut self) -> Result<JsValue, JsValue> {
        sequence_to_js(self.coordinator.session_mut().delete_comment())
    }

    #[wasm_bindgen(js_name = mergeStatusChange)]
    pub fn merge_status_change(&mut self, status: Option<String>) -> Result<JsValue, JsValue> {
        sequence_to_js(self.coordinator.session_mut().merge_status_change(status.as_deref()))
    }

    #[wasm_bindgen(js_name = prStatusChange)]
    pub fn pr_status_change(&mut self, status: Option<String>) -> Result<JsValue, JsValue> {
        sequence_to_js(self.coordinator.session_mut().pr_status_change(status.as_deref()))
    }

    #[wasm_bindgen(js_name = buildDeployed)]
    pub fn build_deployed(&mut self) -> Result<JsValue, JsValue> {
        sequence_to_js(self.coordinator.session_mut().build_deployed())
    }
}

fn parse_region(name: &str) -> Result<Region, JsValue> {
    Region::from_name(name).ok_or_else(|| JsValue::from_str(&format!("Unknown region '{name}'")))
}

fn sequence_to_js(result: Result<ToneSequence, AlertError>) -> Result<JsValue, JsValue> {
    to_js(&result.map_err(js_err)?)
}
