//! Page session: the subject identifier and the audio sink, owned together
//! from page load until teardown.

use log::{debug, info, warn};

use crate::config::AlertConfig;
use crate::dsp::engine::ToneRenderer;
use crate::encoder::{self, Encoder};
use crate::error::{AlertError, AudioError};
use crate::event::ClassifiedEvent;
use crate::signature::{is_pull_request_path, signature_frequency, subject_from_path};
use crate::tone::ToneSequence;

const TEST_COMMENT: &str = "This is a test comment";
const TEST_MERGE_STATUS: &str = "success";
const TEST_PR_STATUS: &str = "open";
const TEST_DEPLOY_COMMENT: &str = "PR is build and deployed: Success!";

pub struct Session<R: ToneRenderer> {
    subject_id: Option<String>,
    encoder: Encoder,
    renderer: R,
    active: bool,
    pull_request_page: bool,
}

impl<R: ToneRenderer> Session<R> {
    pub fn start(subject_id: Option<String>, renderer: R, config: &AlertConfig) -> Self {
        info!(
            "session started for subject {} (signature {}Hz)",
            subject_id.as_deref().unwrap_or("<unknown>"),
            signature_frequency(subject_id.as_deref())
        );
        Session {
            subject_id,
            encoder: Encoder::from_config(config),
            renderer,
            active: true,
            pull_request_page: true,
        }
    }

    /// Start a session for the page at `path`, reading the subject from it.
    /// A path without the marker yields a session that observes nothing.
    pub fn for_path(path: &str, renderer: R, config: &AlertConfig) -> Self {
        let mut session = Self::start(subject_from_path(path, &config.path_marker), renderer, config);
        session.pull_request_page = is_pull_request_path(path, &config.path_marker);
        if !session.pull_request_page {
            debug!("{path} is not a pull request page");
        }
        session
    }

    /// Whether page regions may be observed for this session.
    pub fn is_pull_request_page(&self) -> bool {
        self.pull_request_page
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    pub fn signature_frequency(&self) -> f64 {
        signature_frequency(self.subject_id())
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Encode an event for this session's subject without playing it.
    pub fn encode(&self, event: &ClassifiedEvent) -> ToneSequence {
        self.encoder.encode(event, self.subject_id())
    }

    /// Encode and schedule one event. A sink failure aborts this event only.
    pub fn play_event(&mut self, event: &ClassifiedEvent) -> Result<ToneSequence, AlertError> {
        if !self.active {
            return Err(AudioError::Closed.into());
        }
        let sequence = self.encode(event);
        if sequence.has_alarm() {
            info!("alarm for {}", event.name());
        } else {
            debug!("{} -> {} sound(s)", event.name(), sequence.len());
        }
        if let Err(e) = encoder::play(&sequence, &mut self.renderer) {
            warn!("playback of {} failed: {e}", event.name());
            return Err(e.into());
        }
        Ok(sequence)
    }

    /// Tear down: close the sink and refuse further playback.
    pub fn end(&mut self) {
        if self.active {
            self.active = false;
            self.renderer.close();
            info!("session ended");
        }
    }

    // ── Manual triggers ─────────────────────────────────────

    /// The text doubles as markup: unlike a rendered comment, tags in it are
    /// not stripped before the build-deployed check.
    pub fn new_comment(&mut self, text: Option<&str>) -> Result<ToneSequence, AlertError> {
        let text = text.unwrap_or(TEST_COMMENT);
        self.play_event(&ClassifiedEvent::NewComment {
            text: text.to_string(),
            size: text.encode_utf16().count(),
        })
    }

    pub fn edit_comment(&mut self) -> Result<ToneSequence, AlertError> {
        self.play_event(&ClassifiedEvent::CommentEdited)
    }

    pub fn delete_comment(&mut self) -> Result<ToneSequence, AlertError> {
        self.play_event(&ClassifiedEvent::CommentDeleted)
    }

    pub fn merge_status_change(&mut self, status: Option<&str>) -> Result<ToneSequence, AlertError> {
        self.play_event(&ClassifiedEvent::MergeStatusChanged {
            status_text: status.unwrap_or(TEST_MERGE_STATUS).to_string(),
        })
    }

    pub fn pr_status_change(&mut self, status: Option<&str>) -> Result<ToneSequence, AlertError> {
        self.play_event(&ClassifiedEvent::PrStatusChanged {
            status_text: status.unwrap_or(TEST_PR_STATUS).to_string(),
        })
    }

    pub fn build_deployed(&mut self) -> Result<ToneSequence, AlertError> {
        self.new_comment(Some(TEST_DEPLOY_COMMENT))
    }
}

impl<R: ToneRenderer> Drop for Session<R> {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::engine::OfflineSink;
    use crate::dsp::oscillator::Waveform;
    use crate::encoder::tests::{Call, RecordingRenderer};
    use crate::tone::Sound;

    fn session() -> Session<RecordingRenderer> {
        Session::for_path(
            "/octo/repo/pull/42",
            RecordingRenderer::default(),
            &AlertConfig::default(),
        )
    }

    #[test]
    fn subject_comes_from_path() {
        let s = session();
        assert_eq!(s.subject_id(), Some("42"));
        assert_eq!(s.signature_frequency(), 1002.0);
        assert!(s.is_pull_request_page());

        let s = Session::for_path("/octo/repo/pulls", RecordingRenderer::default(), &AlertConfig::default());
        assert_eq!(s.subject_id(), None);
        assert_eq!(s.signature_frequency(), 440.0);
        assert!(!s.is_pull_request_page());
    }

    #[test]
    fn manual_new_comment_defaults() {
        let mut s = session();
        let seq = s.new_comment(None).unwrap();
        // "This is a test comment" is 22 units long.
        assert_eq!(
            s.renderer().calls[1],
            Call::Tone(222.0, 0.1 + 22.0 / 1000.0, 0.2, Waveform::Sine)
        );
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn manual_comment_markup_is_measured_raw() {
        let mut s = session();
        s.new_comment(Some("<b>hi</b>")).unwrap();
        assert_eq!(
            s.renderer().calls[1],
            Call::Tone(209.0, 0.1 + 9.0 / 1000.0, 0.2, Waveform::Sine)
        );
    }

    #[test]
    fn manual_build_deployed_plays_chord() {
        let mut s = session();
        let seq = s.build_deployed().unwrap();
        assert_eq!(seq.len(), 3);
        assert!(seq.tones().all(|t| t.start_offset == 0.0 && t.duration == 1.0));
        assert_eq!(s.renderer().calls.len(), 3);
    }

    #[test]
    fn manual_status_defaults() {
        let mut s = session();
        let merge = s.merge_status_change(None).unwrap();
        assert!(matches!(merge.sounds[1], Sound::Tone(t) if t.frequency == 523.25));
        let pr = s.pr_status_change(None).unwrap();
        assert!(matches!(pr.sounds[1], Sound::Tone(t) if t.frequency == 659.25));
        let alarm = s.merge_status_change(Some("Build failing")).unwrap();
        assert!(alarm.has_alarm());
        assert_eq!(s.renderer().calls.last(), Some(&Call::Alarm(0.2, 1.5)));
    }

    #[test]
    fn manual_edit_and_delete() {
        let mut s = session();
        s.edit_comment().unwrap();
        s.delete_comment().unwrap();
        let calls = &s.renderer().calls;
        assert_eq!(calls[1], Call::Tone(440.0, 0.3, 0.2, Waveform::Triangle));
        assert_eq!(calls[3], Call::Tone(329.63, 0.4, 0.2, Waveform::Sawtooth));
    }

    #[test]
    fn sink_failure_affects_only_that_event() {
        let mut s = session();
        s.renderer_mut().fail_at = Some(0);
        assert!(matches!(
            s.edit_comment(),
            Err(AlertError::Audio(AudioError::Closed))
        ));
        assert!(s.delete_comment().is_ok());
        assert_eq!(s.renderer().calls.len(), 2);
    }

    #[test]
    fn ended_session_refuses_playback() {
        let mut s = Session::start(Some("7".to_string()), OfflineSink::new(8000.0), &AlertConfig::default());
        s.delete_comment().unwrap();
        s.end();
        assert!(!s.is_active());
        assert!(s.renderer().is_closed());
        assert_eq!(
            s.delete_comment().unwrap_err(),
            AlertError::Audio(AudioError::Closed)
        );
        // Cues scheduled before teardown can still be rendered.
        assert_eq!(s.renderer().pending().len(), 2);
    }
}
