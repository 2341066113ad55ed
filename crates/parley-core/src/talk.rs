//! **Talk flow** — one utterance: RECORDING → TRANSLATING → SPEAKING → READY.
//!
//! Each external call sits behind [`contain`], which turns an error or a panic into an
//! [`UtteranceAbort`] for that phase. An abort ends the utterance and the state returns
//! to READY; nothing escapes to the control loop.
//!
//! Recognition is the exception: an empty or failed transcript is the low-confidence
//! path, answered with the source language's "please repeat" phrase.

use crate::capabilities::{AudioDevice, Direction, Display, LanguagePack, SpeechModels};
use crate::clock::Clock;
use crate::error::{DeviceError, DeviceResult};
use crate::mode::{Mode, ModeCycle};
use crate::skeleton::SkeletonTranslator;
use crate::state::DeviceState;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Characters of recognized/output text shown per display line.
const SNIPPET_CHARS: usize = 12;

/// Recording length limits.
#[derive(Debug, Clone, Copy)]
pub struct TalkLimits {
    /// Recordings shorter than this are dropped without recognition.
    pub min_record: Duration,
    /// Watchdog: capture stops after this long even while TALK is held.
    pub max_record: Duration,
}

impl Default for TalkLimits {
    fn default() -> Self {
        Self {
            min_record: Duration::from_millis(500),
            max_record: Duration::from_secs(12),
        }
    }
}

/// Why an utterance ended early.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UtteranceAbort {
    #[error("capture could not start: {0}")]
    StartCapture(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("recording too short ({0:?})")]
    TooShort(Duration),

    #[error("no audio captured")]
    NoAudio,

    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("translation failed: {0}")]
    Translation(String),

    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("playback failed: {0}")]
    Playback(String),
}

/// External call sites of the talk flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    StartCapture,
    StopCapture,
    Recognize,
    Translate,
    Synthesize,
    Play,
}

impl Phase {
    fn abort(self, reason: String) -> UtteranceAbort {
        match self {
            Phase::StartCapture => UtteranceAbort::StartCapture(reason),
            Phase::StopCapture => UtteranceAbort::Capture(reason),
            Phase::Recognize => UtteranceAbort::Recognition(reason),
            Phase::Translate => UtteranceAbort::Translation(reason),
            Phase::Synthesize => UtteranceAbort::Synthesis(reason),
            Phase::Play => UtteranceAbort::Playback(reason),
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one external call; errors and panics become an abort for `phase`.
fn contain<T>(phase: Phase, call: impl FnOnce() -> DeviceResult<T>) -> Result<T, UtteranceAbort> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(phase.abort(e.to_string())),
        Err(payload) => Err(phase.abort(format!("panicked: {}", panic_message(payload.as_ref())))),
    }
}

/// How a finished utterance ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// Translated (or corrected) text was handed to the synthesizer.
    Spoken { heard: String, said: String },
    /// Nothing usable was recognized; the repeat phrase was spoken.
    Repeated,
    Aborted(UtteranceAbort),
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

/// Per-utterance state machine. Owns the active mode and the speech models.
pub struct TalkFlow {
    modes: ModeCycle,
    models: SpeechModels,
    audio: Box<dyn AudioDevice>,
    skeleton: SkeletonTranslator,
    clock: Arc<dyn Clock>,
    limits: TalkLimits,
    state: DeviceState,
    recording_since: Option<Instant>,
}

impl TalkFlow {
    /// `models` must have been built from the same mode list as `modes`.
    pub fn new(
        modes: ModeCycle,
        models: SpeechModels,
        audio: Box<dyn AudioDevice>,
        clock: Arc<dyn Clock>,
        limits: TalkLimits,
    ) -> DeviceResult<Self> {
        if models.modes() != modes.modes() {
            return Err(DeviceError::Config(
                "speech models do not match the configured modes".to_string(),
            ));
        }
        Ok(Self {
            modes,
            models,
            audio,
            skeleton: SkeletonTranslator::new(),
            clock,
            limits,
            state: DeviceState::Ready,
            recording_since: None,
        })
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.modes.current()
    }

    /// Switch to the next mode. Ignored unless READY so a recording keeps its direction.
    pub fn toggle_mode(&mut self) -> Option<Mode> {
        if self.state != DeviceState::Ready {
            debug!(state = ?self.state, "Mode toggle ignored mid-utterance");
            return None;
        }
        let mode = self.modes.cycle();
        info!(mode = %mode, "Mode changed: {}", mode.description());
        Some(mode)
    }

    pub fn show_mode(&self, display: &mut dyn Display, battery: Option<u8>) {
        if let Err(e) = display.show_mode(self.mode(), battery) {
            warn!("Display update failed: {}", e);
        }
    }

    fn show_status(&self, display: &mut dyn Display, text: &str, battery: Option<u8>) {
        if let Err(e) = display.show_status(text, self.mode(), self.state, battery) {
            warn!("Display update failed: {}", e);
        }
    }

    fn enter(&mut self, next: DeviceState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "state");
        self.state = next;
    }

    /// TALK press edge. Starts capture; returns `false` if not READY or capture failed.
    pub fn begin(&mut self, display: &mut dyn Display, battery: Option<u8>) -> bool {
        if self.state != DeviceState::Ready {
            return false;
        }
        self.enter(DeviceState::Recording);
        self.show_status(display, DeviceState::Recording.status_text(), battery);

        match contain(Phase::StartCapture, || self.audio.start_record()) {
            Ok(()) => {
                self.recording_since = Some(self.clock.now());
                info!(mode = %self.mode(), "🎙️ Recording");
                true
            }
            Err(abort) => {
                warn!("Utterance aborted: {}", abort);
                self.reset(display, battery);
                false
            }
        }
    }

    /// Called every cycle while TALK is held. Finishes the utterance once the
    /// recording watchdog expires.
    pub fn poll_recording(
        &mut self,
        display: &mut dyn Display,
        battery: Option<u8>,
    ) -> Option<UtteranceOutcome> {
        let since = self.recording_since?;
        if self.state != DeviceState::Recording {
            return None;
        }
        let held = self.clock.now().saturating_duration_since(since);
        if held < self.limits.max_record {
            return None;
        }
        warn!(held_ms = held.as_millis() as u64, "Recording watchdog expired");
        self.finish(display, battery)
    }

    /// TALK release edge: stop capture and run the rest of the utterance to completion.
    /// Returns `None` when nothing was being recorded. Always leaves the state READY.
    pub fn finish(
        &mut self,
        display: &mut dyn Display,
        battery: Option<u8>,
    ) -> Option<UtteranceOutcome> {
        if self.state != DeviceState::Recording {
            return None;
        }
        self.recording_since = None;
        let direction = self.models.direction_at(self.modes.index()).clone();

        let outcome = match self.run_utterance(&direction, display, battery) {
            Ok(outcome) => outcome,
            Err(abort) => {
                warn!(mode = %direction.mode, "Utterance aborted: {}", abort);
                UtteranceOutcome::Aborted(abort)
            }
        };
        self.reset(display, battery);
        Some(outcome)
    }

    /// Return to READY from anywhere and redisplay the mode.
    pub fn reset(&mut self, display: &mut dyn Display, battery: Option<u8>) {
        if self.state != DeviceState::Ready {
            self.enter(DeviceState::Ready);
        }
        self.recording_since = None;
        self.show_mode(display, battery);
    }

    fn run_utterance(
        &mut self,
        direction: &Direction,
        display: &mut dyn Display,
        battery: Option<u8>,
    ) -> Result<UtteranceOutcome, UtteranceAbort> {
        let recording = contain(Phase::StopCapture, || self.audio.stop_record())?;
        if recording.is_empty() {
            return Err(UtteranceAbort::NoAudio);
        }
        let length = recording.duration();
        if length < self.limits.min_record {
            return Err(UtteranceAbort::TooShort(length));
        }
        debug!(
            seconds = length.as_secs_f32(),
            captured_at = %recording.captured_at.format("%H:%M:%S%.3f"),
            "Captured recording"
        );

        self.enter(DeviceState::Translating);
        self.show_status(display, DeviceState::Translating.status_text(), battery);

        let source = &direction.source;
        let heard = match contain(Phase::Recognize, || source.recognizer.transcribe(&recording)) {
            Ok(text) => text.trim().to_string(),
            Err(abort) => {
                warn!(recognizer = source.recognizer.name(), "{}", abort);
                String::new()
            }
        };

        if heard.is_empty() {
            info!("Nothing understood, asking to repeat");
            self.speak(source, source.language.repeat_prompt(), display, battery);
            return Ok(UtteranceOutcome::Repeated);
        }
        info!(mode = %direction.mode, "👂 Heard: {}", heard);

        let skeleton = self.skeleton.extract(source.language, &heard);
        debug!(slots = skeleton.slots.len(), "Skeleton: {}", skeleton.text);
        let translated = contain(Phase::Translate, || {
            direction.translator.translate(&skeleton.text)
        })?;
        let said = self.skeleton.compose(&translated, &skeleton.slots);
        info!(translator = direction.translator.name(), "🗣️ Output: {}", said);

        let summary = format!(
            "{}: {}\n{}: {}",
            direction.source.language.code().to_ascii_uppercase(),
            snippet(&heard),
            direction.target.language.code().to_ascii_uppercase(),
            snippet(&said)
        );
        self.show_status(display, &summary, battery);

        self.speak(&direction.target, &said, display, battery);
        Ok(UtteranceOutcome::Spoken { heard, said })
    }

    /// SPEAKING phase. Failures are logged only: the utterance still completes.
    fn speak(
        &mut self,
        pack: &LanguagePack,
        text: &str,
        display: &mut dyn Display,
        battery: Option<u8>,
    ) {
        self.enter(DeviceState::Speaking);
        self.show_status(display, DeviceState::Speaking.status_text(), battery);

        let audio = match contain(Phase::Synthesize, || pack.synthesizer.synthesize(text)) {
            Ok(audio) => audio,
            Err(abort) => {
                warn!(synthesizer = pack.synthesizer.name(), "{}", abort);
                return;
            }
        };
        if audio.is_empty() {
            debug!("Synthesizer returned no audio, skipping playback");
            return;
        }
        if let Err(abort) = contain(Phase::Play, || self.audio.play(&audio)) {
            warn!("{}", abort);
        }
    }
}
