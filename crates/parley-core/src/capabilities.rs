//! **Capabilities** — the interfaces the control core consumes.
//!
//! Microphone/speaker, display, power switch and the three speech models live outside
//! this crate. Implement the traits here for real hardware (`parley-voice`) or use the
//! placeholders in [`crate::bringup`].
//!
//! [`SpeechModels`] bundles one [`Direction`] per configured mode. It is built once at
//! boot and either has every model for every mode or fails to build, so the talk flow
//! never checks for a missing model.

use crate::error::{DeviceError, DeviceResult};
use crate::mode::{Language, Mode, ModeCycle};
use crate::state::DeviceState;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Captured or synthesized mono PCM.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Samples (f32, -1.0..1.0).
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub captured_at: DateTime<Utc>,
}

impl Recording {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            captured_at: Utc::now(),
        }
    }

    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Microphone capture and speaker playback.
pub trait AudioDevice {
    fn start_record(&mut self) -> DeviceResult<()>;

    /// Stop capturing and hand over everything recorded since `start_record`.
    fn stop_record(&mut self) -> DeviceResult<Recording>;

    /// Play to completion.
    fn play(&mut self, audio: &Recording) -> DeviceResult<()>;
}

pub trait Display {
    fn show_mode(&mut self, mode: Mode, battery: Option<u8>) -> DeviceResult<()>;

    fn show_status(
        &mut self,
        text: &str,
        mode: Mode,
        state: DeviceState,
        battery: Option<u8>,
    ) -> DeviceResult<()>;
}

pub trait PowerControl {
    fn shutdown(&mut self) -> DeviceResult<()>;
}

/// Speech-to-text for one language.
pub trait Recognizer: Send + Sync {
    /// Return an empty string when nothing was understood.
    fn transcribe(&self, audio: &Recording) -> DeviceResult<String>;

    fn name(&self) -> &str;
}

/// Text-to-text for one direction. For correction modes this is the grammar corrector.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str) -> DeviceResult<String>;

    fn name(&self) -> &str;
}

/// Text-to-speech for one language.
pub trait SpeechSynthesizer: Send + Sync {
    /// Return an empty recording to skip playback.
    fn synthesize(&self, text: &str) -> DeviceResult<Recording>;

    fn name(&self) -> &str;
}

/// Recognizer and synthesizer for one spoken language.
pub struct LanguagePack {
    pub language: Language,
    pub recognizer: Arc<dyn Recognizer>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl LanguagePack {
    pub fn new(
        language: Language,
        recognizer: Arc<dyn Recognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            language,
            recognizer,
            synthesizer,
        }
    }
}

/// Everything the talk flow needs for one mode.
#[derive(Clone)]
pub struct Direction {
    pub mode: Mode,
    pub source: Arc<LanguagePack>,
    pub target: Arc<LanguagePack>,
    pub translator: Arc<dyn Translator>,
}

/// One [`Direction`] per mode, in the same order as the [`ModeCycle`] it was built from.
pub struct SpeechModels {
    directions: Vec<Direction>,
}

impl SpeechModels {
    /// Production bundle: every mode in `modes` must have a language pack for both sides
    /// and a translator, otherwise this fails.
    pub fn production(
        modes: &ModeCycle,
        packs: Vec<LanguagePack>,
        translators: Vec<(Mode, Arc<dyn Translator>)>,
    ) -> DeviceResult<Self> {
        let packs: Vec<Arc<LanguagePack>> = packs.into_iter().map(Arc::new).collect();
        let find_pack = |lang: Language| {
            packs
                .iter()
                .find(|p| p.language == lang)
                .cloned()
                .ok_or_else(|| {
                    DeviceError::Config(format!("no speech models for language '{}'", lang.code()))
                })
        };

        let mut directions = Vec::with_capacity(modes.len());
        for &mode in modes.modes() {
            let translator = translators
                .iter()
                .find(|(m, _)| *m == mode)
                .map(|(_, t)| Arc::clone(t))
                .ok_or_else(|| DeviceError::Config(format!("no translator for mode {}", mode)))?;
            directions.push(Direction {
                mode,
                source: find_pack(mode.source)?,
                target: find_pack(mode.target)?,
                translator,
            });
        }
        Ok(Self { directions })
    }

    /// Bring-up bundle: placeholder models for every mode.
    pub fn bring_up(modes: &ModeCycle) -> Self {
        use crate::bringup::{EchoTranslator, PlaceholderRecognizer, SilentSynthesizer};

        let directions = modes
            .modes()
            .iter()
            .map(|&mode| {
                let pack = |language| {
                    Arc::new(LanguagePack::new(
                        language,
                        Arc::new(PlaceholderRecognizer::new()),
                        Arc::new(SilentSynthesizer::default()),
                    ))
                };
                Direction {
                    mode,
                    source: pack(mode.source),
                    target: pack(mode.target),
                    translator: Arc::new(EchoTranslator),
                }
            })
            .collect();
        Self { directions }
    }

    pub fn modes(&self) -> Vec<Mode> {
        self.directions.iter().map(|d| d.mode).collect()
    }

    pub(crate) fn direction_at(&self, index: usize) -> &Direction {
        &self.directions[index]
    }
}
