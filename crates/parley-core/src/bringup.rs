//! Placeholder capabilities for bench bring-up: exercise buttons, display and the talk
//! flow on a board (or PC) without microphone, speaker or models installed.

use crate::capabilities::{
    AudioDevice, Display, PowerControl, Recognizer, Recording, SpeechSynthesizer, Translator,
};
use crate::clock::{Clock, SystemClock};
use crate::error::DeviceResult;
use crate::mode::Mode;
use crate::state::DeviceState;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Placeholder recognizer: returns a fixed string.
#[derive(Debug, Default)]
pub struct PlaceholderRecognizer {
    /// If set, return this instead of the default message.
    pub response: Option<String>,
}

impl PlaceholderRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(s: impl Into<String>) -> Self {
        Self {
            response: Some(s.into()),
        }
    }
}

impl Recognizer for PlaceholderRecognizer {
    fn transcribe(&self, audio: &Recording) -> DeviceResult<String> {
        if let Some(ref r) = self.response {
            return Ok(r.clone());
        }
        Ok(format!(
            "Placeholder recognizer heard {:.1} seconds",
            audio.duration().as_secs_f32()
        ))
    }

    fn name(&self) -> &str {
        "placeholder"
    }
}

/// Returns its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoTranslator;

impl Translator for EchoTranslator {
    fn translate(&self, text: &str) -> DeviceResult<String> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Logs the text and produces no audio.
#[derive(Debug, Default)]
pub struct SilentSynthesizer {
    pub sample_rate: u32,
}

impl SpeechSynthesizer for SilentSynthesizer {
    fn synthesize(&self, text: &str) -> DeviceResult<Recording> {
        info!("[TTS placeholder] {}", text);
        Ok(Recording::empty(self.sample_rate))
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// Audio device without hardware: a recording is silence as long as the button was held.
pub struct NullAudio {
    clock: Arc<dyn Clock>,
    sample_rate: u32,
    started: Option<Instant>,
}

impl NullAudio {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_clock(sample_rate, Arc::new(SystemClock))
    }

    pub fn with_clock(sample_rate: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            sample_rate,
            started: None,
        }
    }
}

impl AudioDevice for NullAudio {
    fn start_record(&mut self) -> DeviceResult<()> {
        self.started = Some(self.clock.now());
        Ok(())
    }

    fn stop_record(&mut self) -> DeviceResult<Recording> {
        let held = self
            .started
            .take()
            .map(|t| self.clock.now().saturating_duration_since(t))
            .unwrap_or_default();
        let len = (held.as_secs_f64() * self.sample_rate as f64) as usize;
        Ok(Recording::new(vec![0.0; len], self.sample_rate))
    }

    fn play(&mut self, audio: &Recording) -> DeviceResult<()> {
        debug!("[AUDIO placeholder] play {:.1}s", audio.duration().as_secs_f32());
        Ok(())
    }
}

/// Prints the two display lines to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl ConsoleDisplay {
    fn render(line1: &str, line2: &str, battery: Option<u8>) -> String {
        let mut out = format!("[DISPLAY] {}", line1);
        for line in line2.lines().filter(|l| !l.is_empty()) {
            out.push_str(" | ");
            out.push_str(line);
        }
        if let Some(b) = battery {
            out.push_str(&format!(" | Battery: {}%", b));
        }
        out
    }
}

impl Display for ConsoleDisplay {
    fn show_mode(&mut self, mode: Mode, battery: Option<u8>) -> DeviceResult<()> {
        println!(
            "{}",
            Self::render(&format!("Mode: {}", mode), &mode.description(), battery)
        );
        Ok(())
    }

    fn show_status(
        &mut self,
        text: &str,
        mode: Mode,
        _state: DeviceState,
        battery: Option<u8>,
    ) -> DeviceResult<()> {
        println!(
            "{}",
            Self::render(&format!("Mode: {}", mode), text, battery)
        );
        Ok(())
    }
}

/// Logs the request instead of powering off.
#[derive(Debug, Default)]
pub struct LogPowerControl;

impl PowerControl for LogPowerControl {
    fn shutdown(&mut self) -> DeviceResult<()> {
        info!("[POWER] shutdown requested (bring-up: not powering off)");
        Ok(())
    }
}
