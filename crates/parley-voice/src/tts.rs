//! **Text-to-Speech** — Piper as a subprocess.
//!
//! `piper --model <voice.onnx> --output_file <tmp.wav>` with the text on stdin; the WAV
//! is read back with hound and downmixed to mono.

use crate::error::{VoiceError, VoiceResult};
use crate::process::{run_with_deadline, DEFAULT_TIMEOUT};
use parley_core::{DeviceResult, Language, Recording, SpeechSynthesizer};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Piper voice for one language.
#[derive(Debug, Clone)]
pub struct PiperSynthesizer {
    exe: PathBuf,
    voice: PathBuf,
    name: String,
    timeout: Duration,
}

impl PiperSynthesizer {
    pub fn new(exe: impl Into<PathBuf>, voice: impl Into<PathBuf>, language: Language) -> VoiceResult<Self> {
        let voice = voice.into();
        if !voice.exists() {
            return Err(VoiceError::Config(format!(
                "Piper voice for '{}' not found: {}",
                language.code(),
                voice.display()
            )));
        }
        Ok(Self {
            exe: exe.into(),
            voice,
            name: format!("piper-{}", language.code()),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Kill piper if it has not finished within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, text: &str) -> VoiceResult<Recording> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Recording::empty(0));
        }
        let out = tempfile::Builder::new()
            .prefix("parley-tts-")
            .suffix(".wav")
            .tempfile()?;

        let mut command = Command::new(&self.exe);
        command
            .arg("--model")
            .arg(&self.voice)
            .arg("--output_file")
            .arg(out.path())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        let output = run_with_deadline(&mut command, text.as_bytes(), self.timeout, VoiceError::Tts)?;
        if !output.status.success() {
            return Err(VoiceError::Tts(format!(
                "piper exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let audio = read_wav(out.path())?;
        debug!(
            voice = %self.voice.display(),
            seconds = audio.duration().as_secs_f32(),
            "Synthesized"
        );
        Ok(audio)
    }
}

impl SpeechSynthesizer for PiperSynthesizer {
    fn synthesize(&self, text: &str) -> DeviceResult<Recording> {
        Ok(self.run(text)?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Read a PCM WAV (16-bit int or 32-bit float) as mono f32.
pub fn read_wav(path: &Path) -> VoiceResult<Recording> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };
    let channels = spec.channels.max(1) as usize;
    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|c| c.iter().sum::<f32>() / channels as f32)
            .collect()
    };
    Ok(Recording::new(mono, spec.sample_rate))
}
