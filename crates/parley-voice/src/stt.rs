//! **Speech-to-Text** — Whisper recognizer per spoken language.
//!
//! Built only with the `whisper` feature. Without it [`create_recognizer`] reports a
//! configuration error and the device falls back to bring-up models.

use crate::error::{VoiceError, VoiceResult};
use parley_core::{Language, Recognizer};
use std::path::Path;
use std::sync::Arc;

// -----------------------------------------------------------------------------
// Local Whisper STT (optional feature). Requires whisper.cpp/ggml; see README.
// -----------------------------------------------------------------------------
#[cfg(feature = "whisper")]
mod whisper_stt {
    use super::*;
    use parley_core::{DeviceResult, Recording};
    use std::sync::Mutex;
    use tracing::info;
    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    /// Whisper on a ggml model, decoding in a fixed language.
    /// Audio must be 16 kHz mono f32 (capture default).
    pub struct WhisperRecognizer {
        #[allow(dead_code)]
        context: WhisperContext,
        state: Mutex<whisper_rs::WhisperState>,
        language: Language,
        name: String,
    }

    impl WhisperRecognizer {
        pub fn new(model_path: &Path, language: Language) -> VoiceResult<Self> {
            let path = model_path
                .to_str()
                .ok_or_else(|| VoiceError::Config(format!("Non UTF-8 model path {:?}", model_path)))?;
            let params = WhisperContextParameters::default();
            let context = WhisperContext::new_with_params(path, params)
                .map_err(|e| VoiceError::Stt(format!("Whisper load failed: {}", e)))?;
            let state = context
                .create_state()
                .map_err(|e| VoiceError::Stt(format!("Whisper state init failed: {}", e)))?;
            info!("🧠 Whisper model loaded for '{}': {}", language.code(), path);
            Ok(Self {
                context,
                state: Mutex::new(state),
                language,
                name: format!("whisper-{}", language.code()),
            })
        }

        fn run(&self, audio: &Recording) -> VoiceResult<String> {
            if audio.samples.is_empty() {
                return Ok(String::new());
            }
            if audio.sample_rate != 16000 {
                return Err(VoiceError::Stt(format!(
                    "Whisper expects 16 kHz; got {} Hz",
                    audio.sample_rate
                )));
            }
            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_no_timestamps(true);
            params.set_language(Some(self.language.code()));

            let mut state = self
                .state
                .lock()
                .map_err(|e| VoiceError::Stt(format!("Whisper lock poisoned: {}", e)))?;
            state
                .full(params, &audio.samples)
                .map_err(|e| VoiceError::Stt(format!("Whisper inference failed: {}", e)))?;
            let text = state
                .as_iter()
                .filter_map(|seg| seg.to_str().ok().map(str::to_string))
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string();
            Ok(text)
        }
    }

    impl Recognizer for WhisperRecognizer {
        fn transcribe(&self, audio: &Recording) -> DeviceResult<String> {
            Ok(self.run(audio)?)
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}

#[cfg(feature = "whisper")]
pub use whisper_stt::WhisperRecognizer;

/// Load the recognizer for `language` from `model_path`.
pub fn create_recognizer(model_path: &Path, language: Language) -> VoiceResult<Arc<dyn Recognizer>> {
    if !model_path.exists() {
        return Err(VoiceError::Config(format!(
            "Whisper model for '{}' not found: {}",
            language.code(),
            model_path.display()
        )));
    }
    #[cfg(feature = "whisper")]
    {
        Ok(Arc::new(WhisperRecognizer::new(model_path, language)?))
    }
    #[cfg(not(feature = "whisper"))]
    {
        Err(VoiceError::Config(
            "built without the `whisper` feature; rebuild with --features whisper".to_string(),
        ))
    }
}
