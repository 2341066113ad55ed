//! # parley-voice - audio and speech-model adapters
//!
//! Implements the `parley-core` capability traits on real hardware:
//!
//! ```text
//!   mic ──cpal──▶ MicRecorder ──bounded SPSC──▶ Recording ──▶ WhisperRecognizer
//!                                                               │
//!   speaker ◀──rodio── Speaker ◀── PiperSynthesizer ◀── CommandTranslator
//! ```
//!
//! Whisper needs the `whisper` feature (whisper.cpp build). Piper and the translator
//! run as subprocesses.

pub mod audio;
pub mod error;
pub mod preflight;
pub mod process;
pub mod stt;
pub mod translate;
pub mod tts;

pub use audio::{resample_to_mono, AudioConfig, CpalAudio, MicRecorder, Speaker};
pub use error::{VoiceError, VoiceResult};
pub use preflight::{run_preflight_audio_check, DetectedDevices, PreFlightAudioReport};
pub use process::DEFAULT_TIMEOUT;
pub use stt::create_recognizer;
#[cfg(feature = "whisper")]
pub use stt::WhisperRecognizer;
pub use translate::CommandTranslator;
pub use tts::{read_wav, PiperSynthesizer};
