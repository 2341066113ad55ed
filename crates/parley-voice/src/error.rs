//! Error types for the audio and speech-model adapters

use parley_core::DeviceError;
use thiserror::Error;

/// Result type alias for voice operations
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors raised by cpal/rodio, the model backends and their subprocesses
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Audio playback error: {0}")]
    Playback(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<cpal::DevicesError> for VoiceError {
    fn from(err: cpal::DevicesError) -> Self {
        VoiceError::AudioDevice(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for VoiceError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        VoiceError::AudioDevice(err.to_string())
    }
}

impl From<cpal::BuildStreamError> for VoiceError {
    fn from(err: cpal::BuildStreamError) -> Self {
        VoiceError::AudioStream(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for VoiceError {
    fn from(err: cpal::PlayStreamError) -> Self {
        VoiceError::AudioStream(err.to_string())
    }
}

impl From<rodio::StreamError> for VoiceError {
    fn from(err: rodio::StreamError) -> Self {
        VoiceError::Playback(err.to_string())
    }
}

impl From<rodio::PlayError> for VoiceError {
    fn from(err: rodio::PlayError) -> Self {
        VoiceError::Playback(err.to_string())
    }
}

impl From<VoiceError> for DeviceError {
    fn from(err: VoiceError) -> Self {
        let msg = err.to_string();
        match err {
            VoiceError::AudioDevice(_) | VoiceError::AudioStream(_) => DeviceError::Capture(msg),
            VoiceError::Playback(_) => DeviceError::Playback(msg),
            VoiceError::Stt(_) => DeviceError::Recognition(msg),
            VoiceError::Tts(_) | VoiceError::Wav(_) => DeviceError::Synthesis(msg),
            VoiceError::Translation(_) => DeviceError::Translation(msg),
            VoiceError::Config(_) => DeviceError::Config(msg),
            VoiceError::Io(e) => DeviceError::Io(e),
        }
    }
}
