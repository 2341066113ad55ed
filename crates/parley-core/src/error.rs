//! Error types for the translator appliance.
//!
//! One variant per fault class. Input faults (`Gpio`, `Sensor`) are recovered where they
//! are read; capture, playback and model faults abort the current utterance only.

use thiserror::Error;

/// Result type alias for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors raised by the device peripherals and the speech models
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("GPIO read error: {0}")]
    Gpio(String),

    #[error("Battery sensor error: {0}")]
    Sensor(String),

    #[error("Audio capture error: {0}")]
    Capture(String),

    #[error("Audio playback error: {0}")]
    Playback(String),

    #[error("Speech recognition error: {0}")]
    Recognition(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Display error: {0}")]
    Display(String),

    #[error("Power control error: {0}")]
    Power(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for DeviceError {
    fn from(err: config::ConfigError) -> Self {
        DeviceError::Config(err.to_string())
    }
}
