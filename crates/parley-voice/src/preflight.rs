//! Pre-flight audio check: verify a microphone and a speaker exist before the loop starts.

use cpal::traits::{DeviceTrait, HostTrait};
use serde::Serialize;

/// Result of the pre-flight audio check. JSON-serializable for the boot log.
#[derive(Debug, Clone, Serialize)]
pub struct PreFlightAudioReport {
    /// True if a default input device (mic) is available.
    pub mic_active: bool,
    /// True if a default output device (speaker) is available.
    pub speaker_active: bool,
    pub detected_devices: DetectedDevices,
    /// Optional message for the user when something is missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_advice: Option<String>,
}

impl PreFlightAudioReport {
    pub fn is_ready(&self) -> bool {
        self.mic_active && self.speaker_active
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct DetectedDevices {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

fn advice(mic_active: bool, speaker_active: bool) -> Option<String> {
    match (mic_active, speaker_active) {
        (true, true) => None,
        (false, true) => Some(
            "No default input device (microphone) found. Check the USB sound card or ALSA card order."
                .to_string(),
        ),
        (true, false) => Some(
            "No default output device (speaker) found. Check the amplifier and ALSA default card."
                .to_string(),
        ),
        (false, false) => Some(
            "No audio devices found. Is the sound card connected and its driver loaded?".to_string(),
        ),
    }
}

/// Run the pre-flight audio check using cpal. Safe to call from any thread.
pub fn run_preflight_audio_check() -> PreFlightAudioReport {
    let host = cpal::default_host();

    let mic_active = host.default_input_device().is_some();
    let speaker_active = host.default_output_device().is_some();

    let inputs: Vec<String> = host
        .input_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default();

    let outputs: Vec<String> = host
        .output_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default();

    PreFlightAudioReport {
        mic_active,
        speaker_active,
        detected_devices: DetectedDevices { inputs, outputs },
        user_advice: advice(mic_active, speaker_active),
    }
}
