//! Device state machine: READY → RECORDING → TRANSLATING → SPEAKING → READY.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Ready,
    Recording,
    Translating,
    Speaking,
}

impl DeviceState {
    /// Linear successor. Every state may also exit straight to `Ready` on error.
    pub fn next(self) -> Self {
        match self {
            DeviceState::Ready => DeviceState::Recording,
            DeviceState::Recording => DeviceState::Translating,
            DeviceState::Translating => DeviceState::Speaking,
            DeviceState::Speaking => DeviceState::Ready,
        }
    }

    pub fn can_transition_to(self, to: DeviceState) -> bool {
        to == self.next() || (to == DeviceState::Ready && self != DeviceState::Ready)
    }

    /// Status line shown on the display.
    pub fn status_text(&self) -> &'static str {
        match self {
            DeviceState::Ready => "Ready",
            DeviceState::Recording => "Recording...",
            DeviceState::Translating => "Translating...",
            DeviceState::Speaking => "Playing...",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceState::Ready => "READY",
            DeviceState::Recording => "RECORDING",
            DeviceState::Translating => "TRANSLATING",
            DeviceState::Speaking => "SPEAKING",
        };
        f.write_str(s)
    }
}
