//! parley-core: control core of the handheld speech translator.
//!
//! Turns two buttons and a battery sensor into "listen → translate → speak" cycles.
//! Hardware and speech models are reached only through the traits in [`capabilities`];
//! `parley-voice` implements them for real devices and [`bringup`] provides placeholders.
//!
//! Leaf-first: [`input`] and [`battery`] feed the [`control`] loop, which drives the
//! [`talk`] flow, which protects proper nouns with the [`skeleton`] translator.

pub mod battery;
pub mod bringup;
pub mod capabilities;
pub mod clock;
pub mod config;
pub mod control;
pub mod error;
pub mod input;
pub mod mode;
pub mod skeleton;
pub mod state;
pub mod talk;

pub use battery::{BatteryMonitor, BatteryReading, BatteryThresholds, VoltageSensor};
pub use capabilities::{
    AudioDevice, Direction, Display, LanguagePack, PowerControl, Recognizer, Recording,
    SpeechModels, SpeechSynthesizer, Translator,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DeviceConfig;
pub use control::{ControlLoop, CycleOutcome, ShutdownReason};
pub use error::{DeviceError, DeviceResult};
pub use input::{ButtonTiming, InputReader, ModeButton, PinReader, Press, TalkButton};
pub use mode::{Language, Mode, ModeCycle};
pub use skeleton::{latinize, Skeleton, SkeletonTranslator, Slot, SlotMap};
pub use state::DeviceState;
pub use talk::{TalkFlow, TalkLimits, UtteranceAbort, UtteranceOutcome};
