//! # parley-device - boot wiring for the handheld translator
//!
//! GPIO and battery come from files (sysfs/IIO), audio and models from `parley-voice`,
//! and everything is handed to the `parley-core` control loop.

pub mod boot;
pub mod hardware;

pub use boot::{build_battery, build_device, build_input, production_models};
pub use hardware::{CommandPowerControl, FilePin, FixedVoltage, IioVoltageSensor, UnwiredPin};
