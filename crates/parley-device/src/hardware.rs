//! Board peripherals reached through the filesystem and the shell.
//!
//! Pins are files holding `0` or `1` (sysfs GPIO `value` files, or plain files on a PC
//! for bench testing). The battery is an IIO ADC channel behind a voltage divider.

use parley_core::{DeviceError, DeviceResult, PinReader, PowerControl, VoltageSensor};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// Input pin backed by a file.
#[derive(Debug, Clone)]
pub struct FilePin {
    path: PathBuf,
}

impl FilePin {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PinReader for FilePin {
    fn read_level(&self) -> DeviceResult<bool> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| DeviceError::Gpio(format!("{}: {}", self.path.display(), e)))?;
        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(DeviceError::Gpio(format!(
                "{}: unexpected value '{}'",
                self.path.display(),
                other
            ))),
        }
    }
}

/// Pin with nothing attached: always reads the released level.
#[derive(Debug, Clone, Copy)]
pub struct UnwiredPin {
    level: bool,
}

impl UnwiredPin {
    pub fn released(active_low: bool) -> Self {
        Self { level: active_low }
    }
}

impl PinReader for UnwiredPin {
    fn read_level(&self) -> DeviceResult<bool> {
        Ok(self.level)
    }
}

/// IIO raw reading × volts-per-unit × divider ratio.
#[derive(Debug, Clone)]
pub struct IioVoltageSensor {
    path: PathBuf,
    scale: f32,
    divider_ratio: f32,
}

impl IioVoltageSensor {
    pub fn new(path: impl Into<PathBuf>, scale: f32, divider_ratio: f32) -> Self {
        Self {
            path: path.into(),
            scale,
            divider_ratio,
        }
    }

    fn read_raw(path: &Path) -> DeviceResult<f32> {
        let raw = fs::read_to_string(path)
            .map_err(|e| DeviceError::Sensor(format!("{}: {}", path.display(), e)))?;
        raw.trim()
            .parse::<f32>()
            .map_err(|e| DeviceError::Sensor(format!("{}: '{}': {}", path.display(), raw.trim(), e)))
    }
}

impl VoltageSensor for IioVoltageSensor {
    fn read_voltage(&self) -> DeviceResult<f32> {
        Ok(Self::read_raw(&self.path)? * self.scale * self.divider_ratio)
    }
}

/// Stand-in when no sensor is wired: a constant voltage.
#[derive(Debug, Clone, Copy)]
pub struct FixedVoltage(pub f32);

impl VoltageSensor for FixedVoltage {
    fn read_voltage(&self) -> DeviceResult<f32> {
        Ok(self.0)
    }
}

/// Powers off by running a command (default `systemctl poweroff`).
#[derive(Debug, Clone)]
pub struct CommandPowerControl {
    program: String,
    args: Vec<String>,
}

impl CommandPowerControl {
    pub fn new(command: &[String]) -> DeviceResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| DeviceError::Config("empty shutdown command".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl PowerControl for CommandPowerControl {
    fn shutdown(&mut self) -> DeviceResult<()> {
        info!("[POWER] running {} {}", self.program, self.args.join(" "));
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|e| DeviceError::Power(format!("{}: {}", self.program, e)))?;
        if !status.success() {
            return Err(DeviceError::Power(format!("{} exited with {}", self.program, status)));
        }
        Ok(())
    }
}
