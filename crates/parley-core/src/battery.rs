//! Battery watchdog: voltage-divider sample → percentage and two thresholds.
//!
//! A failed sensor read never escalates. The percentage falls back to the last good
//! value (100 before the first one) and both thresholds report `false`; the fault is
//! seen again on the next poll.

use crate::error::{DeviceError, DeviceResult};
use serde::Deserialize;
use tracing::{debug, warn};

/// Source of battery voltage (after undoing the divider).
pub trait VoltageSensor {
    fn read_voltage(&self) -> DeviceResult<f32>;
}

/// Voltage thresholds for a single Li-ion cell by default.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct BatteryThresholds {
    /// Reads as 0%.
    pub empty_voltage: f32,
    /// Reads as 100%.
    pub full_voltage: f32,
    /// Below this `is_low()` is true.
    pub warn_voltage: f32,
    /// Below this `should_shutdown()` is true. Must be lower than `warn_voltage`.
    pub critical_voltage: f32,
}

impl Default for BatteryThresholds {
    fn default() -> Self {
        Self {
            empty_voltage: 3.3,
            full_voltage: 4.2,
            warn_voltage: 3.5,
            critical_voltage: 3.35,
        }
    }
}

impl BatteryThresholds {
    pub fn validate(&self) -> DeviceResult<()> {
        if self.empty_voltage >= self.full_voltage {
            return Err(DeviceError::Config(format!(
                "battery empty voltage ({}) must be below full voltage ({})",
                self.empty_voltage, self.full_voltage
            )));
        }
        if self.critical_voltage >= self.warn_voltage {
            return Err(DeviceError::Config(format!(
                "battery critical voltage ({}) must be below warn voltage ({})",
                self.critical_voltage, self.warn_voltage
            )));
        }
        Ok(())
    }

    /// Linear interpolation between empty and full, clamped to 0..=100.
    pub fn percent_for(&self, voltage: f32) -> u8 {
        let span = self.full_voltage - self.empty_voltage;
        if span <= 0.0 {
            return 100;
        }
        let pct = (voltage - self.empty_voltage) / span * 100.0;
        pct.round().clamp(0.0, 100.0) as u8
    }
}

/// One poll of the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryReading {
    pub percent: u8,
    pub is_low: bool,
    pub should_shutdown: bool,
    /// `false` when the sensor read failed and the values are fallbacks.
    pub fresh: bool,
}

pub struct BatteryMonitor {
    sensor: Box<dyn VoltageSensor>,
    thresholds: BatteryThresholds,
    last_percent: Option<u8>,
}

impl BatteryMonitor {
    const DEFAULT_PERCENT: u8 = 100;

    pub fn new(sensor: Box<dyn VoltageSensor>, thresholds: BatteryThresholds) -> Self {
        Self {
            sensor,
            thresholds,
            last_percent: None,
        }
    }

    fn sample(&mut self) -> Option<f32> {
        match self.sensor.read_voltage() {
            Ok(v) => {
                debug!(voltage = v, "battery sample");
                self.last_percent = Some(self.thresholds.percent_for(v));
                Some(v)
            }
            Err(e) => {
                warn!("Battery read failed, using last known value: {}", e);
                None
            }
        }
    }

    fn fallback_percent(&self) -> u8 {
        self.last_percent.unwrap_or(Self::DEFAULT_PERCENT)
    }

    /// Sample once and derive all three values from that sample.
    pub fn poll(&mut self) -> BatteryReading {
        match self.sample() {
            Some(v) => BatteryReading {
                percent: self.thresholds.percent_for(v),
                is_low: v < self.thresholds.warn_voltage,
                should_shutdown: v < self.thresholds.critical_voltage,
                fresh: true,
            },
            None => BatteryReading {
                percent: self.fallback_percent(),
                is_low: false,
                should_shutdown: false,
                fresh: false,
            },
        }
    }

    pub fn get_percent(&mut self) -> u8 {
        self.sample();
        self.fallback_percent()
    }

    pub fn is_low(&mut self) -> bool {
        self.sample()
            .is_some_and(|v| v < self.thresholds.warn_voltage)
    }

    pub fn should_shutdown(&mut self) -> bool {
        self.sample()
            .is_some_and(|v| v < self.thresholds.critical_voltage)
    }
}
