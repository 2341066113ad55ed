//! Device configuration, read once at boot and immutable afterwards.
//!
//! Precedence: environment (`PARLEY_` prefix, `__` between sections, e.g.
//! `PARLEY_BUTTONS__LONG_PRESS_MS=4000`) > TOML file (`PARLEY_CONFIG` path, else
//! `config/device.toml`) > built-in defaults.

use crate::battery::BatteryThresholds;
use crate::error::{DeviceError, DeviceResult};
use crate::input::ButtonTiming;
use crate::mode::{Mode, ModeCycle};
use crate::talk::TalkLimits;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/device.toml";

fn default_modes() -> Vec<String> {
    vec!["en-vi".to_string(), "vi-en".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub buttons: ButtonConfig,
    pub battery: BatteryConfig,
    pub talk: TalkConfig,
    pub control: ControlConfig,
    /// Ordered mode codes (`en-vi`, `vi-en`, `en-en`). The first is active after boot.
    pub modes: Vec<String>,
    pub audio: AudioSettings,
    pub models: ModelConfig,
    pub power: PowerConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            buttons: ButtonConfig::default(),
            battery: BatteryConfig::default(),
            talk: TalkConfig::default(),
            control: ControlConfig::default(),
            modes: default_modes(),
            audio: AudioSettings::default(),
            models: ModelConfig::default(),
            power: PowerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    /// File holding the TALK pin level (`0`/`1`), e.g. `/sys/class/gpio/gpio17/value`.
    pub talk_pin: Option<PathBuf>,
    pub mode_pin: Option<PathBuf>,
    /// Buttons pull the line low when pressed.
    pub active_low: bool,
    pub long_press_ms: u64,
    pub debounce_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            talk_pin: None,
            mode_pin: None,
            active_low: true,
            long_press_ms: 5000,
            debounce_ms: 50,
            cooldown_ms: 300,
        }
    }
}

impl ButtonConfig {
    pub fn timing(&self) -> ButtonTiming {
        ButtonTiming {
            long_press: Duration::from_millis(self.long_press_ms),
            debounce: Duration::from_millis(self.debounce_ms),
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// IIO raw reading, e.g. `/sys/bus/iio/devices/iio:device0/in_voltage0_raw`.
    pub sensor_path: Option<PathBuf>,
    /// Volts per raw ADC unit.
    pub adc_scale: f32,
    /// Battery voltage / ADC pin voltage.
    pub divider_ratio: f32,
    pub thresholds: BatteryThresholds,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            sensor_path: None,
            adc_scale: 0.001,
            divider_ratio: 2.0,
            thresholds: BatteryThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TalkConfig {
    /// Shorter recordings are dropped.
    pub min_record_ms: u64,
    /// Recording watchdog: stop capture after this long even if TALK is still held.
    pub max_record_ms: u64,
}

impl Default for TalkConfig {
    fn default() -> Self {
        Self {
            min_record_ms: 500,
            max_record_ms: 12_000,
        }
    }
}

impl TalkConfig {
    pub fn min_record(&self) -> Duration {
        Duration::from_millis(self.min_record_ms)
    }

    pub fn max_record(&self) -> Duration {
        Duration::from_millis(self.max_record_ms)
    }

    pub fn limits(&self) -> TalkLimits {
        TalkLimits {
            min_record: self.min_record(),
            max_record: self.max_record(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub poll_interval_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30,
        }
    }
}

impl ControlConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub sample_rate: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { sample_rate: 16000 }
    }
}

/// Where the speech models live. Keys are language codes (`en`, `vi`) or mode codes
/// (`en-vi`) for translators.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Whisper ggml model per language.
    pub whisper: HashMap<String, PathBuf>,
    pub piper_exe: Option<PathBuf>,
    /// Piper `.onnx` voice per language.
    pub piper_voices: HashMap<String, PathBuf>,
    /// Translator command line per mode; text on stdin, translation on stdout.
    pub translators: HashMap<String, Vec<String>>,
    /// Piper and translator processes are killed after this long.
    pub timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            whisper: HashMap::new(),
            piper_exe: None,
            piper_voices: HashMap::new(),
            translators: HashMap::new(),
            timeout_ms: 20_000,
        }
    }
}

impl ModelConfig {
    pub fn is_empty(&self) -> bool {
        self.whisper.is_empty() && self.piper_voices.is_empty() && self.translators.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    pub shutdown_command: Vec<String>,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            shutdown_command: vec!["systemctl".to_string(), "poweroff".to_string()],
        }
    }
}

impl DeviceConfig {
    /// Load from `PARLEY_CONFIG` (or `config/device.toml` if present) and environment.
    pub fn load() -> DeviceResult<Self> {
        let path = std::env::var("PARLEY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    /// Load from `path` (skipped when missing) layered under `PARLEY_*` environment variables.
    pub fn load_from(path: &Path) -> DeviceResult<Self> {
        let builder = config::Config::builder();
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(
                config::Environment::with_prefix("PARLEY")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("modes")
                    .with_list_parse_key("power.shutdown_command"),
            )
            .build()?;

        let cfg: Self = built.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document directly (no environment layering).
    pub fn from_toml_str(s: &str) -> DeviceResult<Self> {
        let cfg: Self = toml::from_str(s).map_err(|e| DeviceError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> DeviceResult<()> {
        self.battery.thresholds.validate()?;
        self.mode_cycle()?;
        if self.buttons.debounce_ms >= self.buttons.long_press_ms {
            return Err(DeviceError::Config(format!(
                "debounce ({}ms) must be shorter than long press ({}ms)",
                self.buttons.debounce_ms, self.buttons.long_press_ms
            )));
        }
        if self.talk.min_record_ms >= self.talk.max_record_ms {
            return Err(DeviceError::Config(format!(
                "minimum recording ({}ms) must be shorter than the watchdog ({}ms)",
                self.talk.min_record_ms, self.talk.max_record_ms
            )));
        }
        if self.control.poll_interval_ms == 0 {
            return Err(DeviceError::Config("poll interval must be positive".to_string()));
        }
        if self.audio.sample_rate == 0 {
            return Err(DeviceError::Config("sample rate must be positive".to_string()));
        }
        if self.models.timeout_ms == 0 {
            return Err(DeviceError::Config("model timeout must be positive".to_string()));
        }
        for mode in self.models.translators.keys() {
            Mode::parse(mode)?;
        }
        Ok(())
    }

    pub fn mode_cycle(&self) -> DeviceResult<ModeCycle> {
        let modes = self
            .modes
            .iter()
            .map(|m| Mode::parse(m))
            .collect::<DeviceResult<Vec<_>>>()?;
        ModeCycle::new(modes)
    }
}
