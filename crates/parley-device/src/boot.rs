//! Assemble the control loop from configuration.
//!
//! Production wiring loads every configured model up front and fails boot if any mode
//! lacks one. Bring-up wiring (explicit, or no models configured at all) substitutes
//! placeholders so buttons, battery and display can be exercised on the bench.

use crate::hardware::{CommandPowerControl, FilePin, FixedVoltage, IioVoltageSensor, UnwiredPin};
use anyhow::{anyhow, Context};
use parley_core::bringup::{ConsoleDisplay, LogPowerControl, NullAudio};
use parley_core::config::{BatteryConfig, ButtonConfig};
use parley_core::{
    AudioDevice, BatteryMonitor, Clock, ControlLoop, DeviceConfig, InputReader, Language,
    LanguagePack, Mode, ModeButton, ModeCycle, PinReader, PowerControl, SpeechModels,
    SpeechSynthesizer, SystemClock, TalkButton, TalkFlow, Translator, VoltageSensor,
};
use parley_voice::{create_recognizer, AudioConfig, CommandTranslator, CpalAudio, PiperSynthesizer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

fn pin(path: &Option<PathBuf>, active_low: bool, label: &str) -> Box<dyn PinReader> {
    match path {
        Some(p) => Box::new(FilePin::new(p)),
        None => {
            warn!("{} pin not configured; button is inert", label);
            Box::new(UnwiredPin::released(active_low))
        }
    }
}

pub fn build_input(cfg: &ButtonConfig, clock: Arc<dyn Clock>) -> InputReader {
    InputReader::new(
        TalkButton::new(pin(&cfg.talk_pin, cfg.active_low, "TALK"), cfg.active_low),
        ModeButton::new(
            pin(&cfg.mode_pin, cfg.active_low, "MODE"),
            cfg.active_low,
            cfg.timing(),
            clock,
        ),
    )
}

pub fn build_battery(cfg: &BatteryConfig) -> BatteryMonitor {
    let sensor: Box<dyn VoltageSensor> = match &cfg.sensor_path {
        Some(path) => Box::new(IioVoltageSensor::new(path, cfg.adc_scale, cfg.divider_ratio)),
        None => {
            warn!("Battery sensor not configured; reporting full charge");
            Box::new(FixedVoltage(cfg.thresholds.full_voltage))
        }
    };
    BatteryMonitor::new(sensor, cfg.thresholds)
}

/// Languages used by any mode, in first-use order.
fn languages(modes: &ModeCycle) -> Vec<Language> {
    let mut out = Vec::new();
    for mode in modes.modes() {
        for lang in [mode.source, mode.target] {
            if !out.contains(&lang) {
                out.push(lang);
            }
        }
    }
    out
}

/// Load Whisper, Piper and translator for every configured mode.
pub fn production_models(cfg: &DeviceConfig, modes: &ModeCycle) -> anyhow::Result<SpeechModels> {
    let models = &cfg.models;
    let piper = models
        .piper_exe
        .clone()
        .unwrap_or_else(|| PathBuf::from("piper"));

    let mut packs = Vec::new();
    for lang in languages(modes) {
        let code = lang.code();
        let whisper = models
            .whisper
            .get(code)
            .ok_or_else(|| anyhow!("no whisper model configured for '{}'", code))?;
        let voice = models
            .piper_voices
            .get(code)
            .ok_or_else(|| anyhow!("no piper voice configured for '{}'", code))?;

        let recognizer = create_recognizer(whisper, lang)
            .with_context(|| format!("loading recognizer for '{}'", code))?;
        let synthesizer: Arc<dyn SpeechSynthesizer> =
            Arc::new(PiperSynthesizer::new(&piper, voice, lang)?.with_timeout(models.timeout()));
        packs.push(LanguagePack::new(lang, recognizer, synthesizer));
    }

    let mut translators: Vec<(Mode, Arc<dyn Translator>)> = Vec::new();
    for (key, command) in &models.translators {
        let mode = Mode::parse(key)?;
        let translator: Arc<dyn Translator> =
            Arc::new(CommandTranslator::new(command)?.with_timeout(models.timeout()));
        translators.push((mode, translator));
    }

    Ok(SpeechModels::production(modes, packs, translators)?)
}

/// Build the whole device. `bring_up` forces placeholder models, audio and power.
pub fn build_device(cfg: &DeviceConfig, bring_up: bool) -> anyhow::Result<ControlLoop> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let modes = cfg.mode_cycle()?;

    let bring_up = bring_up || cfg.models.is_empty();
    let models: SpeechModels;
    let audio: Box<dyn AudioDevice>;
    let power: Box<dyn PowerControl>;
    if bring_up {
        info!("🔧 Bring-up mode: placeholder models, no audio, shutdown is logged only");
        models = SpeechModels::bring_up(&modes);
        audio = Box::new(NullAudio::with_clock(cfg.audio.sample_rate, Arc::clone(&clock)));
        power = Box::new(LogPowerControl);
    } else {
        models = production_models(cfg, &modes)?;
        audio = Box::new(CpalAudio::new(AudioConfig {
            sample_rate: cfg.audio.sample_rate,
            ..AudioConfig::default()
        }));
        power = Box::new(CommandPowerControl::new(&cfg.power.shutdown_command)?);
    }

    info!(
        modes = ?modes.modes().iter().map(|m| m.label()).collect::<Vec<_>>(),
        "Modes configured"
    );
    let talk = TalkFlow::new(modes, models, audio, Arc::clone(&clock), cfg.talk.limits())?;

    Ok(ControlLoop::new(
        build_input(&cfg.buttons, clock),
        build_battery(&cfg.battery),
        talk,
        Box::new(ConsoleDisplay),
        power,
        cfg.control.poll_interval(),
    ))
}
