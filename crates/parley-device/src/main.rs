//! parley-device: run the translator until shutdown.
//!
//! Usage:
//!   cargo run -p parley-device -- [--config config/device.toml] [--bring-up]
//!
//! Configuration: `PARLEY_CONFIG` or `--config` (TOML), overridden by `PARLEY_*` env vars.
//! With `--bring-up`, or when no models are configured, placeholder models are used and
//! shutdown is only logged.

use anyhow::Context;
use parley_core::DeviceConfig;
use parley_device::build_device;
use parley_voice::run_preflight_audio_check;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut bring_up = false;

    while let Some(a) = args.next() {
        match a.as_str() {
            "--config" => config_path = args.next().map(PathBuf::from),
            "--bring-up" => bring_up = true,
            "--help" | "-h" => {
                eprintln!("parley-device — handheld speech translator");
                eprintln!("  --config PATH   TOML configuration (default: $PARLEY_CONFIG or config/device.toml)");
                eprintln!("  --bring-up      Placeholder models and audio; shutdown is logged only");
                eprintln!();
                eprintln!("Environment overrides use PARLEY_<SECTION>__<KEY>, e.g. PARLEY_BUTTONS__LONG_PRESS_MS=4000");
                return Ok(());
            }
            other => warn!("Ignoring unknown argument: {}", other),
        }
    }

    let cfg = match &config_path {
        Some(path) => DeviceConfig::load_from(path),
        None => DeviceConfig::load(),
    }
    .context("loading configuration")?;

    if !bring_up && !cfg.models.is_empty() {
        let report = run_preflight_audio_check();
        info!(
            "Audio pre-flight: {}",
            serde_json::to_string(&report).unwrap_or_default()
        );
        if let Some(advice) = &report.user_advice {
            warn!("{}", advice);
        }
    }

    let mut device = build_device(&cfg, bring_up).context("building device")?;
    let reason = device.run();
    info!(%reason, "Control loop stopped");
    Ok(())
}
