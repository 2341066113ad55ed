//! Main control loop: battery watchdog, MODE button, TALK button, in that order, once
//! per cycle. Each step is contained on its own; only a shutdown condition ends the loop.

use crate::battery::BatteryMonitor;
use crate::capabilities::{Display, PowerControl};
use crate::input::{InputReader, Press};
use crate::state::DeviceState;
use crate::talk::{panic_message, TalkFlow};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    CriticalBattery,
    LongPress,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::CriticalBattery => f.write_str("critical battery"),
            ShutdownReason::LongPress => f.write_str("MODE long press"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Continue,
    Shutdown(ShutdownReason),
}

/// Run one loop step; a panic is logged and reported as `None`.
fn guarded<T>(step: &str, f: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => Some(v),
        Err(payload) => {
            error!(step, "Control step panicked: {}", panic_message(payload.as_ref()));
            None
        }
    }
}

pub struct ControlLoop {
    input: InputReader,
    battery: BatteryMonitor,
    talk: TalkFlow,
    display: Box<dyn Display>,
    power: Box<dyn PowerControl>,
    poll_interval: Duration,
    talk_was_pressed: bool,
    battery_percent: Option<u8>,
    low_battery_shown: bool,
}

impl ControlLoop {
    pub fn new(
        input: InputReader,
        battery: BatteryMonitor,
        talk: TalkFlow,
        display: Box<dyn Display>,
        power: Box<dyn PowerControl>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            input,
            battery,
            talk,
            display,
            power,
            poll_interval,
            talk_was_pressed: false,
            battery_percent: None,
            low_battery_shown: false,
        }
    }

    pub fn talk(&self) -> &TalkFlow {
        &self.talk
    }

    /// Show the boot screen and poll until shutdown.
    pub fn run(&mut self) -> ShutdownReason {
        self.battery_percent = Some(self.battery.get_percent());
        info!(mode = %self.talk.mode(), "✅ Ready");
        self.talk.show_mode(self.display.as_mut(), self.battery_percent);
        loop {
            match self.tick() {
                CycleOutcome::Continue => std::thread::sleep(self.poll_interval),
                CycleOutcome::Shutdown(reason) => return reason,
            }
        }
    }

    /// One polling cycle.
    pub fn tick(&mut self) -> CycleOutcome {
        if let Some(reason) = self.check_battery() {
            return self.shutdown(reason);
        }
        if let Some(reason) = self.check_mode_button() {
            return self.shutdown(reason);
        }
        self.check_talk_button();
        CycleOutcome::Continue
    }

    fn check_battery(&mut self) -> Option<ShutdownReason> {
        let reading = guarded("battery", || self.battery.poll())?;
        self.battery_percent = Some(reading.percent);

        if reading.should_shutdown {
            warn!(percent = reading.percent, "🪫 Battery critical");
            self.status("Battery critical\nShutting down...");
            return Some(ShutdownReason::CriticalBattery);
        }
        if !reading.fresh {
            return None;
        }
        if reading.is_low && !self.low_battery_shown {
            warn!(percent = reading.percent, "Battery low");
            if self.talk.state() == DeviceState::Ready {
                self.status("Battery low");
            }
        }
        self.low_battery_shown = reading.is_low;
        None
    }

    fn check_mode_button(&mut self) -> Option<ShutdownReason> {
        match guarded("mode button", || self.input.poll_mode_event()).flatten()? {
            Press::Short => {
                let toggled = guarded("mode toggle", || self.talk.toggle_mode()).flatten();
                if toggled.is_some() {
                    self.talk.show_mode(self.display.as_mut(), self.battery_percent);
                }
                None
            }
            Press::Long => {
                info!("MODE long press");
                self.status("Shutting down...");
                Some(ShutdownReason::LongPress)
            }
        }
    }

    fn check_talk_button(&mut self) {
        let pressed = guarded("talk button", || self.input.is_talk_pressed())
            .unwrap_or(self.talk_was_pressed);
        let was_pressed = std::mem::replace(&mut self.talk_was_pressed, pressed);
        let battery = self.battery_percent;

        let talk = &mut self.talk;
        let display = self.display.as_mut();
        let handled = guarded("talk flow", || match (was_pressed, pressed) {
            (false, true) if talk.state() == DeviceState::Ready => {
                talk.begin(display, battery);
            }
            (true, false) if talk.state() == DeviceState::Recording => {
                talk.finish(display, battery);
            }
            (true, true) => {
                talk.poll_recording(display, battery);
            }
            _ => {}
        });
        if handled.is_none() {
            self.talk.reset(self.display.as_mut(), self.battery_percent);
        }
    }

    fn status(&mut self, text: &str) {
        let mode = self.talk.mode();
        let state = self.talk.state();
        if let Err(e) = self
            .display
            .show_status(text, mode, state, self.battery_percent)
        {
            warn!("Display update failed: {}", e);
        }
    }

    fn shutdown(&mut self, reason: ShutdownReason) -> CycleOutcome {
        warn!(%reason, "Shutting down");
        if let Err(e) = self.power.shutdown() {
            error!("Shutdown request failed: {}", e);
        }
        CycleOutcome::Shutdown(reason)
    }
}
