//! Debounced button input.
//!
//! TALK is read as a level (held = recording). MODE is edge-triggered and classified per
//! press cycle: released early → `Short`, held past the long-press threshold → `Long`,
//! reported once while still held. Read errors are swallowed here and count as "no event".

use crate::clock::Clock;
use crate::error::DeviceResult;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Raw digital level of one input pin (`true` = high).
pub trait PinReader {
    fn read_level(&self) -> DeviceResult<bool>;
}

/// Classified MODE press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Short,
    Long,
}

/// Timing for MODE press classification.
#[derive(Debug, Clone, Copy)]
pub struct ButtonTiming {
    /// Hold this long to get `Long` (default 5s).
    pub long_press: Duration,
    /// Releases sooner than this are contact bounce (default 50ms).
    pub debounce: Duration,
    /// New presses are ignored for this long after any reported event (default 300ms).
    pub cooldown: Duration,
}

impl Default for ButtonTiming {
    fn default() -> Self {
        Self {
            long_press: Duration::from_secs(5),
            debounce: Duration::from_millis(50),
            cooldown: Duration::from_millis(300),
        }
    }
}

/// One press cycle of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonEdgeState {
    Idle,
    Pressed {
        pressed_at: Instant,
        /// Set once `Long` has been reported for this press.
        handled: bool,
    },
}

fn is_active(pin: &dyn PinReader, active_low: bool) -> DeviceResult<bool> {
    pin.read_level().map(|high| high != active_low)
}

/// TALK button: plain level read.
pub struct TalkButton {
    pin: Box<dyn PinReader>,
    active_low: bool,
}

impl TalkButton {
    pub fn new(pin: Box<dyn PinReader>, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    pub fn is_pressed(&self) -> bool {
        match is_active(self.pin.as_ref(), self.active_low) {
            Ok(pressed) => pressed,
            Err(e) => {
                debug!("TALK pin read failed: {}", e);
                false
            }
        }
    }
}

/// MODE button: short/long classification with debounce and cooldown.
pub struct ModeButton {
    pin: Box<dyn PinReader>,
    active_low: bool,
    timing: ButtonTiming,
    clock: Arc<dyn Clock>,
    edge: ButtonEdgeState,
    cooldown_until: Option<Instant>,
}

impl ModeButton {
    pub fn new(
        pin: Box<dyn PinReader>,
        active_low: bool,
        timing: ButtonTiming,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pin,
            active_low,
            timing,
            clock,
            edge: ButtonEdgeState::Idle,
            cooldown_until: None,
        }
    }

    /// Non-blocking. Returns at most one event per physical press.
    pub fn poll(&mut self) -> Option<Press> {
        let pressed = match is_active(self.pin.as_ref(), self.active_low) {
            Ok(p) => p,
            Err(e) => {
                debug!("MODE pin read failed: {}", e);
                return None;
            }
        };
        let now = self.clock.now();

        match (self.edge, pressed) {
            (ButtonEdgeState::Idle, true) => {
                if self.cooldown_until.is_some_and(|until| now < until) {
                    return None;
                }
                self.edge = ButtonEdgeState::Pressed {
                    pressed_at: now,
                    handled: false,
                };
                None
            }
            (ButtonEdgeState::Idle, false) => None,
            (ButtonEdgeState::Pressed { pressed_at, handled: false }, true) => {
                if now.saturating_duration_since(pressed_at) >= self.timing.long_press {
                    self.edge = ButtonEdgeState::Pressed {
                        pressed_at,
                        handled: true,
                    };
                    self.report(now, Press::Long)
                } else {
                    None
                }
            }
            (ButtonEdgeState::Pressed { handled: true, .. }, true) => None,
            (ButtonEdgeState::Pressed { pressed_at, handled }, false) => {
                self.edge = ButtonEdgeState::Idle;
                if handled {
                    return None;
                }
                let held = now.saturating_duration_since(pressed_at);
                if held >= self.timing.long_press {
                    // Hold went unobserved (loop was busy); still only one event.
                    self.report(now, Press::Long)
                } else if held > self.timing.debounce {
                    self.report(now, Press::Short)
                } else {
                    debug!("MODE release after {:?} ignored as bounce", held);
                    None
                }
            }
        }
    }

    fn report(&mut self, now: Instant, press: Press) -> Option<Press> {
        self.cooldown_until = Some(now + self.timing.cooldown);
        debug!("MODE press classified as {:?}", press);
        Some(press)
    }
}

/// Both physical buttons.
pub struct InputReader {
    talk: TalkButton,
    mode: ModeButton,
}

impl InputReader {
    pub fn new(talk: TalkButton, mode: ModeButton) -> Self {
        Self { talk, mode }
    }

    pub fn is_talk_pressed(&self) -> bool {
        self.talk.is_pressed()
    }

    pub fn poll_mode_event(&mut self) -> Option<Press> {
        self.mode.poll()
    }
}
