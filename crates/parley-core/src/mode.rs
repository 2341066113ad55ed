//! Translation direction selected with the MODE button.
//!
//! A [`Mode`] is a (source, target) language pair. Source == target is the in-language
//! grammar-correction mode. [`ModeCycle`] walks an ordered, configured set of modes.

use crate::error::{DeviceError, DeviceResult};
use std::fmt;

/// Spoken languages the device knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Vietnamese,
    English,
}

impl Language {
    /// Short code used in configuration (`vi`, `en`).
    pub fn code(&self) -> &'static str {
        match self {
            Language::Vietnamese => "vi",
            Language::English => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "vi" => Some(Language::Vietnamese),
            "en" => Some(Language::English),
            _ => None,
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Language::Vietnamese => "Vietnamese",
            Language::English => "English",
        }
    }

    /// Phrase spoken when nothing usable was recognized.
    pub fn repeat_prompt(&self) -> &'static str {
        match self {
            Language::Vietnamese => "Bạn nói lại giúp mình",
            Language::English => "Please say again",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode {
    pub source: Language,
    pub target: Language,
}

impl Mode {
    pub const fn new(source: Language, target: Language) -> Self {
        Self { source, target }
    }

    /// Parse `"vi-en"`, `"EN_VI"`, `"en→en"` and similar.
    pub fn parse(s: &str) -> DeviceResult<Self> {
        let normalized = s.trim().replace('→', "-").replace('_', "-");
        let (src, tgt) = normalized
            .split_once('-')
            .ok_or_else(|| DeviceError::Config(format!("invalid mode '{}'", s)))?;
        match (Language::from_code(src), Language::from_code(tgt)) {
            (Some(source), Some(target)) => Ok(Self { source, target }),
            _ => Err(DeviceError::Config(format!("unknown language in mode '{}'", s))),
        }
    }

    /// True for the grammar-correction mode (speak and hear the same language).
    pub fn is_correction(&self) -> bool {
        self.source == self.target
    }

    /// Short label for the display, e.g. `VI→EN`.
    pub fn label(&self) -> String {
        format!(
            "{}→{}",
            self.source.code().to_ascii_uppercase(),
            self.target.code().to_ascii_uppercase()
        )
    }

    pub fn description(&self) -> String {
        if self.is_correction() {
            format!("Speak {}, correct grammar", self.source.display_name())
        } else {
            format!(
                "Speak {}, translate to {}",
                self.source.display_name(),
                self.target.display_name()
            )
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Ordered set of modes with one active entry. Toggling is the only mutation.
#[derive(Debug, Clone)]
pub struct ModeCycle {
    modes: Vec<Mode>,
    index: usize,
}

impl ModeCycle {
    /// The first mode in `modes` is active after boot.
    pub fn new(modes: Vec<Mode>) -> DeviceResult<Self> {
        if modes.is_empty() {
            return Err(DeviceError::Config("mode list is empty".to_string()));
        }
        Ok(Self { modes, index: 0 })
    }

    pub fn current(&self) -> Mode {
        self.modes[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Advance to the next mode, wrapping around, and return it.
    pub fn cycle(&mut self) -> Mode {
        self.index = (self.index + 1) % self.modes.len();
        self.current()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_modes() -> Vec<Mode> {
        vec![
            Mode::new(Language::English, Language::Vietnamese),
            Mode::new(Language::Vietnamese, Language::English),
            Mode::new(Language::English, Language::English),
        ]
    }

    #[test]
    fn parse_accepts_config_spellings() {
        let m = Mode::parse("vi-en").unwrap();
        assert_eq!(m, Mode::new(Language::Vietnamese, Language::English));
        assert_eq!(Mode::parse("EN_VI").unwrap().label(), "EN→VI");
        assert!(Mode::parse("en→en").unwrap().is_correction());
        assert!(Mode::parse("fr-en").is_err());
        assert!(Mode::parse("en").is_err());
    }

    #[test]
    fn cycle_returns_to_start_after_len_toggles() {
        for len in 1..=3 {
            let mut cycle = ModeCycle::new(three_modes()[..len].to_vec()).unwrap();
            let start = cycle.current();
            let mut seen = vec![start];
            for _ in 0..cycle.len() {
                seen.push(cycle.cycle());
            }
            assert_eq!(cycle.current(), start);
            // every configured mode visited before wrapping
            for m in &three_modes()[..len] {
                assert!(seen.contains(m));
            }
        }
    }

    #[test]
    fn empty_mode_list_is_rejected() {
        assert!(ModeCycle::new(Vec::new()).is_err());
    }

    #[test]
    fn descriptions() {
        let m = Mode::new(Language::English, Language::English);
        assert_eq!(m.description(), "Speak English, correct grammar");
        let m = Mode::new(Language::Vietnamese, Language::English);
        assert_eq!(m.description(), "Speak Vietnamese, translate to English");
    }
}
