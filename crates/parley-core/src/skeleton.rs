//! Skeleton-slot translation: keep proper nouns away from the neural translator.
//!
//! `extract` swaps protected spans for `[PN0]`, `[PN1]`, … and remembers the originals;
//! only the skeleton is translated; `compose` splices the originals back in.
//!
//! Detection is a heuristic, one rule per source language:
//! - Vietnamese: a place classifier (`đường`, `quận`, `thành phố`, …) followed by up to
//!   three lowercase words, ending at a function word or end of text. The classifier
//!   stays in the skeleton; the stored name has its diacritics stripped.
//! - English: a run of two to four Capitalized words.
//!
//! Placeholders the translator mangles or drops are lost from the output. Matches never
//! overlap (leftmost-first, left to right).

use crate::mode::Language;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

/// Placeholders are `[PN<n>]`: ASCII brackets and digits survive Marian-style tokenizers.
pub const PLACEHOLDER_PREFIX: &str = "[PN";

static VI_TYPED_NOUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(đường|phố|quận|huyện|thành phố|tỉnh)\s+([a-zà-ỹ]+(?:\s+[a-zà-ỹ]+){0,2})(\s+(?:vì|để|là|mà|với|do|khi|trong|ngoài|ở|tại)\b|$)",
    )
    .expect("static regex")
});

static EN_CAPITALIZED_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,3})\b").expect("static regex"));

/// One placeholder and the text it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub placeholder: String,
    pub value: String,
}

/// Slots of one utterance, in order of appearance. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotMap {
    slots: Vec<Slot>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, value: String) -> String {
        let placeholder = format!("{}{}]", PLACEHOLDER_PREFIX, self.slots.len());
        self.slots.push(Slot {
            placeholder: placeholder.clone(),
            value,
        });
        placeholder
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.placeholder == placeholder)
            .map(|s| s.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }
}

/// Result of extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    /// Source text with protected spans replaced; whitespace collapsed to single spaces.
    pub text: String,
    pub slots: SlotMap,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SkeletonTranslator;

impl SkeletonTranslator {
    pub fn new() -> Self {
        Self
    }

    /// Extract with the rule for `language` (the language `text` is in).
    pub fn extract(&self, language: Language, text: &str) -> Skeleton {
        let mut slots = SlotMap::new();
        let replaced = match language {
            Language::Vietnamese => VI_TYPED_NOUN.replace_all(text, |caps: &Captures| {
                let placeholder = slots.push(latinize(&caps[2]));
                format!("{} {}{}", &caps[1], placeholder, &caps[3])
            }),
            Language::English => EN_CAPITALIZED_RUN
                .replace_all(text, |caps: &Captures| slots.push(caps[1].to_string())),
        };
        Skeleton {
            text: normalize_whitespace(&replaced),
            slots,
        }
    }

    /// Replace every placeholder in `translated` with its stored value.
    pub fn compose(&self, translated: &str, slots: &SlotMap) -> String {
        slots.iter().fold(translated.to_string(), |acc, slot| {
            acc.replace(&slot.placeholder, &slot.value)
        })
    }
}

/// Strip diacritics: `đ/Đ` become `d/D`, everything else is NFD-decomposed and
/// non-ASCII code points dropped.
pub fn latinize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect::<String>()
        .nfd()
        .filter(|c| c.is_ascii())
        .collect()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
