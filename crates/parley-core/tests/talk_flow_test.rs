//! Integration test: one utterance through the talk flow with scripted models.
//!
//! ## Scenarios
//! 1. EN→VI end to end: the proper noun skips the translator and is spliced back.
//! 2. Recognition errors, panics and empty transcripts speak the repeat phrase.
//! 3. Translation failure aborts without speaking.
//! 4. Synthesis and playback failures are swallowed.
//! 5. Short recordings and capture failures abort before recognition.
//! 6. The recording watchdog finishes a stuck utterance.
//! 7. EN→EN grammar correction keeps names out of the corrector and speaks English.
//! Every scenario ends in READY.

mod common;

use common::*;
use parley_core::{DeviceError, DeviceState, UtteranceAbort, UtteranceOutcome};
use std::time::Duration;

#[test]
fn en_vi_protects_proper_noun() {
    init_tracing();
    let mut rig = Rig::new(RigOptions {
        en_recognizer: ScriptedRecognizer::says("I live on Nguyen Trai street"),
        translate: Box::new(|s| {
            assert_eq!(s, "I live on [PN0] street");
            Ok("Tôi sống ở đường [PN0]".to_string())
        }),
        ..Default::default()
    });

    let outcome = rig.utterance(Duration::from_secs(2)).unwrap();

    assert_eq!(
        outcome,
        UtteranceOutcome::Spoken {
            heard: "I live on Nguyen Trai street".to_string(),
            said: "Tôi sống ở đường Nguyen Trai".to_string(),
        }
    );
    assert_eq!(entries(&rig.translator_inputs), vec!["I live on [PN0] street"]);
    assert_eq!(entries(&rig.spoken_vi), vec!["Tôi sống ở đường Nguyen Trai"]);
    assert!(entries(&rig.spoken_en).is_empty());
    assert_eq!(entries(&rig.audio_log), vec!["start", "stop", "play 8000"]);
    assert_eq!(rig.talk.state(), DeviceState::Ready);
}

#[test]
fn display_follows_every_phase() {
    let mut rig = Rig::new(RigOptions {
        en_recognizer: ScriptedRecognizer::says("I live on Nguyen Trai street"),
        translate: Box::new(|_| Ok("Tôi sống ở đường [PN0]".to_string())),
        ..Default::default()
    });
    rig.utterance(Duration::from_secs(2));

    let screens = entries(&rig.display.log);
    assert_eq!(
        screens,
        vec![
            "status Recording... [RECORDING]".to_string(),
            "status Translating... [TRANSLATING]".to_string(),
            "status EN: I live on Ng\nVI: Tôi sống ở đ [TRANSLATING]".to_string(),
            "status Playing... [SPEAKING]".to_string(),
            "mode EN→VI Some(80)".to_string(),
        ]
    );
}

#[test]
fn vi_en_after_toggle_uses_vietnamese_models() {
    let mut rig = Rig::new(RigOptions {
        vi_recognizer: ScriptedRecognizer::says("tôi ở quận bình thạnh"),
        translate: Box::new(|s| {
            assert_eq!(s, "tôi ở quận [PN0]");
            Ok("I am in [PN0] district".to_string())
        }),
        ..Default::default()
    });
    assert_eq!(rig.talk.toggle_mode(), Some(vi_en()));

    let outcome = rig.utterance(Duration::from_secs(3)).unwrap();

    assert!(matches!(outcome, UtteranceOutcome::Spoken { .. }));
    assert_eq!(entries(&rig.spoken_en), vec!["I am in binh thanh district"]);
}

#[test]
fn recognizer_error_speaks_repeat_phrase_in_source_language() {
    let mut rig = Rig::new(RigOptions {
        en_recognizer: ScriptedRecognizer::fails(),
        ..Default::default()
    });

    let outcome = rig.utterance(Duration::from_secs(2)).unwrap();

    assert_eq!(outcome, UtteranceOutcome::Repeated);
    assert_eq!(entries(&rig.spoken_en), vec!["Please say again"]);
    assert!(entries(&rig.translator_inputs).is_empty());
    assert_eq!(rig.talk.state(), DeviceState::Ready);
}

#[test]
fn recognizer_panic_is_contained() {
    let mut rig = Rig::new(RigOptions {
        en_recognizer: ScriptedRecognizer::panics(),
        ..Default::default()
    });

    let outcome = rig.utterance(Duration::from_secs(2)).unwrap();

    assert_eq!(outcome, UtteranceOutcome::Repeated);
    assert_eq!(rig.talk.state(), DeviceState::Ready);
}

#[test]
fn blank_transcript_in_vietnamese_mode() {
    let mut rig = Rig::new(RigOptions {
        vi_recognizer: ScriptedRecognizer::says("   "),
        ..Default::default()
    });
    rig.talk.toggle_mode();

    let outcome = rig.utterance(Duration::from_secs(2)).unwrap();

    assert_eq!(outcome, UtteranceOutcome::Repeated);
    assert_eq!(entries(&rig.spoken_vi), vec!["Bạn nói lại giúp mình"]);
}

#[test]
fn translation_failure_aborts_silently() {
    let mut rig = Rig::new(RigOptions {
        translate: Box::new(|_| Err(DeviceError::Translation("out of memory".into()))),
        ..Default::default()
    });

    let outcome = rig.utterance(Duration::from_secs(2)).unwrap();

    assert!(matches!(
        outcome,
        UtteranceOutcome::Aborted(UtteranceAbort::Translation(_))
    ));
    assert!(entries(&rig.spoken_vi).is_empty());
    assert_eq!(rig.talk.state(), DeviceState::Ready);
    assert_eq!(
        entries(&rig.display.log).last().map(String::as_str),
        Some("mode EN→VI Some(80)")
    );
}

#[test]
fn playback_failure_still_completes() {
    let mut rig = Rig::new(RigOptions {
        fail_play: true,
        ..Default::default()
    });

    let outcome = rig.utterance(Duration::from_secs(2)).unwrap();

    assert!(matches!(outcome, UtteranceOutcome::Spoken { .. }));
    assert_eq!(rig.talk.state(), DeviceState::Ready);
}

#[test]
fn synthesis_failure_skips_playback() {
    let mut rig = Rig::new(RigOptions {
        fail_synth: true,
        ..Default::default()
    });

    let outcome = rig.utterance(Duration::from_secs(2)).unwrap();

    assert!(matches!(outcome, UtteranceOutcome::Spoken { .. }));
    assert_eq!(entries(&rig.audio_log), vec!["start", "stop"]);
    assert_eq!(rig.talk.state(), DeviceState::Ready);
}

#[test]
fn short_recording_is_dropped_before_recognition() {
    let en = ScriptedRecognizer::says("hello");
    let calls = en.calls.clone();
    let mut rig = Rig::new(RigOptions {
        en_recognizer: en,
        ..Default::default()
    });

    let outcome = rig.utterance(Duration::from_millis(200)).unwrap();

    assert!(matches!(
        outcome,
        UtteranceOutcome::Aborted(UtteranceAbort::TooShort(_))
    ));
    assert!(entries(&calls).is_empty());
    assert!(entries(&rig.spoken_en).is_empty());
    assert_eq!(rig.talk.state(), DeviceState::Ready);
}

#[test]
fn capture_start_failure_returns_to_ready() {
    let mut rig = Rig::new(RigOptions {
        fail_start: true,
        ..Default::default()
    });

    assert!(!rig.talk.begin(&mut rig.display, None));
    assert_eq!(rig.talk.state(), DeviceState::Ready);
    assert_eq!(rig.talk.finish(&mut rig.display, None), None);
    assert_eq!(entries(&rig.audio_log), vec!["start"]);
}

#[test]
fn second_press_and_toggle_are_ignored_while_recording() {
    let mut rig = Rig::new(RigOptions::default());
    assert!(rig.talk.begin(&mut rig.display, None));

    assert!(!rig.talk.begin(&mut rig.display, None));
    assert_eq!(rig.talk.toggle_mode(), None);
    assert_eq!(rig.talk.mode(), en_vi());
    assert_eq!(entries(&rig.audio_log), vec!["start"]);
}

#[test]
fn watchdog_finishes_long_recording() {
    let mut rig = Rig::new(RigOptions::default());
    assert!(rig.talk.begin(&mut rig.display, None));

    rig.clock.advance(Duration::from_secs(11));
    assert_eq!(rig.talk.poll_recording(&mut rig.display, None), None);
    assert_eq!(rig.talk.state(), DeviceState::Recording);

    rig.clock.advance(Duration::from_secs(1));
    let outcome = rig.talk.poll_recording(&mut rig.display, None);
    assert!(matches!(outcome, Some(UtteranceOutcome::Spoken { .. })));
    assert_eq!(rig.talk.state(), DeviceState::Ready);

    // release after the watchdog fired is a no-op
    assert_eq!(rig.talk.finish(&mut rig.display, None), None);
}

#[test]
fn grammar_correction_mode_speaks_english() {
    let mut rig = Rig::new(RigOptions {
        modes: vec![en_vi(), vi_en(), en_en()],
        en_recognizer: ScriptedRecognizer::says("yesterday I go to Ben Thanh Market"),
        translate: Box::new(|s| {
            assert_eq!(s, "yesterday I go to [PN0]");
            Ok("Yesterday I went to [PN0].".to_string())
        }),
        ..Default::default()
    });
    assert_eq!(rig.talk.toggle_mode(), Some(vi_en()));
    assert_eq!(rig.talk.toggle_mode(), Some(en_en()));
    assert!(rig.talk.mode().is_correction());

    let outcome = rig.utterance(Duration::from_secs(2)).unwrap();

    assert_eq!(
        outcome,
        UtteranceOutcome::Spoken {
            heard: "yesterday I go to Ben Thanh Market".to_string(),
            said: "Yesterday I went to Ben Thanh Market.".to_string(),
        }
    );
    assert_eq!(entries(&rig.translator_inputs), vec!["yesterday I go to [PN0]"]);
    assert_eq!(entries(&rig.spoken_en), vec!["Yesterday I went to Ben Thanh Market."]);
    assert!(entries(&rig.spoken_vi).is_empty());

    let screens = entries(&rig.display.log);
    assert!(screens.contains(&"status EN: yesterday I \nEN: Yesterday I  [TRANSLATING]".to_string()));
    assert_eq!(screens.last().map(String::as_str), Some("mode EN→EN Some(80)"));
    assert_eq!(rig.talk.state(), DeviceState::Ready);
}
