//! Scripted peripherals and models shared by the integration tests. Every fake records
//! its calls into a shared log so tests can assert on what the flow did.

#![allow(dead_code)]

use parley_core::{
    AudioDevice, BatteryMonitor, BatteryThresholds, ButtonTiming, Clock, ControlLoop,
    DeviceError, DeviceResult, DeviceState, Display, InputReader, Language, LanguagePack,
    ManualClock, Mode, ModeButton, ModeCycle, PinReader, PowerControl, Recognizer, Recording,
    SpeechModels, SpeechSynthesizer, TalkButton, TalkFlow, TalkLimits, Translator,
    VoltageSensor,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const SAMPLE_RATE: u32 = 16000;

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn en_vi() -> Mode {
    Mode::new(Language::English, Language::Vietnamese)
}

pub fn vi_en() -> Mode {
    Mode::new(Language::Vietnamese, Language::English)
}

pub fn en_en() -> Mode {
    Mode::new(Language::English, Language::English)
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Records silence for as long as the (manual) clock says the button was held.
pub struct FakeAudio {
    pub log: Log,
    clock: ManualClock,
    started: Option<Instant>,
    pub fail_start: bool,
    pub fail_play: bool,
}

impl FakeAudio {
    pub fn new(log: Log, clock: ManualClock) -> Self {
        Self {
            log,
            clock,
            started: None,
            fail_start: false,
            fail_play: false,
        }
    }
}

impl AudioDevice for FakeAudio {
    fn start_record(&mut self) -> DeviceResult<()> {
        self.log.lock().unwrap().push("start".to_string());
        if self.fail_start {
            return Err(DeviceError::Capture("device busy".into()));
        }
        self.started = Some(self.clock.now());
        Ok(())
    }

    fn stop_record(&mut self) -> DeviceResult<Recording> {
        self.log.lock().unwrap().push("stop".to_string());
        let held = self
            .started
            .take()
            .map(|t| self.clock.now() - t)
            .unwrap_or_default();
        let len = (held.as_secs_f64() * SAMPLE_RATE as f64) as usize;
        Ok(Recording::new(vec![0.01; len], SAMPLE_RATE))
    }

    fn play(&mut self, audio: &Recording) -> DeviceResult<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("play {}", audio.samples.len()));
        if self.fail_play {
            return Err(DeviceError::Playback("speaker unplugged".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

pub enum Hearing {
    Text(String),
    Error,
    Panic,
}

pub struct ScriptedRecognizer {
    hearing: Hearing,
    pub calls: Log,
}

impl ScriptedRecognizer {
    pub fn says(text: &str) -> Self {
        Self::with(Hearing::Text(text.to_string()))
    }

    pub fn fails() -> Self {
        Self::with(Hearing::Error)
    }

    pub fn panics() -> Self {
        Self::with(Hearing::Panic)
    }

    fn with(hearing: Hearing) -> Self {
        Self {
            hearing,
            calls: new_log(),
        }
    }
}

impl Recognizer for ScriptedRecognizer {
    fn transcribe(&self, audio: &Recording) -> DeviceResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}", audio.samples.len()));
        match &self.hearing {
            Hearing::Text(t) => Ok(t.clone()),
            Hearing::Error => Err(DeviceError::Recognition("decoder failed".into())),
            Hearing::Panic => panic!("whisper context poisoned"),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

type TranslateFn = dyn Fn(&str) -> DeviceResult<String> + Send + Sync;

pub struct ScriptedTranslator {
    reply: Box<TranslateFn>,
    pub inputs: Log,
}

impl ScriptedTranslator {
    pub fn new(inputs: Log, reply: impl Fn(&str) -> DeviceResult<String> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            inputs,
        }
    }
}

impl Translator for ScriptedTranslator {
    fn translate(&self, text: &str) -> DeviceResult<String> {
        self.inputs.lock().unwrap().push(text.to_string());
        (self.reply)(text)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct RecordingSynth {
    pub spoken: Log,
    pub fail: bool,
}

impl SpeechSynthesizer for RecordingSynth {
    fn synthesize(&self, text: &str) -> DeviceResult<Recording> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(DeviceError::Synthesis("voice file missing".into()));
        }
        Ok(Recording::new(vec![0.0; 8000], SAMPLE_RATE))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// ---------------------------------------------------------------------------
// Display / power / pins / sensor
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct RecordingDisplay {
    pub log: Log,
}

impl Display for RecordingDisplay {
    fn show_mode(&mut self, mode: Mode, battery: Option<u8>) -> DeviceResult<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("mode {} {:?}", mode.label(), battery));
        Ok(())
    }

    fn show_status(
        &mut self,
        text: &str,
        _mode: Mode,
        state: DeviceState,
        _battery: Option<u8>,
    ) -> DeviceResult<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("status {} [{}]", text, state));
        Ok(())
    }
}

pub struct FakePower {
    pub log: Log,
}

impl PowerControl for FakePower {
    fn shutdown(&mut self) -> DeviceResult<()> {
        self.log.lock().unwrap().push("shutdown".to_string());
        Ok(())
    }
}

/// Active-high pin.
#[derive(Clone, Default)]
pub struct FakePin(Arc<AtomicBool>);

impl FakePin {
    pub fn press(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PinReader for FakePin {
    fn read_level(&self) -> DeviceResult<bool> {
        Ok(self.0.load(Ordering::SeqCst))
    }
}

/// `None` is a read failure.
#[derive(Clone)]
pub struct FakeSensor(pub Arc<Mutex<Option<f32>>>);

impl FakeSensor {
    pub fn new(volts: f32) -> Self {
        Self(Arc::new(Mutex::new(Some(volts))))
    }

    pub fn set(&self, volts: Option<f32>) {
        *self.0.lock().unwrap() = volts;
    }
}

impl VoltageSensor for FakeSensor {
    fn read_voltage(&self) -> DeviceResult<f32> {
        self.0
            .lock()
            .unwrap()
            .ok_or_else(|| DeviceError::Sensor("i2c nack".into()))
    }
}

// ---------------------------------------------------------------------------
// Rig
// ---------------------------------------------------------------------------

/// A talk flow over the configured modes (EN→VI and VI→EN by default) with every
/// call recorded. One scripted translator serves every mode.
pub struct Rig {
    pub talk: TalkFlow,
    pub display: RecordingDisplay,
    pub clock: ManualClock,
    pub audio_log: Log,
    pub translator_inputs: Log,
    pub spoken_en: Log,
    pub spoken_vi: Log,
}

pub struct RigOptions {
    pub modes: Vec<Mode>,
    pub en_recognizer: ScriptedRecognizer,
    pub vi_recognizer: ScriptedRecognizer,
    pub translate: Box<TranslateFn>,
    pub fail_start: bool,
    pub fail_play: bool,
    pub fail_synth: bool,
}

impl Default for RigOptions {
    fn default() -> Self {
        Self {
            modes: vec![en_vi(), vi_en()],
            en_recognizer: ScriptedRecognizer::says("hello"),
            vi_recognizer: ScriptedRecognizer::says("xin chào"),
            translate: Box::new(|s| Ok(s.to_string())),
            fail_start: false,
            fail_play: false,
            fail_synth: false,
        }
    }
}

impl Rig {
    pub fn new(options: RigOptions) -> Self {
        let clock = ManualClock::new();
        let audio_log = new_log();
        let translator_inputs = new_log();
        let spoken_en = new_log();
        let spoken_vi = new_log();

        let modes = ModeCycle::new(options.modes).unwrap();
        let packs = vec![
            LanguagePack::new(
                Language::English,
                Arc::new(options.en_recognizer),
                Arc::new(RecordingSynth {
                    spoken: spoken_en.clone(),
                    fail: options.fail_synth,
                }),
            ),
            LanguagePack::new(
                Language::Vietnamese,
                Arc::new(options.vi_recognizer),
                Arc::new(RecordingSynth {
                    spoken: spoken_vi.clone(),
                    fail: options.fail_synth,
                }),
            ),
        ];
        let translate = options.translate;
        let translator: Arc<dyn Translator> =
            Arc::new(ScriptedTranslator::new(translator_inputs.clone(), move |s| translate(s)));
        let translators = modes
            .modes()
            .iter()
            .map(|&m| (m, Arc::clone(&translator)))
            .collect();
        let models = SpeechModels::production(&modes, packs, translators).unwrap();

        let mut audio = FakeAudio::new(audio_log.clone(), clock.clone());
        audio.fail_start = options.fail_start;
        audio.fail_play = options.fail_play;

        let talk = TalkFlow::new(
            modes,
            models,
            Box::new(audio),
            Arc::new(clock.clone()),
            TalkLimits::default(),
        )
        .unwrap();

        Self {
            talk,
            display: RecordingDisplay { log: new_log() },
            clock,
            audio_log,
            translator_inputs,
            spoken_en,
            spoken_vi,
        }
    }

    /// Press, hold for `held`, release. Returns the finished utterance.
    pub fn utterance(&mut self, held: Duration) -> Option<parley_core::UtteranceOutcome> {
        assert!(self.talk.begin(&mut self.display, Some(80)));
        self.clock.advance(held);
        self.talk.finish(&mut self.display, Some(80))
    }
}

/// Control loop around a [`Rig`], with its pins, sensor and power log exposed.
pub struct Device {
    pub control: ControlLoop,
    pub talk_pin: FakePin,
    pub mode_pin: FakePin,
    pub sensor: FakeSensor,
    pub clock: ManualClock,
    pub display_log: Log,
    pub power_log: Log,
    pub audio_log: Log,
    pub spoken_en: Log,
    pub spoken_vi: Log,
}

impl Device {
    pub fn new(options: RigOptions) -> Self {
        let rig = Rig::new(options);
        let talk_pin = FakePin::default();
        let mode_pin = FakePin::default();
        let sensor = FakeSensor::new(3.75);
        let power_log = new_log();

        let input = InputReader::new(
            TalkButton::new(Box::new(talk_pin.clone()), false),
            ModeButton::new(
                Box::new(mode_pin.clone()),
                false,
                ButtonTiming::default(),
                Arc::new(rig.clock.clone()),
            ),
        );
        let battery = BatteryMonitor::new(Box::new(sensor.clone()), BatteryThresholds::default());
        let display_log = rig.display.log.clone();
        let control = ControlLoop::new(
            input,
            battery,
            rig.talk,
            Box::new(rig.display),
            Box::new(FakePower {
                log: power_log.clone(),
            }),
            Duration::from_millis(30),
        );

        Self {
            control,
            talk_pin,
            mode_pin,
            sensor,
            clock: rig.clock,
            display_log,
            power_log,
            audio_log: rig.audio_log,
            spoken_en: rig.spoken_en,
            spoken_vi: rig.spoken_vi,
        }
    }
}
