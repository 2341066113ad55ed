//! Microphone capture (cpal) and speaker playback (rodio).
//!
//! Capture is single-producer/single-consumer: the cpal callback thread resamples each
//! buffer to mono at the target rate and `try_send`s it into a bounded channel. The
//! callback never blocks; when the channel is full the chunk is dropped and counted.
//! `stop_record` drops the stream, so the callback is gone before the receiver is
//! drained and the samples are handed over as one [`Recording`].

use crate::error::{VoiceError, VoiceResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use parley_core::{AudioDevice, DeviceResult, Recording};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Audio configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Sample rate handed to the recognizer (default: 16000)
    pub sample_rate: u32,

    /// Capture chunks buffered between callback and consumer. cpal delivers roughly
    /// 10ms per callback, so the default covers ~20s of speech.
    pub chunk_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            chunk_capacity: 2048,
        }
    }
}

/// Convert interleaved multi-channel audio at any rate to mono at `to_rate`
/// (channel average, nearest-sample resampling).
pub fn resample_to_mono(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Vec<f32> {
    if channels == 0 || samples.is_empty() || from_rate == 0 {
        return Vec::new();
    }
    let mono: Vec<f32> = if channels == 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|c| c.iter().sum::<f32>() / channels as f32)
            .collect()
    };
    if from_rate == to_rate {
        return mono;
    }
    let out_len = (mono.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src_idx = (i as f64 * from_rate as f64 / to_rate as f64) as usize;
        if src_idx >= mono.len() {
            break;
        }
        out.push(mono[src_idx]);
    }
    out
}

struct ActiveCapture {
    stream: Stream,
    chunks: mpsc::Receiver<Vec<f32>>,
    dropped: Arc<AtomicUsize>,
}

/// Push-to-talk recorder on the default input device.
pub struct MicRecorder {
    config: AudioConfig,
    active: Option<ActiveCapture>,
}

impl MicRecorder {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Open the default input device and start filling the chunk channel.
    pub fn start(&mut self) -> VoiceResult<()> {
        if self.active.take().is_some() {
            warn!("Previous capture still open; discarding it");
        }

        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| VoiceError::AudioDevice("No input device available".to_string()))?;
        let input_config = device.default_input_config()?;
        let from_rate = input_config.sample_rate().0;
        let channels = input_config.channels() as usize;
        let to_rate = self.config.sample_rate;
        let stream_config: StreamConfig = input_config.clone().into();

        let (tx, rx) = mpsc::channel::<Vec<f32>>(self.config.chunk_capacity);
        let dropped = Arc::new(AtomicUsize::new(0));
        let dropped_in_callback = Arc::clone(&dropped);

        let stream = match input_config.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mono = resample_to_mono(data, channels, from_rate, to_rate);
                    if tx.try_send(mono).is_err() {
                        dropped_in_callback.fetch_add(1, Ordering::Relaxed);
                    }
                },
                move |err| warn!("Audio stream error: {}", err),
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let samples: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0f32).collect();
                    let mono = resample_to_mono(&samples, channels, from_rate, to_rate);
                    if tx.try_send(mono).is_err() {
                        dropped_in_callback.fetch_add(1, Ordering::Relaxed);
                    }
                },
                move |err| warn!("Audio stream error: {}", err),
                None,
            )?,
            other => {
                return Err(VoiceError::AudioDevice(format!(
                    "Unsupported sample format {:?} (need F32 or I16)",
                    other
                )))
            }
        };
        stream.play()?;

        debug!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            from_rate,
            channels,
            "🎤 Capture started"
        );
        self.active = Some(ActiveCapture {
            stream,
            chunks: rx,
            dropped,
        });
        Ok(())
    }

    /// Close the stream and take ownership of everything captured.
    pub fn stop(&mut self) -> VoiceResult<Recording> {
        let ActiveCapture {
            stream,
            mut chunks,
            dropped,
        } = self
            .active
            .take()
            .ok_or_else(|| VoiceError::AudioStream("Capture was not started".to_string()))?;
        drop(stream);

        let mut samples = Vec::new();
        while let Ok(chunk) = chunks.try_recv() {
            samples.extend_from_slice(&chunk);
        }
        let lost = dropped.load(Ordering::Relaxed);
        if lost > 0 {
            warn!(lost, "Capture buffer overflowed; chunks dropped");
        }
        Ok(Recording::new(samples, self.config.sample_rate))
    }
}

/// Blocking playback on the default output device.
#[derive(Debug, Default)]
pub struct Speaker;

impl Speaker {
    pub fn new() -> Self {
        Self
    }

    /// Play to the end. The output stream is opened per call so a replugged speaker
    /// is picked up on the next utterance.
    pub fn play(&self, audio: &Recording) -> VoiceResult<()> {
        if audio.is_empty() {
            return Ok(());
        }
        let (_stream, handle) = rodio::OutputStream::try_default()?;
        let sink = rodio::Sink::try_new(&handle)?;
        sink.append(rodio::buffer::SamplesBuffer::new(
            1,
            audio.sample_rate,
            audio.samples.clone(),
        ));
        sink.sleep_until_end();
        Ok(())
    }
}

/// [`AudioDevice`] over the default microphone and speaker.
pub struct CpalAudio {
    recorder: MicRecorder,
    speaker: Speaker,
}

impl CpalAudio {
    pub fn new(config: AudioConfig) -> Self {
        info!("🔊 Audio: {} Hz mono capture, default output", config.sample_rate);
        Self {
            recorder: MicRecorder::new(config),
            speaker: Speaker::new(),
        }
    }
}

impl AudioDevice for CpalAudio {
    fn start_record(&mut self) -> DeviceResult<()> {
        Ok(self.recorder.start()?)
    }

    fn stop_record(&mut self) -> DeviceResult<Recording> {
        Ok(self.recorder.stop()?)
    }

    fn play(&mut self, audio: &Recording) -> DeviceResult<()> {
        Ok(self.speaker.play(audio)?)
    }
}
