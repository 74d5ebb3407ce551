#![allow(dead_code)]

use std::{
    collections::HashMap,
    f32::consts::PI,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use song_shredder_core::{AudioData, Codec, EventSink, ShredError};

/// Write a 16-bit PCM sine tone with hound.
pub fn write_tone_wav(path: &Path, sample_rate: u32, channels: u16, duration_ms: u64) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let frames = sample_rate as u64 * duration_ms / 1000;
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for n in 0..frames {
        let t = n as f32 / sample_rate as f32;
        let s = ((2.0 * PI * 440.0 * t).sin() * 0.3 * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(s).unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// Mono ramp where sample `i` holds `offset + i`, handy for tracing slices.
pub fn ramp(offset: f32, frames: usize, sample_rate: u32) -> AudioData {
    AudioData {
        samples: (0..frames).map(|i| offset + i as f32).collect(),
        sample_rate,
        channels: 1,
    }
}

/// In-memory codec: decodes from a fixed table and keeps the last encoded
/// buffer for inspection.
#[derive(Default)]
pub struct FakeCodec {
    pub inputs: HashMap<PathBuf, AudioData>,
    pub encoded: Mutex<Option<AudioData>>,
    pub fail_encode: bool,
}

impl FakeCodec {
    pub fn with_input(mut self, path: &Path, audio: AudioData) -> Self {
        self.inputs.insert(path.to_path_buf(), audio);
        self
    }

    pub fn encoded(&self) -> Option<AudioData> {
        self.encoded.lock().unwrap().clone()
    }
}

impl Codec for FakeCodec {
    fn decode(&self, path: &Path) -> anyhow::Result<AudioData> {
        self.inputs
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such input: {}", path.display()))
    }

    fn encode(&self, audio: &AudioData, out: &mut dyn Write) -> anyhow::Result<()> {
        // Write part of the payload first so a failure leaves a partial file.
        out.write_all(b"FAKE")?;
        if self.fail_encode {
            anyhow::bail!("disk full");
        }
        for s in &audio.samples {
            out.write_all(&s.to_le_bytes())?;
        }
        *self.encoded.lock().unwrap() = Some(audio.clone());
        Ok(())
    }
}

#[derive(Debug)]
pub enum Recorded {
    Progress(u8),
    Freezing,
    Completed(PathBuf),
    Failed(ShredError),
}

#[derive(Default)]
pub struct Recorder {
    pub events: Vec<Recorded>,
}

impl Recorder {
    pub fn progress(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Recorded::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn terminal_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Recorded::Completed(_) | Recorded::Failed(_)))
            .count()
    }
}

impl EventSink for Recorder {
    fn on_progress(&mut self, percent: u8) {
        self.events.push(Recorded::Progress(percent));
    }

    fn on_freezing(&mut self) {
        self.events.push(Recorded::Freezing);
    }

    fn on_completed(&mut self, output_path: &Path) {
        self.events.push(Recorded::Completed(output_path.to_path_buf()));
    }

    fn on_failed(&mut self, error: ShredError) {
        self.events.push(Recorded::Failed(error));
    }
}
