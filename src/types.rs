use std::{
    ffi::OsStr,
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShredError};

pub const MIN_SLICE_LENGTH_MS: u32 = 1;
pub const MAX_SLICE_LENGTH_MS: u32 = 9999;

/// Interleaved PCM samples together with their stream layout.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioData {
    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            channels,
        }
    }

    /// Number of frames, one sample per channel each.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }
}

/// A decoded input file.
#[derive(Clone, Debug)]
pub struct Track {
    pub source: PathBuf,
    pub audio: AudioData,
}

/// A contiguous frame range of one track. Slices borrow nothing; the samples
/// are resolved against the track list they were cut from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Slice {
    pub track: usize,
    pub start: usize,
    pub end: usize,
}

impl Slice {
    pub fn frames(&self) -> usize {
        self.end - self.start
    }

    pub fn frame_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Interleaved samples covered by this slice.
    pub fn samples<'a>(&self, tracks: &'a [Track]) -> &'a [f32] {
        let audio = &tracks[self.track].audio;
        let ch = audio.channels as usize;
        &audio.samples[self.start * ch..self.end * ch]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrangeMode {
    /// One random permutation over every slice of every track.
    Shuffle,
    /// Per-track shuffle followed by round-robin across tracks.
    Interlace,
}

impl ArrangeMode {
    pub fn from_interlace(interlace: bool) -> Self {
        if interlace {
            ArrangeMode::Interlace
        } else {
            ArrangeMode::Shuffle
        }
    }
}

/// A validated job description.
#[derive(Clone, Debug)]
pub struct ShredRequest {
    paths: Vec<PathBuf>,
    slice_length_ms: u32,
    mode: ArrangeMode,
}

impl ShredRequest {
    pub fn new<P: AsRef<Path>>(paths: &[P], slice_length_ms: u32, interlace: bool) -> Result<Self> {
        if paths.is_empty() {
            return Err(ShredError::NoInputs);
        }
        if !(MIN_SLICE_LENGTH_MS..=MAX_SLICE_LENGTH_MS).contains(&slice_length_ms) {
            return Err(ShredError::SliceLengthOutOfRange(slice_length_ms));
        }

        Ok(Self {
            paths: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            slice_length_ms,
            mode: ArrangeMode::from_interlace(interlace),
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn slice_length_ms(&self) -> u32 {
        self.slice_length_ms
    }

    pub fn mode(&self) -> ArrangeMode {
        self.mode
    }

    pub fn interlace(&self) -> bool {
        self.mode == ArrangeMode::Interlace
    }
}

/// The final slice order handed to the reassembler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShredPlan {
    pub slices: Vec<Slice>,
}

impl ShredPlan {
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn total_frames(&self) -> usize {
        self.slices.iter().map(Slice::frames).sum()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ShredOptions {
    /// File name written next to the first input.
    pub output_file_name: String,
    pub bitrate_kbps: u32,
    /// Pause between the freezing notification and the export write.
    pub freeze_pause_ms: u64,
    /// Fixed shuffle seed; `None` seeds from system entropy.
    pub seed: Option<u64>,
}

impl Default for ShredOptions {
    fn default() -> Self {
        Self {
            output_file_name: "SHREDDED.mp3".into(),
            bitrate_kbps: 128,
            freeze_pause_ms: 100,
            seed: None,
        }
    }
}

impl ShredOptions {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let opts: ShredOptions = serde_json::from_str(&text)?;
        opts.validate()?;
        Ok(opts)
    }

    /// The output name must be a plain file name so the result always lands
    /// next to the first input.
    pub fn validate(&self) -> Result<()> {
        let name = &self.output_file_name;
        if name.trim().is_empty() {
            return Err(ShredError::Options("output_file_name must not be empty".into()));
        }
        if Path::new(name).file_name() != Some(OsStr::new(name)) {
            return Err(ShredError::Options(format!(
                "output_file_name must be a bare file name, got {name:?}"
            )));
        }
        Ok(())
    }
}
