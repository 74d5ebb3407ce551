//! # song-shredder-core
//!
//! Cuts audio files into fixed-length slices, reorders them by a global
//! shuffle or by interlacing shuffled tracks, and writes the result as one
//! MP3 next to the first input.

pub mod core;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod types;
pub mod worker;

pub use crate::{
    core::audio::{is_supported_audio, read_audio, Codec, FileCodec, SUPPORTED_EXTENSIONS},
    error::{ErrorKind, Result, ShredError},
    io::progress::{ChannelSink, EventSink, LogSink, ShredEvent},
    pipeline::{JobState, JobStatus, ShredJob},
    types::{
        ArrangeMode, AudioData, ShredOptions, ShredPlan, ShredRequest, Slice, Track,
        MAX_SLICE_LENGTH_MS, MIN_SLICE_LENGTH_MS,
    },
    worker::{JobHandle, Shredder},
};
