use std::path::PathBuf;

use thiserror::Error;

/// Central error type for the song-shredder-core crate.
#[derive(Debug, Error)]
pub enum ShredError {
    #[error("no input files were provided")]
    NoInputs,

    #[error("slice length must be between 1 and 9999 ms, got {0}")]
    SliceLengthOutOfRange(u32),

    #[error("a shred job is already in progress")]
    JobInProgress,

    #[error("failed to decode {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("{} contains no audio to slice", .path.display())]
    EmptyTrack { path: PathBuf },

    #[error("the arranged plan contains no slices")]
    EmptyPlan,

    #[error("failed to resample audio: {0}")]
    Resample(String),

    #[error("failed to encode output: {0:#}")]
    Encode(#[source] anyhow::Error),

    #[error("invalid options: {0}")]
    Options(String),

    #[error("job was cancelled")]
    Cancelled,

    #[error("shred worker panicked: {0}")]
    WorkerPanicked(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification handed to front ends alongside the message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Decode,
    EmptyPlan,
    Encode,
    Cancelled,
    Internal,
}

impl ShredError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShredError::NoInputs
            | ShredError::SliceLengthOutOfRange(_)
            | ShredError::JobInProgress
            | ShredError::Options(_) => ErrorKind::Validation,
            ShredError::Decode { .. } | ShredError::Resample(_) => ErrorKind::Decode,
            ShredError::EmptyTrack { .. } | ShredError::EmptyPlan => ErrorKind::EmptyPlan,
            ShredError::Encode(_) | ShredError::Io(_) => ErrorKind::Encode,
            ShredError::Cancelled => ErrorKind::Cancelled,
            ShredError::WorkerPanicked(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for ShredError {
    fn from(e: serde_json::Error) -> Self {
        ShredError::Options(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShredError>;
