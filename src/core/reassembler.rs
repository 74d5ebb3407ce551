use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    error::{Result, ShredError},
    io::progress::{reassembly_percent, ProgressTracker},
    types::{AudioData, ShredPlan, Track},
};

/// Concatenate the plan's slices in order into one buffer.
///
/// Progress after slice `k` of `T` is `base + floor((99 - base) * k / T)`.
/// `cancel` is polled between slices.
pub fn reassemble(
    tracks: &[Track],
    plan: &ShredPlan,
    base: u8,
    progress: &mut ProgressTracker<'_>,
    cancel: &AtomicBool,
) -> Result<AudioData> {
    let first = tracks.first().ok_or(ShredError::EmptyPlan)?;
    if plan.is_empty() {
        return Err(ShredError::EmptyPlan);
    }

    let channels = first.audio.channels;
    let mut out = AudioData {
        samples: Vec::with_capacity(plan.total_frames() * channels as usize),
        sample_rate: first.audio.sample_rate,
        channels,
    };

    let total = plan.len();
    for (i, slice) in plan.slices.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Err(ShredError::Cancelled);
        }
        out.samples.extend_from_slice(slice.samples(tracks));
        progress.report(reassembly_percent(base, i + 1, total));
    }

    Ok(out)
}
