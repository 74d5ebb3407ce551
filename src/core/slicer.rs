use crate::types::{AudioData, Slice};

/// Frame offset of `ms` milliseconds into a stream at `sample_rate`.
fn frame_at(ms: u64, sample_rate: u32) -> usize {
    (ms * sample_rate as u64 / 1000) as usize
}

/// Cut `audio` into consecutive slices of `slice_length_ms`.
///
/// Boundaries are computed from absolute millisecond positions so rounding
/// never drifts across a long track. Every slice is non-empty, the last one
/// may be shorter than the rest, and together they cover the whole buffer.
pub fn slice_track(track: usize, audio: &AudioData, slice_length_ms: u32) -> Vec<Slice> {
    let total = audio.frames();
    let step = slice_length_ms.max(1) as u64;
    let mut slices = Vec::new();
    if audio.sample_rate == 0 {
        if total > 0 {
            slices.push(Slice {
                track,
                start: 0,
                end: total,
            });
        }
        return slices;
    }

    let mut start = 0usize;
    let mut ms = 0u64;

    while start < total {
        ms += step;
        let end = frame_at(ms, audio.sample_rate).min(total);
        if end > start {
            slices.push(Slice { track, start, end });
            start = end;
        }
    }

    slices
}
