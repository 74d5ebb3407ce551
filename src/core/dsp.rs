use rubato::{FftFixedIn, Resampler};

use crate::{
    error::{Result, ShredError},
    types::{AudioData, Track},
};

const RESAMPLE_CHUNK: usize = 1024;

/// Bring every track to the highest sample rate and channel count among them
/// so slices from different files can be concatenated.
pub fn conform_tracks(tracks: Vec<Track>) -> Result<Vec<Track>> {
    let rate = tracks.iter().map(|t| t.audio.sample_rate).max().unwrap_or(0);
    let channels = tracks.iter().map(|t| t.audio.channels).max().unwrap_or(0);

    tracks
        .into_iter()
        .map(|t| {
            let audio = conform(t.audio, rate, channels)?;
            Ok(Track {
                source: t.source,
                audio,
            })
        })
        .collect()
}

pub fn conform(audio: AudioData, sample_rate: u32, channels: u16) -> Result<AudioData> {
    let audio = if audio.channels == channels {
        audio
    } else {
        AudioData {
            samples: remap_channels(&audio.samples, audio.channels, channels),
            sample_rate: audio.sample_rate,
            channels,
        }
    };

    if audio.sample_rate == sample_rate {
        return Ok(audio);
    }
    resample(&audio, sample_rate)
}

/// Output channel `c` copies input channel `c % from`.
pub fn remap_channels(interleaved: &[f32], from: u16, to: u16) -> Vec<f32> {
    let from = from.max(1) as usize;
    let to = to.max(1) as usize;
    let frames = interleaved.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in interleaved.chunks_exact(from) {
        for c in 0..to {
            out.push(frame[c % from]);
        }
    }
    out
}

pub fn resample(audio: &AudioData, sample_rate: u32) -> Result<AudioData> {
    let ch = audio.channels.max(1) as usize;
    let frames = audio.frames();
    if audio.sample_rate == 0 {
        return Err(ShredError::Resample("source sample rate is 0".into()));
    }
    let expected = (frames as u64 * sample_rate as u64).div_ceil(audio.sample_rate as u64) as usize;

    if frames == 0 {
        return Ok(AudioData::empty(sample_rate, audio.channels));
    }

    let planar = deinterleave(&audio.samples, ch);
    let mut resampler = FftFixedIn::<f32>::new(
        audio.sample_rate as usize,
        sample_rate as usize,
        RESAMPLE_CHUNK,
        2,
        ch,
    )
    .map_err(|e| ShredError::Resample(e.to_string()))?;

    let mut out: Vec<Vec<f32>> = vec![Vec::with_capacity(expected); ch];
    let mut pos = 0usize;

    loop {
        let need = resampler.input_frames_next();
        if pos + need > frames {
            break;
        }
        let chunk: Vec<&[f32]> = planar.iter().map(|c| &c[pos..pos + need]).collect();
        let res = resampler
            .process(&chunk, None)
            .map_err(|e| ShredError::Resample(e.to_string()))?;
        append_planar(&mut out, res);
        pos += need;
    }

    if pos < frames {
        let chunk: Vec<&[f32]> = planar.iter().map(|c| &c[pos..]).collect();
        let res = resampler
            .process_partial(Some(chunk.as_slice()), None)
            .map_err(|e| ShredError::Resample(e.to_string()))?;
        append_planar(&mut out, res);
    }

    // The filter delays its output; feed silence until the delayed tail is out.
    let delay = resampler.output_delay();
    while out[0].len() < expected + delay {
        let res = resampler
            .process_partial::<Vec<f32>>(None, None)
            .map_err(|e| ShredError::Resample(e.to_string()))?;
        if res[0].is_empty() {
            break;
        }
        append_planar(&mut out, res);
    }

    for c in out.iter_mut() {
        c.drain(..delay.min(c.len()));
        c.resize(expected, 0.0);
    }

    Ok(AudioData {
        samples: interleave(&out),
        sample_rate,
        channels: audio.channels,
    })
}

/// Stereo or mono layout accepted by the MP3 encoder. Wider layouts are folded
/// onto two channels by averaging even and odd channels.
pub fn to_encoder_layout(interleaved: &[f32], channels: u16) -> (Vec<f32>, u16) {
    if channels <= 2 {
        return (interleaved.to_vec(), channels.max(1));
    }

    let ch = channels as usize;
    let mut out = Vec::with_capacity(interleaved.len() / ch * 2);
    for frame in interleaved.chunks_exact(ch) {
        let (mut l, mut nl, mut r, mut nr) = (0.0f32, 0usize, 0.0f32, 0usize);
        for (i, s) in frame.iter().enumerate() {
            if i % 2 == 0 {
                l += s;
                nl += 1;
            } else {
                r += s;
                nr += 1;
            }
        }
        out.push(l / nl as f32);
        out.push(r / nr as f32);
    }
    (out, 2)
}

pub fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

fn deinterleave(interleaved: &[f32], ch: usize) -> Vec<Vec<f32>> {
    let frames = interleaved.len() / ch;
    let mut planar = vec![Vec::with_capacity(frames); ch];
    for frame in interleaved.chunks_exact(ch) {
        for (c, s) in frame.iter().enumerate() {
            planar[c].push(*s);
        }
    }
    planar
}

fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let frames = planar.first().map(Vec::len).unwrap_or(0);
    let mut out = Vec::with_capacity(frames * planar.len());
    for i in 0..frames {
        for c in planar {
            out.push(c[i]);
        }
    }
    out
}

fn append_planar(out: &mut [Vec<f32>], chunk: Vec<Vec<f32>>) {
    for (dst, src) in out.iter_mut().zip(chunk) {
        dst.extend(src);
    }
}
