use std::{fs::File, io::Write, path::Path};

use anyhow::{anyhow, Context, Result};
use log::debug;
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};
use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};
use symphonia::default::{get_codecs, get_probe};

use crate::{
    core::dsp::{to_encoder_layout, to_i16},
    types::AudioData,
};

/// File extensions the default codec can decode.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav"];

const ENCODE_CHUNK_FRAMES: usize = 8192;

pub fn is_supported_audio<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decoding and encoding collaborator used by the shred pipeline.
///
/// Both calls may block on file I/O and are only ever made from the job's
/// worker thread.
pub trait Codec: Send + Sync {
    fn decode(&self, path: &Path) -> Result<AudioData>;

    /// Encode `audio` into `out` using the codec's fixed output format.
    fn encode(&self, audio: &AudioData, out: &mut dyn Write) -> Result<()>;
}

/// Symphonia for reading, LAME for writing MP3.
#[derive(Clone, Debug)]
pub struct FileCodec {
    bitrate_kbps: u32,
}

impl FileCodec {
    pub fn new(bitrate_kbps: u32) -> Self {
        Self { bitrate_kbps }
    }
}

impl Default for FileCodec {
    fn default() -> Self {
        Self::new(128)
    }
}

impl Codec for FileCodec {
    fn decode(&self, path: &Path) -> Result<AudioData> {
        read_audio(path)
    }

    fn encode(&self, audio: &AudioData, out: &mut dyn Write) -> Result<()> {
        write_mp3(audio, self.bitrate_kbps, out)
    }
}

pub fn read_audio<P: AsRef<Path>>(path: P) -> Result<AudioData> {
    let path: &Path = path.as_ref();

    let file: File =
        File::open(path).with_context(|| format!("Failed to open audio file: {:?}", path))?;

    let mss: MediaSourceStream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint: Hint = Hint::new();

    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unsupported or unreadable audio container")?;

    let mut format = probed.format;
    let track = format.default_track().context("No default track found")?;
    let track_id = track.id;

    let mut sample_rate: u32 = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels: u16 = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Unsupported codec")?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e).context("Failed to read packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                debug!("skipping corrupt packet in {:?}: {}", path, msg);
                continue;
            }
            Err(e) => return Err(e).context("Failed to decode packet"),
        };
        sample_rate = decoded.spec().rate;
        channels = decoded.spec().channels.count() as u16;

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        buffer.copy_interleaved_ref(decoded);

        samples.extend_from_slice(buffer.samples());
    }

    if sample_rate == 0 || channels == 0 {
        return Err(anyhow!("Stream does not advertise a sample rate or channel layout"));
    }

    debug!(
        "read audio {:?}: sample_rate={}, channels={}, samples={}",
        path,
        sample_rate,
        channels,
        samples.len()
    );

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
    })
}

pub fn write_mp3(audio: &AudioData, bitrate_kbps: u32, out: &mut dyn Write) -> Result<()> {
    let (interleaved, channels) = to_encoder_layout(&audio.samples, audio.channels);

    let mut builder = Builder::new().context("Failed to create LAME builder")?;
    builder
        .set_num_channels(channels as u8)
        .map_err(|e| anyhow!("set channels: {e:?}"))?;
    builder
        .set_sample_rate(audio.sample_rate)
        .map_err(|e| anyhow!("set sample rate: {e:?}"))?;
    builder
        .set_brate(lame_bitrate(bitrate_kbps))
        .map_err(|e| anyhow!("set bitrate: {e:?}"))?;
    builder
        .set_quality(Quality::Best)
        .map_err(|e| anyhow!("set quality: {e:?}"))?;
    let mut encoder = builder
        .build()
        .map_err(|e| anyhow!("Failed to initialize LAME encoder: {e:?}"))?;

    let pcm = to_i16(&interleaved);
    let chunk_len = ENCODE_CHUNK_FRAMES * channels as usize;
    let mut mp3 = Vec::new();

    for chunk in pcm.chunks(chunk_len) {
        mp3.clear();
        mp3.reserve(mp3lame_encoder::max_required_buffer_size(
            chunk.len() / channels as usize,
        ));
        let encoded = if channels == 1 {
            encoder.encode_to_vec(MonoPcm(chunk), &mut mp3)
        } else {
            encoder.encode_to_vec(InterleavedPcm(chunk), &mut mp3)
        };
        encoded.map_err(|e| anyhow!("LAME encode failed: {e:?}"))?;
        out.write_all(&mp3)?;
    }

    mp3.clear();
    mp3.reserve(7200);
    encoder
        .flush_to_vec::<FlushNoGap>(&mut mp3)
        .map_err(|e| anyhow!("LAME flush failed: {e:?}"))?;
    out.write_all(&mp3)?;
    out.flush()?;

    Ok(())
}

/// Highest LAME bitrate not above `kbps`.
fn lame_bitrate(kbps: u32) -> Bitrate {
    match kbps {
        0..=15 => Bitrate::Kbps8,
        16..=23 => Bitrate::Kbps16,
        24..=31 => Bitrate::Kbps24,
        32..=39 => Bitrate::Kbps32,
        40..=47 => Bitrate::Kbps40,
        48..=63 => Bitrate::Kbps48,
        64..=79 => Bitrate::Kbps64,
        80..=95 => Bitrate::Kbps80,
        96..=111 => Bitrate::Kbps96,
        112..=127 => Bitrate::Kbps112,
        128..=159 => Bitrate::Kbps128,
        160..=191 => Bitrate::Kbps160,
        192..=223 => Bitrate::Kbps192,
        224..=255 => Bitrate::Kbps224,
        256..=319 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}
