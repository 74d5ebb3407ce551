use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::debug;
use tempfile::Builder;

use crate::{
    core::audio::Codec,
    error::{Result, ShredError},
    types::AudioData,
};

/// Output location: the first input's directory plus the fixed file name.
pub fn output_path(first_input: &Path, file_name: &str) -> PathBuf {
    let dir = match first_input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    dir.join(file_name)
}

/// Encode `audio` to `destination`.
///
/// The encoder writes into a temporary file next to the destination which is
/// renamed into place only once encoding finished; on error the temporary
/// file is removed and nothing appears at `destination`.
pub fn export(codec: &dyn Codec, audio: &AudioData, destination: &Path) -> Result<PathBuf> {
    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = Builder::new()
        .prefix(".shredding-")
        .suffix(".part")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        codec.encode(audio, &mut writer).map_err(ShredError::Encode)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    debug!("persisting {:?} -> {:?}", tmp.path(), destination);
    tmp.persist(destination).map_err(|e| ShredError::Io(e.error))?;

    Ok(destination.to_path_buf())
}
