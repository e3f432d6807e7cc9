use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::{PipelineError, Result};

/// Parsed RIFF/WAVE container: chunk metadata plus the raw interleaved PCM
/// sample bytes. Preprocessing stages consume and return new values of this
/// type rather than mutating one in place.
#[derive(Debug, Clone)]
pub struct WavInfo {
    pub riff: String,
    pub size: u32,
    pub descr: String,
    pub fmt: String,
    pub section_size: u32,
    pub type_format: u16,
    /// True when the raw 16-bit channels field was zero. This is the
    /// source's interpretation, not standard WAVE semantics (where a
    /// channel count of 1 means mono); preserved for compatibility.
    pub mono: bool,
    pub sample_freq: u32,
    pub bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_descr: String,
    pub data_chunk_size: u32,
    pub data: Vec<u8>,
}

impl WavInfo {
    /// Number of channels implied by the mono flag.
    pub fn channels(&self) -> u32 {
        if self.mono { 1 } else { 2 }
    }

    /// Recompute `bytes_per_sec` from `sample_freq`, `bits_per_sample` and
    /// the channel count implied by `mono`.
    pub fn recompute_bytes_per_sec(&mut self) {
        self.bytes_per_sec = self.sample_freq * (self.bits_per_sample as u32 / 8) * self.channels();
    }
}

fn read_tag(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<String> {
    let mut buf = vec![0u8; len];
    cursor
        .read_exact(&mut buf)
        .map_err(|e| PipelineError::Decode(format!("short buffer reading tag: {}", e)))?;
    String::from_utf8(buf).map_err(|e| PipelineError::Decode(format!("non-UTF-8 tag: {}", e)))
}

/// Parse a canonical WAVE byte buffer into a [`WavInfo`].
///
/// Fields are consumed sequentially in the order defined by the RIFF/WAVE
/// header. Non-canonical chunks (LIST, JUNK, ...) are not handled; callers
/// must canonicalize input beforehand.
pub fn parse_wave(buffer: &[u8]) -> Result<WavInfo> {
    let mut cursor = Cursor::new(buffer);

    let riff = read_tag(&mut cursor, 4)?;
    let size = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;
    let descr = read_tag(&mut cursor, 4)?;
    let fmt = read_tag(&mut cursor, 4)?;
    let section_size = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;
    let type_format = cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;
    let raw_channels = cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;
    let mono = raw_channels == 0;
    let sample_freq = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;
    let bytes_per_sec = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;
    let block_align = cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;
    let bits_per_sample = cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;

    match bits_per_sample {
        8 | 16 | 24 | 32 | 64 => {}
        other => return Err(PipelineError::Decode(format!("unsupported bits per sample: {}", other))),
    }

    let data_descr = read_tag(&mut cursor, 4)?;
    let data_chunk_size = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;

    let mut data = Vec::new();
    cursor
        .read_to_end(&mut data)
        .map_err(|e| PipelineError::Decode(e.to_string()))?;

    Ok(WavInfo {
        riff,
        size,
        descr,
        fmt,
        section_size,
        type_format,
        mono,
        sample_freq,
        bytes_per_sec,
        block_align,
        bits_per_sample,
        data_descr,
        data_chunk_size,
        data,
    })
}
