use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::wav::{parse_wave, WavInfo};

fn wav_info_from_pcm(sample_rate: u32, channels: u16, samples: Vec<i16>) -> WavInfo {
    let mono = channels <= 1;
    let bits_per_sample = 16u16;
    let block_align = channels.max(1) * (bits_per_sample / 8);
    let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    let data_chunk_size = data.len() as u32;

    WavInfo {
        riff: "RIFF".to_string(),
        size: 36 + data_chunk_size,
        descr: "WAVE".to_string(),
        fmt: "fmt ".to_string(),
        section_size: 16,
        type_format: 1,
        mono,
        sample_freq: sample_rate,
        bytes_per_sec: sample_rate * block_align as u32,
        block_align,
        bits_per_sample,
        data_descr: "data".to_string(),
        data_chunk_size,
        data,
    }
}

/// Decode a supported audio file (`.wav`, `.mp3`, `.flac`) into a
/// [`WavInfo`]. WAV files are parsed directly so the raw PCM body used for
/// tone id derivation is preserved exactly; other formats are decoded
/// in-process via `rodio` (backed by `symphonia`) and repackaged.
pub fn decode_file(path: &Path) -> Result<WavInfo> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "wav" => {
            let buffer = std::fs::read(path)?;
            parse_wave(&buffer)
        }
        "mp3" | "flac" => {
            let file = File::open(path)?;
            let decoder = rodio::Decoder::new(BufReader::new(file))
                .map_err(|e| PipelineError::Decode(format!("failed to decode {}: {}", path.display(), e)))?;

            let channels = rodio::Source::channels(&decoder);
            let sample_rate = rodio::Source::sample_rate(&decoder);
            let samples: Vec<i16> = rodio::Source::convert_samples(decoder).collect();

            if samples.is_empty() {
                return Err(PipelineError::Decode(format!("no samples decoded from {}", path.display())));
            }

            Ok(wav_info_from_pcm(sample_rate, channels, samples))
        }
        other => Err(PipelineError::Decode(format!("unsupported extension: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_info_from_pcm_sets_mono_for_single_channel() {
        let info = wav_info_from_pcm(8000, 1, vec![1, 2, 3]);
        assert!(info.mono);
        assert_eq!(info.data.len(), 6);
    }

    #[test]
    fn wav_info_from_pcm_sets_stereo_for_two_channels() {
        let info = wav_info_from_pcm(8000, 2, vec![1, 2, 3, 4]);
        assert!(!info.mono);
    }
}
