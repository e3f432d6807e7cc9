use std::path::Path;

use crate::config::PipelineConfig;
use crate::decode::decode_file;
use crate::error::Result;
use crate::fingerprint::{build_fingerprints, num_target_zones, order_time_freq};
use crate::matcher::{self, MatchOutcome};
use crate::peaks::extract_peaks;
use crate::preprocess::preprocess;
use crate::spectrogram::compute_spectrogram;
use crate::store::IndexStore;
use crate::tone::tone_id_for_bytes;
use crate::wav::WavInfo;

/// Everything C1-C6 produce for one recording: its derived id, the
/// `(address, couple)` records ready for storage or lookup, and the
/// target-zone count those records span.
pub struct FingerprintResult {
    pub tone_id: u32,
    pub records: Vec<(u32, u64)>,
    pub num_target_zones: usize,
}

/// Run the full fingerprinting pipeline (tone id, preprocessing, STFT,
/// peak extraction, target-zone encoding) on an already-parsed `WavInfo`.
pub fn fingerprint(info: &WavInfo, config: &PipelineConfig) -> Result<FingerprintResult> {
    let tone_id = tone_id_for_bytes(&info.data);
    log::debug!("computed tone_id {} from {} raw sample bytes", tone_id, info.data.len());

    let preprocessed = preprocess(info, config.downmix, config.decimation_factor)?;
    let spectrogram = compute_spectrogram(&preprocessed, config.target_res_hz);
    let peaks = extract_peaks(&spectrogram, config.band_coef);
    let zones = num_target_zones(order_time_freq(&peaks).len());
    let records = build_fingerprints(&peaks, tone_id);

    log::debug!("extracted {} peaks, {} target zones, {} records", peaks.len(), zones, records.len());

    Ok(FingerprintResult {
        tone_id,
        records,
        num_target_zones: zones,
    })
}

/// Decode, fingerprint and store `path` under `name`. Returns `false`
/// without writing address/couple records if the tone already exists.
pub fn index_file(path: &Path, name: &str, store: &dyn IndexStore, config: &PipelineConfig) -> Result<bool> {
    let info = decode_file(path)?;
    let result = fingerprint(&info, config)?;

    if store.tone_exists(result.tone_id)? {
        log::info!("tone {} already indexed, skipping {}", result.tone_id, path.display());
        return Ok(false);
    }

    store.store_tone(result.tone_id, name)?;
    store.store_address_couples(&result.records)?;
    log::info!("indexed {} as tone {} ({} records)", path.display(), result.tone_id, result.records.len());
    Ok(true)
}

/// Decode, fingerprint and search `path` against `store`.
pub fn search_file(path: &Path, store: &dyn IndexStore, config: &PipelineConfig) -> Result<MatchOutcome> {
    let info = decode_file(path)?;
    let result = fingerprint(&info, config)?;
    let outcome = matcher::search(store, &result.records, result.num_target_zones, config)?;
    log::info!("search for {} produced {:?}", path.display(), outcome);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteIndexStore;

    fn silent_mono_wav(sample_freq: u32, num_samples: usize) -> WavInfo {
        WavInfo {
            riff: "RIFF".into(),
            size: 0,
            descr: "WAVE".into(),
            fmt: "fmt ".into(),
            section_size: 16,
            type_format: 1,
            mono: true,
            sample_freq,
            bytes_per_sec: sample_freq * 2,
            block_align: 2,
            bits_per_sample: 16,
            data_descr: "data".into(),
            data_chunk_size: (num_samples * 2) as u32,
            data: vec![0u8; num_samples * 2],
        }
    }

    #[test]
    fn silence_produces_no_target_zones() {
        let info = silent_mono_wav(44100, 44100);
        let config = PipelineConfig::default().with_downmix(false).with_decimation_factor(4);
        let result = fingerprint(&info, &config).unwrap();
        assert_eq!(result.num_target_zones, 0);
        assert!(result.records.is_empty());
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let info = silent_mono_wav(44100, 44100);
        let config = PipelineConfig::default();
        let a = fingerprint(&info, &config).unwrap();
        let b = fingerprint(&info, &config).unwrap();
        assert_eq!(a.tone_id, b.tone_id);
        assert_eq!(a.records, b.records);
    }

    #[test]
    fn indexing_twice_is_idempotent() {
        let info = silent_mono_wav(8000, 8000);
        let tone_id = tone_id_for_bytes(&info.data);
        let store = SqliteIndexStore::in_memory().unwrap();
        store.create_schema().unwrap();
        store.store_tone(tone_id, "silence").unwrap();
        assert!(store.tone_exists(tone_id).unwrap());
    }
}
