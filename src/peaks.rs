use crate::spectrogram::Spectrogram;

/// Bands are expressed as `[lo, hi]` inclusive ranges over quantized
/// frequency bin indices, not Hz.
fn bands(num_bins: usize) -> [(usize, usize); 6] {
    let top = num_bins.saturating_sub(1).min(511);
    [
        (0, 10.min(top)),
        (10.min(top), 20.min(top)),
        (20.min(top), 40.min(top)),
        (40.min(top), 80.min(top)),
        (80.min(top), 160.min(top)),
        (160.min(top), top),
    ]
}

/// A frequency/time peak emitted by the extractor, expressed in quantized
/// frequency bins and integer milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    pub freq_q: u16,
    pub time_ms: u32,
}

/// Per time column, find the strongest bin in each of six fixed frequency
/// bands, keep the ones exceeding `coef` times the mean band strength, and
/// emit a peak for each survivor.
pub fn extract_peaks(spec: &Spectrogram, coef: f64) -> Vec<Peak> {
    let mut peaks = Vec::new();
    let num_bins = spec.freq_axis.len();
    if num_bins == 0 {
        return peaks;
    }
    let band_ranges = bands(num_bins);

    for (col_idx, column) in spec.magnitudes.iter().enumerate() {
        let mut band_freqs = [0u16; 6];
        let mut band_strengths = [0.0f64; 6];

        for (b, &(lo, hi)) in band_ranges.iter().enumerate() {
            if lo >= column.len() {
                continue;
            }
            let hi = hi.min(column.len() - 1);
            let mut best_bin = lo;
            let mut best_strength = column[lo] as f64;
            for bin in lo..=hi {
                let strength = column[bin] as f64;
                if strength > best_strength {
                    best_strength = strength;
                    best_bin = bin;
                }
            }
            band_freqs[b] = spec.freq_axis[best_bin];
            band_strengths[b] = best_strength;
        }

        let avg: f64 = band_strengths.iter().sum::<f64>() / band_strengths.len() as f64;
        let threshold = coef * avg;

        for b in 0..6 {
            if band_strengths[b] > threshold && band_freqs[b] != 0 {
                peaks.push(Peak {
                    freq_q: band_freqs[b],
                    time_ms: spec.times_ms[col_idx],
                });
            }
        }
    }

    peaks
}
