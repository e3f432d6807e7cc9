use chfft::RFft1D;

use crate::wav::WavInfo;

/// Number of log-spaced frequency bins the quantizer maps onto.
pub const FREQ_BINS: usize = 512;
const FREQ_LOW_HZ: f64 = 20.0;
const FREQ_HIGH_HZ: f64 = 20000.0;

/// Quantize a frequency in Hz to a 9-bit log-spaced bin index in `[0, 511]`.
pub fn quantize_freq_9bit(freq_hz: f64) -> u16 {
    if freq_hz < FREQ_LOW_HZ {
        return 0;
    }
    if freq_hz > FREQ_HIGH_HZ {
        return (FREQ_BINS - 1) as u16;
    }

    let mut best_index = 0usize;
    let mut best_dist = f64::MAX;
    for i in 0..FREQ_BINS {
        let center = FREQ_LOW_HZ * (FREQ_HIGH_HZ / FREQ_LOW_HZ).powf(i as f64 / (FREQ_BINS - 1) as f64);
        let dist = (center - freq_hz).abs();
        if dist < best_dist {
            best_dist = dist;
            best_index = i;
        }
    }
    best_index as u16
}

/// A computed spectrogram: magnitude matrix indexed `[time][freq]`, the
/// quantized frequency axis, and the time axis in integer milliseconds.
pub struct Spectrogram {
    pub magnitudes: Vec<Vec<f32>>,
    pub freq_axis: Vec<u16>,
    pub times_ms: Vec<u32>,
    pub overlap: usize,
}

fn hann_window(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|n| {
            let x = (std::f64::consts::PI * 2.0 * n as f64) / (len as f64 - 1.0);
            (0.5 * (1.0 - x.cos())) as f32
        })
        .collect()
}

/// Compute a one-sided STFT of the (already preprocessed) mono samples in
/// `info`, targeting `target_res_hz` of frequency resolution.
pub fn compute_spectrogram(info: &WavInfo, target_res_hz: f64) -> Spectrogram {
    let samples = read_i16_samples(&info.data);
    let sample_freq = info.sample_freq.max(1) as f64;

    let window_size = (sample_freq / target_res_hz).round().max(2.0) as usize;
    let overlap = window_size / 2;
    let step = window_size - overlap;

    let window = hann_window(window_size);
    let mut fft = RFft1D::<f32>::new(window_size);

    let num_bins = window_size / 2 + 1;
    let raw_freq_axis: Vec<f64> = (0..num_bins)
        .map(|k| k as f64 * sample_freq / window_size as f64)
        .collect();
    let freq_axis: Vec<u16> = raw_freq_axis.iter().map(|&f| quantize_freq_9bit(f)).collect();

    let mut magnitudes = Vec::new();
    let mut times_ms = Vec::new();

    if samples.len() >= window_size {
        let mut start = 0;
        while start + window_size <= samples.len() {
            let frame: Vec<f32> = samples[start..start + window_size]
                .iter()
                .zip(window.iter())
                .map(|(&s, &w)| s as f32 * w)
                .collect();

            let spectrum = fft.forward(&frame);
            let mags: Vec<f32> = spectrum.iter().map(|c| (c.re * c.re + c.im * c.im).sqrt()).collect();
            magnitudes.push(mags);

            let time_sec = start as f64 / sample_freq;
            times_ms.push((time_sec * 1000.0).round() as u32);

            start += step;
        }
    }

    Spectrogram {
        magnitudes,
        freq_axis,
        times_ms,
        overlap,
    }
}

fn read_i16_samples(data: &[u8]) -> Vec<i16> {
    data.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_clamps_below_range() {
        assert_eq!(quantize_freq_9bit(5.0), 0);
    }

    #[test]
    fn quantize_clamps_above_range() {
        assert_eq!(quantize_freq_9bit(25000.0), 511);
    }

    #[test]
    fn quantize_is_monotonic() {
        let mut last = quantize_freq_9bit(20.0);
        let mut f = 20.0;
        while f <= 20000.0 {
            let q = quantize_freq_9bit(f);
            assert!(q >= last);
            last = q;
            f += 50.0;
        }
    }

    #[test]
    fn quantize_endpoints() {
        assert_eq!(quantize_freq_9bit(20.0), 0);
        assert_eq!(quantize_freq_9bit(20000.0), 511);
    }

    fn mono_info(sample_freq: u32, samples: &[i16]) -> WavInfo {
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
            data_chunk_size: (samples.len() * 2) as u32,
            data: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
        }
    }

    #[test]
    fn spectrogram_produces_expected_bin_count() {
        let samples: Vec<i16> = (0..4000).map(|i| ((i as f64 * 0.1).sin() * 1000.0) as i16).collect();
        let info = mono_info(8000, &samples);
        let spec = compute_spectrogram(&info, 100.0);
        let window_size = (8000.0f64 / 100.0).round() as usize;
        assert_eq!(spec.freq_axis.len(), window_size / 2 + 1);
        for row in &spec.magnitudes {
            assert_eq!(row.len(), window_size / 2 + 1);
        }
        assert!(!spec.magnitudes.is_empty());
    }

    #[test]
    fn spectrogram_empty_on_short_input() {
        let info = mono_info(8000, &[1, 2, 3]);
        let spec = compute_spectrogram(&info, 100.0);
        assert!(spec.magnitudes.is_empty());
        assert!(spec.times_ms.is_empty());
    }
}
