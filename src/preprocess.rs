use crate::error::{PipelineError, Result};
use crate::wav::WavInfo;
use std::convert::TryInto;

/// Sign-extend a 24-bit little-endian sample (stored as 3 bytes) to i32.
fn sign_extend_24(bytes: [u8; 3]) -> i32 {
    let raw = (bytes[0] as i32) | ((bytes[1] as i32) << 8) | ((bytes[2] as i32) << 16);
    if raw & 0x0080_0000 != 0 {
        raw | !0x00FF_FFFFu32 as i32
    } else {
        raw
    }
}

fn read_samples_i64(data: &[u8], bits_per_sample: u16) -> Result<Vec<i64>> {
    let width = (bits_per_sample / 8) as usize;
    if width == 0 || data.len() % width != 0 {
        let trimmed = data.len() - (data.len() % width.max(1));
        log::warn!(
            "data length {} is not a multiple of {}; trimming to {} bytes",
            data.len(),
            width,
            trimmed
        );
    }
    let usable = data.len() - (data.len() % width);
    let mut out = Vec::with_capacity(usable / width);
    match bits_per_sample {
        8 => {
            for &b in &data[..usable] {
                out.push(b as i8 as i64);
            }
        }
        16 => {
            for chunk in data[..usable].chunks_exact(2) {
                out.push(i16::from_le_bytes([chunk[0], chunk[1]]) as i64);
            }
        }
        24 => {
            for chunk in data[..usable].chunks_exact(3) {
                out.push(sign_extend_24([chunk[0], chunk[1], chunk[2]]) as i64);
            }
        }
        32 => {
            for chunk in data[..usable].chunks_exact(4) {
                out.push(i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as i64);
            }
        }
        64 => {
            for chunk in data[..usable].chunks_exact(8) {
                out.push(i64::from_le_bytes(chunk.try_into().unwrap()));
            }
        }
        other => return Err(PipelineError::Decode(format!("unsupported bits per sample: {}", other))),
    }
    Ok(out)
}

fn write_samples(samples: &[i64], bits_per_sample: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * (bits_per_sample as usize / 8));
    match bits_per_sample {
        8 => {
            for &s in samples {
                out.push(s as i8 as u8);
            }
        }
        16 => {
            for &s in samples {
                out.extend_from_slice(&(s as i16).to_le_bytes());
            }
        }
        24 => {
            for &s in samples {
                let v = s as i32;
                out.extend_from_slice(&v.to_le_bytes()[..3]);
            }
        }
        32 => {
            for &s in samples {
                out.extend_from_slice(&(s as i32).to_le_bytes());
            }
        }
        64 => {
            for &s in samples {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
        _ => unreachable!("bit width already validated"),
    }
    out
}

/// Downmix interleaved stereo samples to mono by per-pair arithmetic mean
/// with floor-division rounding. A no-op when `info` is already mono.
pub fn downmix_to_mono(info: &WavInfo) -> Result<WavInfo> {
    if info.mono {
        return Ok(info.clone());
    }

    let mut samples = read_samples_i64(&info.data, info.bits_per_sample)?;
    if samples.len() % 2 != 0 {
        log::warn!("data length is not even, removing the last sample before downmixing");
        samples.pop();
    }

    let mono_samples: Vec<i64> = samples
        .chunks_exact(2)
        .map(|pair| (pair[0] + pair[1]).div_euclid(2))
        .collect();

    let mut out = info.clone();
    out.data = write_samples(&mono_samples, info.bits_per_sample);
    out.mono = true;
    out.bytes_per_sec /= 2;
    out.block_align /= 2;
    Ok(out)
}

/// A single second-order IIR section (RBJ-cookbook lowpass biquad, direct
/// form I), driven with its own running state.
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    fn lowpass(sample_rate: f64, cutoff: f64, q: f64) -> Self {
        let w0 = 2.0 * std::f64::consts::PI * cutoff / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();

        let b0 = (1.0 - cos_w0) / 2.0;
        let b1 = 1.0 - cos_w0;
        let b2 = (1.0 - cos_w0) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Biquad {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn process(&mut self, x0: f64) -> f64 {
        let y0 = self.b0 * x0 + self.b1 * self.x1 + self.b2 * self.x2 - self.a1 * self.y1 - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x0;
        self.y2 = self.y1;
        self.y1 = y0;
        y0
    }
}

/// Q factors splitting a 4th-order Butterworth response into a cascade of
/// two second-order sections.
const BUTTERWORTH_4_Q: [f64; 2] = [0.5411961, 1.3065630];

/// 4th-order Butterworth lowpass, applied sample-by-sample via a cascade of
/// two biquad sections derived from the bilinear transform. Output is
/// clipped to the int16 range; like the source this stage always reads and
/// writes 16-bit PCM regardless of `bits_per_sample`.
pub fn lowpass_filter(info: &WavInfo, cutoff: f64) -> Result<WavInfo> {
    if info.sample_freq == 0 {
        return Ok(info.clone());
    }

    let samples = read_samples_i64(&info.data, 16)?;
    let mut sections: Vec<Biquad> = BUTTERWORTH_4_Q
        .iter()
        .map(|&q| Biquad::lowpass(info.sample_freq as f64, cutoff, q))
        .collect();

    let filtered: Vec<i64> = samples
        .iter()
        .map(|&s| {
            let mut v = s as f64;
            for section in sections.iter_mut() {
                v = section.process(v);
            }
            v.clamp(-32768.0, 32767.0).round() as i64
        })
        .collect();

    let mut out = info.clone();
    out.data = write_samples(&filtered, 16);
    out.bits_per_sample = 16;
    out.recompute_bytes_per_sec();
    Ok(out)
}

/// Keep every `factor`-th sample. Always applies a fixed 5000 Hz lowpass
/// first. `factor` should be >= 2.
pub fn decimate(info: &WavInfo, factor: u32) -> Result<WavInfo> {
    if factor <= 1 {
        return Ok(info.clone());
    }

    let filtered = lowpass_filter(info, 5000.0)?;
    let samples = read_samples_i64(&filtered.data, 16)?;

    let decimated: Vec<i64> = samples.into_iter().step_by(factor as usize).collect();

    let mut out = filtered;
    out.data = write_samples(&decimated, 16);
    out.sample_freq /= factor;
    out.bits_per_sample = 16;
    out.recompute_bytes_per_sec();
    Ok(out)
}

/// Apply downmix (optional) followed by decimation (optional) in the
/// order the spec requires.
pub fn preprocess(info: &WavInfo, downmix: bool, decimation_factor: u32) -> Result<WavInfo> {
    let mut out = info.clone();
    if downmix {
        out = downmix_to_mono(&out)?;
    }
    if decimation_factor > 1 {
        out = decimate(&out, decimation_factor)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_info(samples: &[i16]) -> WavInfo {
        let mut data = Vec::new();
        for &s in samples {
            data.extend_from_slice(&s.to_le_bytes());
        }
        WavInfo {
            riff: "RIFF".into(),
            size: 0,
            descr: "WAVE".into(),
            fmt: "fmt ".into(),
            section_size: 16,
            type_format: 1,
            mono: false,
            sample_freq: 44100,
            bytes_per_sec: 44100 * 2 * 2,
            block_align: 4,
            bits_per_sample: 16,
            data_descr: "data".into(),
            data_chunk_size: data.len() as u32,
            data,
        }
    }

    #[test]
    fn downmix_halves_length() {
        let info = stereo_info(&[10, 20, 30, 40, 50, 60]);
        let mono = downmix_to_mono(&info).unwrap();
        assert!(mono.mono);
        assert_eq!(mono.data.len(), info.data.len() / 2);
        let samples = read_samples_i64(&mono.data, 16).unwrap();
        assert_eq!(samples, vec![15, 35, 55]);
    }

    #[test]
    fn downmix_is_noop_on_mono() {
        let mut info = stereo_info(&[1, 2]);
        info.mono = true;
        let out = downmix_to_mono(&info).unwrap();
        assert_eq!(out.data, info.data);
    }

    #[test]
    fn downmix_updates_rate_fields() {
        let info = stereo_info(&[1, 2, 3, 4]);
        let mono = downmix_to_mono(&info).unwrap();
        assert_eq!(mono.bytes_per_sec, info.bytes_per_sec / 2);
        assert_eq!(mono.block_align, info.block_align / 2);
    }

    #[test]
    fn decimate_keeps_every_kth_sample() {
        let mut info = stereo_info(&[]);
        info.mono = true;
        info.sample_freq = 8;
        let samples: Vec<i16> = (0..16).collect();
        info.data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let out = decimate(&info, 2).unwrap();
        assert_eq!(out.sample_freq, 4);
        let decimated = read_samples_i64(&out.data, 16).unwrap();
        assert_eq!(decimated.len(), 8);
    }

    #[test]
    fn decimate_rounds_up_on_non_exact_divisor() {
        let mut info = stereo_info(&[]);
        info.mono = true;
        info.sample_freq = 15;
        let samples: Vec<i16> = (0..15).collect();
        info.data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let out = decimate(&info, 2).unwrap();
        let decimated = read_samples_i64(&out.data, 16).unwrap();
        // 15 samples at step 2 keeps indices 0,2,4,...,14: ceil(15/2) = 8, not floor(15/2) = 7.
        assert_eq!(decimated.len(), 8);
    }

    #[test]
    fn lowpass_is_noop_at_zero_sample_rate() {
        let mut info = stereo_info(&[1, 2, 3, 4]);
        info.sample_freq = 0;
        let out = lowpass_filter(&info, 5000.0).unwrap();
        assert_eq!(out.data, info.data);
    }

    #[test]
    fn sign_extends_24_bit_negative() {
        let bytes = [0xFF, 0xFF, 0xFF];
        assert_eq!(sign_extend_24(bytes), -1);
    }
}
