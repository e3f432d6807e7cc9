use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Tunable parameters for the fingerprinting and matching pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// STFT target frequency resolution in Hz; governs window size.
    pub target_res_hz: f64,

    /// Whether to downmix stereo input to mono before fingerprinting.
    pub downmix: bool,

    /// Integer decimation factor applied after the lowpass filter.
    pub decimation_factor: u32,

    /// Lowpass cutoff frequency in Hz, applied before decimation.
    pub lowpass_cutoff_hz: f64,

    /// Peak extractor band-strength coefficient (keep bins above coef * avg).
    pub band_coef: f64,

    /// Matcher zone-match tolerance (time, frequency).
    pub zone_match_tol: (f64, f64),

    /// Minimum fraction of target zones that must agree for a coherency win.
    pub coherency_coeff: f64,

    /// Minimum match ratio for a tone to be reported in the fallback stage.
    pub match_ratio_cutoff: f64,

    /// Number of worker threads used by the batch loader.
    pub worker_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_res_hz: 100.0,
            downmix: true,
            decimation_factor: 4,
            lowpass_cutoff_hz: 5000.0,
            band_coef: 0.5,
            zone_match_tol: (0.1, 0.1),
            coherency_coeff: 0.5,
            match_ratio_cutoff: 0.5,
            worker_count: 5,
        }
    }
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_res_hz(mut self, target_res_hz: f64) -> Self {
        self.target_res_hz = target_res_hz;
        self
    }

    pub fn with_downmix(mut self, downmix: bool) -> Self {
        self.downmix = downmix;
        self
    }

    pub fn with_decimation_factor(mut self, factor: u32) -> Self {
        self.decimation_factor = factor;
        self
    }

    pub fn with_lowpass_cutoff_hz(mut self, cutoff: f64) -> Self {
        self.lowpass_cutoff_hz = cutoff;
        self
    }

    pub fn with_band_coef(mut self, coef: f64) -> Self {
        self.band_coef = coef;
        self
    }

    pub fn with_zone_match_tol(mut self, tol: (f64, f64)) -> Self {
        self.zone_match_tol = tol;
        self
    }

    pub fn with_coherency_coeff(mut self, coeff: f64) -> Self {
        self.coherency_coeff = coeff;
        self
    }

    pub fn with_match_ratio_cutoff(mut self, cutoff: f64) -> Self {
        self.match_ratio_cutoff = cutoff;
        self
    }

    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| PipelineError::Store(e.to_string()))
    }

    /// Save configuration to a TOML file.
    pub fn to_file(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| PipelineError::Store(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = PipelineConfig::default();
        assert_eq!(config.target_res_hz, 100.0);
        assert_eq!(config.decimation_factor, 4);
        assert_eq!(config.band_coef, 0.5);
        assert_eq!(config.zone_match_tol, (0.1, 0.1));
        assert_eq!(config.coherency_coeff, 0.5);
        assert_eq!(config.match_ratio_cutoff, 0.5);
        assert_eq!(config.worker_count, 5);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = PipelineConfig::new()
            .with_target_res_hz(50.0)
            .with_worker_count(2);
        assert_eq!(config.target_res_hz, 50.0);
        assert_eq!(config.worker_count, 2);
    }
}
