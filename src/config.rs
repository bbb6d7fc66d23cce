//! Analysis configuration
//!
//! Thresholds used by the counter grid and the variant caller, plus the
//! window length used when streaming a chromosome.

use thiserror::Error;

use crate::genomics::ReadClassFilter;

/// Errors raised by [`SnpConfig::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Minimum percentage outside `0..=100`.
    #[error("minimum percentage {0} is outside 0..=100")]
    InvalidPercentage(f64),

    /// Interval length of zero.
    #[error("interval length must be > 0")]
    ZeroIntervalLength,

    /// No read class selected.
    #[error("at least one read class must be included")]
    NoReadClasses,
}

/// Thresholds and filters of a variant detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct SnpConfig {
    /// Minimum number of mismatching reads at a position.
    pub min_mismatching_bases: u32,

    /// Minimum variant frequency in percent.
    pub min_percentage: f64,

    /// Records with a known base quality at or below this are not counted.
    pub min_base_quality: u8,

    /// Minimum average base quality of the majority symbol.
    pub min_average_base_quality: u32,

    /// Minimum average mapping quality of the majority symbol.
    pub min_average_mapping_quality: u32,

    /// Apply the mismatch threshold to the majority symbol instead of all mismatches.
    pub use_main_base: bool,

    /// Read classes counted in coverage, differences and gaps.
    pub read_classes: ReadClassFilter,

    /// Window length streamed per batch.
    pub interval_length: u32,

    /// Annotate calls with codon effects.
    pub translate_codons: bool,
}

impl Default for SnpConfig {
    fn default() -> Self {
        Self {
            min_mismatching_bases: 5,
            min_percentage: 20.0,
            min_base_quality: 0,
            min_average_base_quality: 0,
            min_average_mapping_quality: 0,
            use_main_base: false,
            read_classes: ReadClassFilter::all(),
            interval_length: 100_000,
            translate_codons: true,
        }
    }
}

impl SnpConfig {
    /// Set the minimum number of mismatching reads.
    pub fn with_min_mismatching_bases(mut self, count: u32) -> Self {
        self.min_mismatching_bases = count;
        self
    }

    /// Set the minimum variant frequency in percent.
    pub fn with_min_percentage(mut self, percentage: f64) -> Self {
        self.min_percentage = percentage;
        self
    }

    /// Set the per-record base quality filter.
    pub fn with_min_base_quality(mut self, quality: u8) -> Self {
        self.min_base_quality = quality;
        self
    }

    /// Set the minimum average base and mapping qualities.
    pub fn with_min_average_qualities(mut self, base_quality: u32, mapping_quality: u32) -> Self {
        self.min_average_base_quality = base_quality;
        self.min_average_mapping_quality = mapping_quality;
        self
    }

    /// Switch the main-base threshold mode.
    pub fn with_main_base(mut self, enabled: bool) -> Self {
        self.use_main_base = enabled;
        self
    }

    /// Restrict the analysed read classes.
    pub fn with_read_classes(mut self, filter: ReadClassFilter) -> Self {
        self.read_classes = filter;
        self
    }

    /// Set the streamed window length.
    pub fn with_interval_length(mut self, length: u32) -> Self {
        self.interval_length = length;
        self
    }

    /// Enable or disable codon annotation.
    pub fn with_codon_translation(mut self, enabled: bool) -> Self {
        self.translate_codons = enabled;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.min_percentage) {
            return Err(ConfigError::InvalidPercentage(self.min_percentage));
        }
        if self.interval_length == 0 {
            return Err(ConfigError::ZeroIntervalLength);
        }
        if self.read_classes.is_empty() {
            return Err(ConfigError::NoReadClasses);
        }
        Ok(())
    }
}
