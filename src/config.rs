//! System-wide options for the voice rack.
//!
//! The mixing engine pulls `granularity` sample-frames per tick at a fixed
//! output rate. Options can be built directly or loaded from a simple
//! `key = value` property file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Nominal output rate of the mixing engine
pub const NOMINAL_SAMPLE_RATE: u32 = 48000;

/// Largest granularity accepted per tick
pub const MAX_GRANULARITY: u32 = 4096;

/// Default number of sample-frames pulled per tick
pub const DEFAULT_GRANULARITY: u32 = 512;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Granularity must be in 1..={max}, got {value}")]
    InvalidGranularity { value: u32, max: u32 },

    #[error("Unsupported sample rate {0} Hz (only 48000 Hz is supported)")]
    UnsupportedSampleRate(u32),
}

/// Options shared by every voice in a system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemOptions {
    pub granularity: u32,
    pub sample_rate: u32,
}

impl SystemOptions {
    /// Create validated options
    pub fn new(granularity: u32, sample_rate: u32) -> Result<Self, ConfigError> {
        if granularity == 0 || granularity > MAX_GRANULARITY {
            return Err(ConfigError::InvalidGranularity {
                value: granularity,
                max: MAX_GRANULARITY,
            });
        }
        if sample_rate != NOMINAL_SAMPLE_RATE {
            return Err(ConfigError::UnsupportedSampleRate(sample_rate));
        }
        Ok(Self {
            granularity,
            sample_rate,
        })
    }
}

impl Default for SystemOptions {
    fn default() -> Self {
        Self {
            granularity: DEFAULT_GRANULARITY,
            sample_rate: NOMINAL_SAMPLE_RATE,
        }
    }
}

/// Parse a granularity value
pub fn parse_granularity(s: &str) -> Result<u32> {
    let value: u32 = s.trim().parse().context("Invalid granularity value")?;
    if value == 0 || value > MAX_GRANULARITY {
        anyhow::bail!(ConfigError::InvalidGranularity {
            value,
            max: MAX_GRANULARITY
        });
    }
    Ok(value)
}

/// Parse an output sample rate
pub fn parse_sample_rate(s: &str) -> Result<u32> {
    let value: u32 = s.trim().parse().context("Invalid sample rate value")?;
    if value != NOMINAL_SAMPLE_RATE {
        anyhow::bail!(ConfigError::UnsupportedSampleRate(value));
    }
    Ok(value)
}

/// Parse options from property-file text.
///
/// Blank lines and `#` comments are skipped, unknown keys are ignored with a
/// warning and missing keys keep their defaults.
pub fn parse_options(data: &str) -> Result<SystemOptions> {
    let mut options = SystemOptions::default();

    for (index, raw) in data.lines().enumerate() {
        let line = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            log::warn!("Key without value on line {}", index + 1);
            continue;
        };

        match key.trim() {
            "granularity" => {
                options.granularity = parse_granularity(value)
                    .with_context(|| format!("line {}", index + 1))?;
            }
            "sample_rate" => {
                options.sample_rate = parse_sample_rate(value)
                    .with_context(|| format!("line {}", index + 1))?;
            }
            other => log::warn!("Ignoring unknown option '{}'", other),
        }
    }

    Ok(options)
}

/// Load options from a property file on disk
pub fn load_options(path: &Path) -> Result<SystemOptions> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read options from {}", path.display()))?;
    parse_options(&data)
}
