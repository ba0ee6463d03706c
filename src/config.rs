//! Scope configuration
//!
//! Loaded once at startup. Everything the scopes need to know about timing,
//! sample memory and screen geometry lives here.

use crate::constants::{
    layout, DEFAULT_MAX_SAMPLE_LENGTH, DEFAULT_RESERVED_SAMPLE_LENGTH, PAULA_PAL_CLK, SCOPE_HZ,
};
use crate::{Result, ScopeError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scope subsystem configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Compute VU levels from the running voices
    pub real_vu_meters: bool,
    /// Scope thread rate in Hz
    pub scope_hz: u32,
    /// Clock driving the period counters, in Hz
    pub reference_clock_hz: f64,
    /// Size of one sample slot in bytes
    pub max_sample_length: u32,
    /// Size of the reserved silent region in bytes
    pub reserved_sample_length: u32,
    /// Where the strips go on screen
    pub layout: ScopeLayout,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            real_vu_meters: true,
            scope_hz: SCOPE_HZ,
            reference_clock_hz: PAULA_PAL_CLK,
            max_sample_length: DEFAULT_MAX_SAMPLE_LENGTH,
            reserved_sample_length: DEFAULT_RESERVED_SAMPLE_LENGTH,
            layout: ScopeLayout::default(),
        }
    }
}

impl ScopeConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: ScopeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::debug!("loading scope config from {}", path.display());
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.scope_hz == 0 {
            return Err(ScopeError::ConfigError("scope_hz must be positive".into()));
        }
        if !(self.reference_clock_hz.is_finite() && self.reference_clock_hz > 0.0) {
            return Err(ScopeError::ConfigError(format!(
                "reference_clock_hz must be a positive number, got {}",
                self.reference_clock_hz
            )));
        }
        if self.max_sample_length < 2 {
            return Err(ScopeError::ConfigError(format!(
                "max_sample_length must be at least 2, got {}",
                self.max_sample_length
            )));
        }
        if self.reserved_sample_length < 2 {
            return Err(ScopeError::ConfigError(format!(
                "reserved_sample_length must be at least 2, got {}",
                self.reserved_sample_length
            )));
        }
        self.layout.validate()
    }

    /// Phase step per tick for a period of 1. Divide by the period to get `dDelta`.
    pub fn period_to_delta_div(&self) -> f64 {
        self.reference_clock_hz / self.scope_hz as f64
    }
}

/// Scope strip placement inside the caller's pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeLayout {
    /// X of channel 0's strip
    pub x: usize,
    /// Y of the strips' top row
    pub y: usize,
    /// Strip width (pixels, one sample per column)
    pub width: usize,
    /// Strip height (pixels)
    pub height: usize,
    /// Gap between strips
    pub spacing: usize,
    /// Pixels per row of the target buffer
    pub stride: usize,
}

impl Default for ScopeLayout {
    fn default() -> Self {
        Self {
            x: layout::SCOPE_X,
            y: layout::SCOPE_Y,
            width: layout::SCOPE_WIDTH,
            height: layout::SCOPE_HEIGHT,
            spacing: layout::SCOPE_SPACING,
            stride: layout::SCREEN_W,
        }
    }
}

impl ScopeLayout {
    /// Left edge of a channel's strip.
    #[inline]
    pub fn channel_x(&self, ch: usize) -> usize {
        self.x + ch * (self.width + self.spacing)
    }

    /// Row of the flat centre line.
    #[inline]
    pub fn center_y(&self) -> usize {
        self.y + self.height / 2
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ScopeError::ConfigError(format!(
                "scope strip must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.stride == 0 {
            return Err(ScopeError::ConfigError("layout stride must be positive".into()));
        }
        Ok(())
    }
}
