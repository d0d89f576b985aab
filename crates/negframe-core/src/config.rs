// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.
//
// Every tunable of the frame extraction pipeline lives here and is handed to
// the extractor at construction. Sections default individually, so a JSON
// file only needs to list the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{NegframeError, Result};

/// Largest square kernel side accepted by the morphology stages.
///
/// Kernels are applied as radius `size / 2`, which must fit in a `u8`.
pub const MAX_KERNEL_SIZE: u32 = 511;

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub perforation: PerforationConfig,
    pub normalization: NormalizationConfig,
    pub rebate: RebateConfig,
    pub inner: InnerConfig,
    pub deskew: DeskewConfig,
    pub output: OutputConfig,
}

/// Perforation / border-leak removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerforationConfig {
    /// Radius of the disk used to grow zeroed regions over their halo.
    pub dilation_radius: u8,
}

impl Default for PerforationConfig {
    fn default() -> Self {
        Self { dilation_radius: 15 }
    }
}

/// Highlight-based channel normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Share (percent) of the brightest non-black pixels averaged into the
    /// reference color.
    pub top_percent: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self { top_percent: 3.0 }
    }
}

/// Outer (rebate) crop detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebateConfig {
    /// Brightness percentile above which a pixel counts as rebate.
    pub brightness_percentile: f64,
    /// Side of the square closing kernel.
    pub close_kernel: u32,
    /// Minimum share of the image the detected crop must cover.
    pub min_area_fraction: f64,
}

impl Default for RebateConfig {
    fn default() -> Self {
        Self {
            brightness_percentile: 90.0,
            close_kernel: 15,
            min_area_fraction: 0.8,
        }
    }
}

/// Inner content crop and skew detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InnerConfig {
    /// Side of the square kernel closing the bright mask.
    pub close_kernel: u32,
    /// Side of the square kernel cleaning the inverted mask (close, then open).
    pub clean_kernel: u32,
    /// Share (percent) of the brightest inner pixels averaged into the inner color.
    pub top_percent: f64,
}

impl Default for InnerConfig {
    fn default() -> Self {
        Self {
            close_kernel: 15,
            clean_kernel: 25,
            top_percent: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskewConfig {
    /// Detected angles with a larger magnitude are treated as spurious.
    pub max_skew_degrees: f64,
}

impl Default for DeskewConfig {
    fn default() -> Self {
        Self {
            max_skew_degrees: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Value of `delete_after_use` in emitted result records.
    pub delete_after_use: bool,
    /// Write the rebate and inner intermediate crops next to the input.
    pub debug_dumps: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delete_after_use: true,
            debug_dumps: false,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        check_percent("normalization.top_percent", self.normalization.top_percent)?;
        check_percent("inner.top_percent", self.inner.top_percent)?;

        let pct = self.rebate.brightness_percentile;
        if !(0.0..=100.0).contains(&pct) {
            return Err(NegframeError::invalid("rebate.brightness_percentile", pct));
        }

        let frac = self.rebate.min_area_fraction;
        if !(0.0..=1.0).contains(&frac) {
            return Err(NegframeError::invalid("rebate.min_area_fraction", frac));
        }

        check_kernel("rebate.close_kernel", self.rebate.close_kernel)?;
        check_kernel("inner.close_kernel", self.inner.close_kernel)?;
        check_kernel("inner.clean_kernel", self.inner.clean_kernel)?;

        let max_skew = self.deskew.max_skew_degrees;
        if !max_skew.is_finite() || max_skew < 0.0 {
            return Err(NegframeError::invalid("deskew.max_skew_degrees", max_skew));
        }

        Ok(())
    }
}

fn check_percent(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 100.0 {
        Ok(())
    } else {
        Err(NegframeError::invalid(name, value))
    }
}

fn check_kernel(name: &str, size: u32) -> Result<()> {
    if size == 0 || size > MAX_KERNEL_SIZE {
        return Err(NegframeError::invalid(name, size));
    }
    Ok(())
}
