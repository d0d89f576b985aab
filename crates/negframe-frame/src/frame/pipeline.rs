// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame extraction orchestrator — sequences perforation removal, highlight
// normalization, rebate and inner detection, and crop/deskew of the original.
//
// Geometry is detected on the normalized working copy but applied to the
// perforation-cleaned original, so the output keeps the scan's own colors.

use std::path::{Path, PathBuf};

use image::RgbImage;
use negframe_core::error::{NegframeError, Result};
use negframe_core::{Detection, PipelineConfig, Rect, ResultRecord, RgbColor};
use tracing::{debug, info, instrument, warn};

use super::deskew::{apply_crop_and_deskew, compose_rect};
use super::inner::detect_inner;
use super::normalize::normalize_highlights;
use super::perforation::remove_perforation;
use super::rebate::detect_rebate;
use crate::image::io::{load_rgb, save_png};

/// Everything one extraction produced, before anything is written to disk.
#[derive(Debug, Clone)]
pub struct FrameExtraction {
    /// Cropped and deskewed frame from the original pixels.
    pub image: RgbImage,
    /// Highlight reference used for normalization.
    pub reference: RgbColor,
    /// Outer crop, in original-image coordinates.
    pub rebate: Detection,
    /// Content crop, relative to the rebate crop.
    pub inner: Detection,
    /// Mean color of the brightest inner pixels.
    pub inner_color: RgbColor,
    /// Skew as measured by the inner detector.
    pub raw_angle: f64,
    /// Skew actually applied (zero when the measurement was implausible).
    pub angle: f64,
    /// Final crop in original-image coordinates.
    pub crop: Rect,
}

impl FrameExtraction {
    /// Whether the measured skew was discarded as spurious.
    pub fn angle_clamped(&self) -> bool {
        self.angle != self.raw_angle
    }
}

/// Runs the frame pipeline with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct FrameExtractor {
    config: PipelineConfig,
}

impl FrameExtractor {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline on an in-memory scan.
    pub fn extract(&self, scan: &RgbImage) -> Result<FrameExtraction> {
        self.run(scan).map(|(extraction, _)| extraction)
    }

    #[instrument(skip_all, fields(width = scan.width(), height = scan.height()))]
    fn run(&self, scan: &RgbImage) -> Result<(FrameExtraction, Intermediates)> {
        let (width, height) = scan.dimensions();
        if width == 0 || height == 0 {
            return Err(NegframeError::EmptyImage { width, height });
        }
        let cfg = &self.config;

        let original = remove_perforation(scan, cfg.perforation.dilation_radius);
        let normalized = normalize_highlights(&original, cfg.normalization.top_percent);

        let rebate = detect_rebate(&normalized.image, &cfg.rebate);
        let inner = detect_inner(&rebate.image, rebate.threshold, &cfg.inner);

        let raw_angle = inner.detection.angle();
        let angle = clamp_skew(raw_angle, cfg.deskew.max_skew_degrees);
        let crop = compose_rect(rebate.rect(), inner.detection.rect());
        debug!(rebate = %rebate.rect(), inner = %inner.detection.rect(), %crop, "Crop composed");

        let image = apply_crop_and_deskew(&original, crop, angle);

        let extraction = FrameExtraction {
            image,
            reference: normalized.reference,
            rebate: rebate.detection,
            inner: inner.detection,
            inner_color: inner.average_color,
            raw_angle,
            angle,
            crop,
        };
        Ok((
            extraction,
            Intermediates {
                rebate: rebate.image,
                inner: inner.image,
            },
        ))
    }

    /// Load `input`, extract its frame and write it to [`output_path_for`].
    ///
    /// Returns the record handed to the downstream color stage.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub fn process_file(&self, input: &Path) -> Result<ResultRecord> {
        let scan = load_rgb(input)?;
        let (extraction, intermediates) = self.run(&scan)?;

        if self.config.output.debug_dumps {
            save_png(&intermediates.rebate, sibling_path(input, "_rebate"))?;
            save_png(&intermediates.inner, sibling_path(input, "_inner"))?;
            debug!("Debug crops written");
        }

        let output = output_path_for(input);
        save_png(&extraction.image, &output)?;
        info!(
            output = %output.display(),
            angle = extraction.angle,
            "Frame written"
        );

        Ok(ResultRecord {
            image_path: output,
            blend_color: extraction.reference,
            skew_angle: extraction.angle,
            delete_after_use: self.config.output.delete_after_use,
        })
    }
}

/// Normalized crops kept around for debug dumps.
struct Intermediates {
    rebate: RgbImage,
    inner: RgbImage,
}

/// Treat skew beyond `max_degrees` as a detector artifact and use 0 instead.
pub fn clamp_skew(angle: f64, max_degrees: f64) -> f64 {
    if angle.abs() > max_degrees {
        warn!(angle, max_degrees, "Implausible skew angle; not rotating");
        0.0
    } else {
        angle
    }
}

/// Output path for a scan: `<stem>_.png` in the same directory.
pub fn output_path_for(input: &Path) -> PathBuf {
    sibling_path(input, "_")
}

fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{suffix}.png"))
}
