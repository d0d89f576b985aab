// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Negframe scan pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Axis-aligned pixel rectangle, `(x, y)` being the top-left corner.
///
/// A rectangle is always relative to the image it was detected in. Use
/// [`Rect::offset_by`] to move it into the frame of an enclosing image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width` x `height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Top-left corner.
    pub fn origin(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Translate a rectangle found inside a sub-image into the sub-image's
    /// parent frame. `parent_origin` is where the sub-image starts in its parent.
    pub fn offset_by(self, parent_origin: (u32, u32)) -> Self {
        Self {
            x: self.x + parent_origin.0,
            y: self.y + parent_origin.1,
            ..self
        }
    }

    /// Clip the rectangle to a `width` x `height` image.
    ///
    /// The result may be empty when the rectangle lies completely outside.
    pub fn clamp_to(self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// An RGB triple with fractional channels (0.0..=255.0).
///
/// Used for the highlight reference ("blend") color and for averaged colors,
/// which are means over many pixels and therefore not integral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RgbColor {
    pub const WHITE: Self = Self::gray(255.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(value: f64) -> Self {
        Self::new(value, value, value)
    }

    pub fn channels(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_channels(channels: [f64; 3]) -> Self {
        Self::new(channels[0], channels[1], channels[2])
    }
}

/// Why a detector fell back to full-image coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackReason {
    /// The contour search found nothing.
    NoContour,
    /// The best candidate covered less than the configured share of the image.
    AreaTooSmall,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoContour => f.write_str("no contour found"),
            Self::AreaTooSmall => f.write_str("detected area too small"),
        }
    }
}

/// Outcome of a geometric detector.
///
/// Distinguishes a genuine detection (which may still cover the whole image)
/// from a degraded full-image fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Detection {
    Detected { rect: Rect, angle: f64 },
    Fallback { rect: Rect, reason: FallbackReason },
}

impl Detection {
    pub fn rect(&self) -> Rect {
        match self {
            Self::Detected { rect, .. } | Self::Fallback { rect, .. } => *rect,
        }
    }

    /// Detected angle in degrees; fallbacks never carry a rotation.
    pub fn angle(&self) -> f64 {
        match self {
            Self::Detected { angle, .. } => *angle,
            Self::Fallback { .. } => 0.0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Handoff record for the downstream color-correction stage.
///
/// Serialized as JSON with exactly these field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Path of the cropped and deskewed output image.
    pub image_path: PathBuf,
    /// Highlight reference color used for normalization.
    pub blend_color: RgbColor,
    /// Applied skew angle in degrees (after clamping).
    pub skew_angle: f64,
    /// Whether the consumer may remove the file once it is done with it.
    pub delete_after_use: bool,
}

impl ResultRecord {
    /// Write the record as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a record previously written with [`ResultRecord::write_json`].
    pub fn read_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_by_sums_nested_origins() {
        let rebate = Rect::new(40, 25, 900, 880);
        let inner = Rect::new(110, 95, 700, 690);
        let composed = inner.offset_by(rebate.origin());
        assert_eq!(composed, Rect::new(150, 120, 700, 690));
    }

    #[test]
    fn offset_by_identity_origin() {
        let inner = Rect::new(3, 4, 5, 6);
        assert_eq!(inner.offset_by((0, 0)), inner);
    }

    #[test]
    fn clamp_to_clips_overhang() {
        let r = Rect::new(90, 80, 50, 50).clamp_to(100, 100);
        assert_eq!(r, Rect::new(90, 80, 10, 20));
    }

    #[test]
    fn clamp_to_outside_is_empty() {
        let r = Rect::new(200, 10, 5, 5).clamp_to(100, 100);
        assert!(r.is_empty());
    }

    #[test]
    fn detection_fallback_has_zero_angle() {
        let d = Detection::Fallback {
            rect: Rect::full(10, 10),
            reason: FallbackReason::NoContour,
        };
        assert!(d.is_fallback());
        assert_eq!(d.angle(), 0.0);
        assert_eq!(d.rect(), Rect::full(10, 10));
    }

    #[test]
    fn result_record_json_field_names() {
        let record = ResultRecord {
            image_path: PathBuf::from("scan_.png"),
            blend_color: RgbColor::new(240.0, 230.0, 220.0),
            skew_angle: 4.9,
            delete_after_use: true,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["image_path"], "scan_.png");
        assert_eq!(value["blend_color"]["r"], 240.0);
        assert_eq!(value["blend_color"]["g"], 230.0);
        assert_eq!(value["blend_color"]["b"], 220.0);
        assert_eq!(value["skew_angle"], 4.9);
        assert_eq!(value["delete_after_use"], true);
    }

    #[test]
    fn result_record_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let record = ResultRecord {
            image_path: dir.path().join("frame_.png"),
            blend_color: RgbColor::gray(254.0),
            skew_angle: 0.0,
            delete_after_use: false,
        };
        record.write_json(&path).unwrap();
        assert_eq!(ResultRecord::read_json(&path).unwrap(), record);
    }
}
