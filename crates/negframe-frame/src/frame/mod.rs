// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame pipeline — perforation removal, highlight normalization, rebate and
// inner crop detection, and crop/deskew of the original scan.

pub mod contour;
pub mod deskew;
pub mod inner;
pub mod normalize;
pub mod perforation;
pub mod pipeline;
pub mod rebate;

pub use deskew::{apply_crop_and_deskew, compose_rect};
pub use inner::{InnerCrop, detect_inner};
pub use normalize::{Normalized, normalize_highlights};
pub use perforation::remove_perforation;
pub use pipeline::{FrameExtraction, FrameExtractor};
pub use rebate::{RebateCrop, detect_rebate};

/// Morphology radius for a square kernel of side `size` (side = 2·radius + 1).
pub(crate) fn kernel_radius(size: u32) -> u8 {
    (size / 2).min(u8::MAX as u32) as u8
}
