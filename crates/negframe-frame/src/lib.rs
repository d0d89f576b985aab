// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// negframe-frame — Frame extraction for scanned negatives and prints.
//
// Provides brightness estimation and image I/O helpers, and the frame pipeline
// (perforation removal, highlight normalization, rebate and inner crop
// detection, deskew) sequenced by `FrameExtractor`.

pub mod frame;
pub mod image;

// Re-export the primary structs so callers can use `negframe_frame::FrameExtractor` etc.
pub use frame::pipeline::{FrameExtraction, FrameExtractor, output_path_for};
