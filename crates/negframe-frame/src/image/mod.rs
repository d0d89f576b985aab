// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image helpers — brightness maps, percentile thresholds, and RGB load/save.

pub mod brightness;
pub mod io;

pub use brightness::{BrightnessMap, compute_brightness, percentile, threshold_mask};
pub use io::{load_rgb, save_png};
