// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perforation removal — blank out sprocket holes and scanner border leaks.
//
// Those regions scan as saturated white. They are set to black and the black
// region is grown by a disk so that the soft halo around each hole goes with it.
// This must run before highlight statistics are gathered.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use tracing::{debug, instrument};

use crate::image::brightness::MASK_ON;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Zero saturated-white pixels and everything within `dilation_radius` of a
/// black pixel.
///
/// Pixels that were already pure black count as zeroed too. An image with
/// neither pure white nor pure black pixels is returned unchanged.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn remove_perforation(image: &RgbImage, dilation_radius: u8) -> RgbImage {
    let mut cleaned = image.clone();

    let mut whitened = 0usize;
    for pixel in cleaned.pixels_mut() {
        if *pixel == WHITE {
            *pixel = BLACK;
            whitened += 1;
        }
    }

    let (width, height) = cleaned.dimensions();
    let black_mask = GrayImage::from_fn(width, height, |x, y| {
        if *cleaned.get_pixel(x, y) == BLACK {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    });
    let black = black_mask.pixels().filter(|p| p.0[0] != 0).count();
    if black == 0 {
        debug!("No perforation pixels found");
        return cleaned;
    }

    let grown = dilate(&black_mask, Norm::L2, dilation_radius);
    let mut halo = 0usize;
    for (pixel, mask) in cleaned.pixels_mut().zip(grown.pixels()) {
        if mask.0[0] != 0 && *pixel != BLACK {
            *pixel = BLACK;
            halo += 1;
        }
    }

    debug!(whitened, black, halo, dilation_radius, "Perforation removed");
    cleaned
}
