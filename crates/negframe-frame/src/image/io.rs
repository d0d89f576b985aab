// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image I/O — decode any supported raster into 8-bit RGB, and write lossless PNG.

use std::path::Path;

use image::{ImageFormat, RgbImage};
use negframe_core::error::{NegframeError, Result};
use tracing::{debug, info, instrument};

/// Load an image file as 8-bit RGB.
///
/// Alpha, grayscale, indexed and 16-bit inputs are all converted to three
/// 8-bit channels before they reach the pipeline.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage> {
    let img = image::open(path.as_ref()).map_err(|err| {
        NegframeError::ImageDecode(format!("{}: {}", path.as_ref().display(), err))
    })?;
    info!(
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        "Scan loaded"
    );
    Ok(img.to_rgb8())
}

/// Write an RGB image as PNG regardless of the path's extension.
pub fn save_png(image: &RgbImage, path: impl AsRef<Path>) -> Result<()> {
    image
        .save_with_format(path.as_ref(), ImageFormat::Png)
        .map_err(|err| {
            NegframeError::ImageEncode(format!("{}: {}", path.as_ref().display(), err))
        })?;
    debug!(
        path = %path.as_ref().display(),
        width = image.width(),
        height = image.height(),
        "PNG written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, Rgba, RgbaImage};

    #[test]
    fn load_rgb_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgba.png");
        let rgba = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 128]));
        DynamicImage::ImageRgba8(rgba).save(&path).unwrap();

        let rgb = load_rgb(&path).unwrap();
        assert_eq!(rgb.dimensions(), (4, 3));
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([10, 20, 30]));
    }

    #[test]
    fn load_rgb_missing_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rgb(dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, NegframeError::ImageDecode(_)));
    }

    #[test]
    fn save_png_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = RgbImage::from_fn(5, 5, |x, y| Rgb([x as u8 * 40, y as u8 * 40, 7]));
        save_png(&img, &path).unwrap();
        assert_eq!(load_rgb(&path).unwrap(), img);
    }
}
