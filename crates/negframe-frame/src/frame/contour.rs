// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour helpers shared by the rebate and inner detectors: largest outer
// border, bounding box, polygon area and skew angle.

use image::GrayImage;
use image::imageops::replace;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use negframe_core::Rect;

/// Outer border of a connected foreground region that has no enclosing region.
#[derive(Debug, Clone)]
pub struct ExternalContour {
    pub points: Vec<Point<i32>>,
    /// Polygon area enclosed by the traced border.
    pub area: f64,
}

impl ExternalContour {
    /// Axis-aligned bounding box of the border pixels.
    pub fn bounding_rect(&self) -> Rect {
        bounding_rect(&self.points)
    }

    /// Skew of the minimum-area rectangle around the border, in degrees.
    pub fn skew_angle(&self) -> f64 {
        skew_angle(&self.points)
    }
}

/// Find the external contour with the largest polygon area, if any.
///
/// The mask is traced inside a one-pixel background margin, so regions that
/// touch the image edge still get an outer border. Returned points are in the
/// mask's own coordinates.
pub fn largest_external_contour(mask: &GrayImage) -> Option<ExternalContour> {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    replace(&mut padded, mask, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let points: Vec<Point<i32>> = c
                .points
                .into_iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
            let area = polygon_area(&points);
            ExternalContour { points, area }
        })
        .max_by(|a, b| a.area.total_cmp(&b.area))
}

/// Inclusive bounding box of a point set. Empty input yields an empty rect.
pub fn bounding_rect(points: &[Point<i32>]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::new(0, 0, 0, 0);
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let min_x = min_x.max(0);
    let min_y = min_y.max(0);
    Rect::new(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1).max(0) as u32,
        (max_y - min_y + 1).max(0) as u32,
    )
}

/// Area of a closed polygon using the shoelace formula.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as i64 * points[j].y as i64;
        twice_area -= points[j].x as i64 * points[i].y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

/// Reduce an edge direction (degrees) into (-45, 45].
///
/// Rectangle edges repeat every 90°, so every edge of the same rectangle
/// reduces to the same skew.
pub fn reduce_angle(degrees: f64) -> f64 {
    let mut reduced = degrees.rem_euclid(90.0);
    if reduced > 45.0 {
        reduced -= 90.0;
    }
    reduced
}

/// Skew angle of the minimum-area rectangle enclosing `points`, in degrees.
///
/// Positive values mean the content is rotated clockwise on screen (image y
/// axis pointing down). Fewer than two distinct points give 0.
pub fn skew_angle(points: &[Point<i32>]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let corners = min_area_rect(points);

    // Measure along the longer of the two edges leaving the first corner; it
    // is the least affected by corner rounding.
    let edge = |a: Point<i32>, b: Point<i32>| ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let (ax, ay) = edge(corners[0], corners[1]);
    let (bx, by) = edge(corners[1], corners[2]);
    let (dx, dy) = if ax.hypot(ay) >= bx.hypot(by) {
        (ax, ay)
    } else {
        (bx, by)
    };
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    reduce_angle(dy.atan2(dx).to_degrees())
}
