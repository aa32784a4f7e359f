// src/shape_analysis.rs - Contour geometry: area, perimeter, hull, bounding box

use imageproc::point::Point;
use serde::Serialize;
use std::f64::consts::PI;

/// Guard added to denominators of shape ratios
pub const RATIO_EPSILON: f64 = 1e-5;

/// Axis-aligned bounding rectangle in pixel coordinates (inclusive origin, exclusive extent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest box holding every point; `None` for an empty slice
    pub fn from_points(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        Some(BoundingBox {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    #[inline]
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Width over height
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }

    /// Longer side over shorter side, always >= 1
    #[inline]
    pub fn elongation(&self) -> f64 {
        let long = self.width.max(self.height) as f64;
        let short = self.width.min(self.height).max(1) as f64;
        long / short
    }

    /// Map the box into another resolution; keeps at least one pixel per side
    pub fn scaled(&self, factor: f64, max_width: u32, max_height: u32) -> Self {
        let x = ((self.x as f64 * factor).floor() as u32).min(max_width.saturating_sub(1));
        let y = ((self.y as f64 * factor).floor() as u32).min(max_height.saturating_sub(1));
        let right = (((self.x + self.width) as f64 * factor).ceil() as u32).min(max_width);
        let bottom = (((self.y + self.height) as f64 * factor).ceil() as u32).min(max_height);

        BoundingBox {
            x,
            y,
            width: right.saturating_sub(x).max(1),
            height: bottom.saturating_sub(y).max(1),
        }
    }
}

/// Area enclosed by a closed polygon (shoelace formula)
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut twice_area = 0i64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        twice_area += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }

    (twice_area as f64 / 2.0).abs()
}

/// Length of the closed contour through all points
pub fn calculate_perimeter(contour_points: &[Point<i32>]) -> f64 {
    if contour_points.len() < 2 {
        return 0.0;
    }

    let mut perimeter = 0.0;
    let n = contour_points.len();

    for i in 0..n {
        let p1 = contour_points[i];
        let p2 = contour_points[(i + 1) % n]; // Wrap around to first point

        let dx = (p2.x - p1.x) as f64;
        let dy = (p2.y - p1.y) as f64;
        perimeter += (dx * dx + dy * dy).sqrt();
    }

    perimeter
}

/// Convex hull of the points, without a repeated end point
pub fn convex_hull(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut distinct: Vec<Point<i32>> = points.to_vec();
    distinct.sort_by(|a, b| (a.x, a.y).cmp(&(b.x, b.y)));
    distinct.dedup();

    if distinct.len() < 3 {
        return distinct;
    }
    imageproc::geometry::convex_hull(&distinct)
}

/// Area of the convex hull of the points
pub fn convex_hull_area(points: &[Point<i32>]) -> f64 {
    polygon_area(&convex_hull(points))
}

/// Circularity (4π · area / perimeter²), 1.0 for a perfect circle
pub fn calculate_circularity(area: f64, perimeter: f64) -> f64 {
    4.0 * PI * area / (perimeter * perimeter + RATIO_EPSILON)
}
