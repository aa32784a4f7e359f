// src/distance.rs - Euclidean distance to the nearest background pixel

use image::{GrayImage, Luma};
use imageproc::distance_transform::euclidean_squared_distance_transform;

use crate::image_utils::is_foreground;

/// Distance from every foreground pixel to the nearest background pixel.
/// Background pixels hold zero; anything beyond the image border counts as background.
#[derive(Debug, Clone)]
pub struct DistanceField {
    pub width: u32,
    pub height: u32,
    pub values: Vec<f32>,
}

impl DistanceField {
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[(y * self.width + x) as usize]
    }

    pub fn max(&self) -> f32 {
        self.values.iter().cloned().fold(0.0, f32::max)
    }
}

/// Exact Euclidean distance transform of a mask
pub fn distance_transform(mask: &GrayImage) -> DistanceField {
    let (width, height) = mask.dimensions();

    // imageproc measures distance to the nearest non-zero pixel, so background
    // becomes the target, with one pixel of it padded around the border
    let targets = GrayImage::from_fn(width + 2, height + 2, |x, y| {
        let inside = x >= 1 && y >= 1 && x <= width && y <= height;
        if inside && is_foreground(mask.get_pixel(x - 1, y - 1)) {
            Luma([0])
        } else {
            Luma([255])
        }
    });
    let squared = euclidean_squared_distance_transform(&targets);

    let mut values = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            values.push(squared.get_pixel(x + 1, y + 1)[0].sqrt() as f32);
        }
    }

    DistanceField { width, height, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn isolated_pixel_is_one_away() {
        let mut mask = GrayImage::new(7, 7);
        mask.put_pixel(3, 3, Luma([255]));
        let field = distance_transform(&mask);
        assert_approx_eq!(field.get(3, 3), 1.0);
        assert_approx_eq!(field.get(0, 0), 0.0);
    }

    #[test]
    fn block_centre_distance() {
        let mut mask = GrayImage::new(11, 11);
        for y in 3..8 {
            for x in 3..8 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let field = distance_transform(&mask);
        assert_approx_eq!(field.get(5, 5), 3.0);
        assert_approx_eq!(field.get(3, 3), 1.0);
        assert_approx_eq!(field.max(), 3.0);
    }

    #[test]
    fn image_border_counts_as_background() {
        let mask = GrayImage::from_pixel(10, 10, Luma([255]));
        let field = distance_transform(&mask);
        assert_approx_eq!(field.get(0, 0), 1.0);
        assert_approx_eq!(field.max(), 5.0);
    }

    #[test]
    fn diagonal_distance_is_euclidean() {
        // The hole is closer than the border for a pixel two steps off diagonally
        let mut mask = GrayImage::from_pixel(9, 9, Luma([255]));
        mask.put_pixel(4, 4, Luma([0]));
        let field = distance_transform(&mask);
        assert_approx_eq!(field.get(6, 6), 8.0f32.sqrt(), 1e-4);
    }

    #[test]
    fn matches_nearest_background_search() {
        let mask = GrayImage::from_fn(23, 17, |x, y| {
            let (dx, dy) = (x as i32 - 9, y as i32 - 8);
            let disc = dx * dx + dy * dy <= 36;
            let block = (15..22).contains(&x) && (2..16).contains(&y);
            Luma([if disc || block { 255 } else { 0 }])
        });
        let field = distance_transform(&mask);

        for (x, y, pixel) in mask.enumerate_pixels() {
            if pixel[0] == 0 {
                assert_eq!(field.get(x, y), 0.0);
                continue;
            }
            // Background pixels plus the ring just outside the image
            let mut best = i64::MAX;
            for by in -1..=17i64 {
                for bx in -1..=23i64 {
                    let outside = bx < 0 || by < 0 || bx >= 23 || by >= 17;
                    if outside || mask.get_pixel(bx as u32, by as u32)[0] == 0 {
                        let (dx, dy) = (bx - x as i64, by - y as i64);
                        best = best.min(dx * dx + dy * dy);
                    }
                }
            }
            assert_approx_eq!(field.get(x, y), (best as f32).sqrt(), 1e-4);
        }
    }
}
