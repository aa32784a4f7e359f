// src/threshold.rs - Foreground/background mask construction

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::image_utils::{BACKGROUND, FOREGROUND};

/// Side length of the adaptive threshold neighbourhood
pub const ADAPTIVE_WINDOW: u32 = 51;
/// Margin between a pixel and its neighbourhood mean
pub const ADAPTIVE_OFFSET: f32 = 2.0;

/// Which side of the threshold holds the objects
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Objects are darker than their surroundings
    #[default]
    Dark,
    /// Objects are brighter than their surroundings
    Bright,
}

/// Thresholding strategy
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BinarizeStrategy {
    /// Per-pixel threshold from the local neighbourhood mean; tolerant of uneven light
    Adaptive { window: u32, offset: f32 },
    /// Single global threshold maximising between-class variance
    Otsu,
}

impl BinarizeStrategy {
    pub fn adaptive() -> Self {
        BinarizeStrategy::Adaptive {
            window: ADAPTIVE_WINDOW,
            offset: ADAPTIVE_OFFSET,
        }
    }
}

/// Produce a mask where candidate-object pixels are 255
pub fn binarize(gray: &GrayImage, strategy: BinarizeStrategy, polarity: Polarity) -> GrayImage {
    match strategy {
        BinarizeStrategy::Adaptive { window, offset } => adaptive_threshold(gray, window, offset, polarity),
        BinarizeStrategy::Otsu => otsu_threshold(gray, polarity),
    }
}

/// Summed-area table with one row and column of zero padding
fn integral_image(gray: &GrayImage) -> Vec<u64> {
    let (width, height) = gray.dimensions();
    let stride = width as usize + 1;
    let mut table = vec![0u64; stride * (height as usize + 1)];

    for y in 0..height as usize {
        let mut row_sum = 0u64;
        for x in 0..width as usize {
            row_sum += gray.get_pixel(x as u32, y as u32)[0] as u64;
            table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
        }
    }

    table
}

/// Adaptive mean threshold. The window is clipped at the image border, so the
/// mean there is taken over the in-bounds part only.
pub fn adaptive_threshold(gray: &GrayImage, window: u32, offset: f32, polarity: Polarity) -> GrayImage {
    let (width, height) = gray.dimensions();
    let table = integral_image(gray);
    let stride = width as usize + 1;
    let radius = (window / 2) as i64;

    let mut mask = GrayImage::new(width, height);
    for y in 0..height as i64 {
        let y0 = (y - radius).max(0) as usize;
        let y1 = (y + radius + 1).min(height as i64) as usize;

        for x in 0..width as i64 {
            let x0 = (x - radius).max(0) as usize;
            let x1 = (x + radius + 1).min(width as i64) as usize;

            let sum = table[y1 * stride + x1] + table[y0 * stride + x0]
                - table[y0 * stride + x1]
                - table[y1 * stride + x0];
            let area = ((x1 - x0) * (y1 - y0)) as f32;
            let mean = sum as f32 / area;

            let value = gray.get_pixel(x as u32, y as u32)[0] as f32;
            let is_object = match polarity {
                Polarity::Dark => value <= mean - offset,
                Polarity::Bright => value > mean + offset,
            };

            if is_object {
                mask.put_pixel(x as u32, y as u32, Luma([FOREGROUND]));
            }
        }
    }

    mask
}

/// Global Otsu threshold.
///
/// A histogram with a single occupied bin has no meaningful split; the result
/// is then an all-background mask.
pub fn otsu_threshold(gray: &GrayImage, polarity: Polarity) -> GrayImage {
    let (width, height) = gray.dimensions();

    let mut hist = [0u32; 256];
    for pixel in gray.pixels() {
        hist[pixel[0] as usize] += 1;
    }
    let occupied = hist.iter().filter(|&&count| count > 0).count();
    if occupied <= 1 {
        log::debug!("Flat histogram ({} occupied bins), returning empty mask", occupied);
        return GrayImage::from_pixel(width, height, Luma([BACKGROUND]));
    }

    let level = imageproc::contrast::otsu_level(gray);
    log::debug!("Otsu level: {}", level);

    GrayImage::from_fn(width, height, |x, y| {
        let value = gray.get_pixel(x, y)[0];
        let is_object = match polarity {
            Polarity::Dark => value <= level,
            Polarity::Bright => value > level,
        };
        Luma([if is_object { FOREGROUND } else { BACKGROUND }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_utils::count_foreground;

    fn dark_square_on_light(size: u32, square: u32) -> GrayImage {
        let start = (size - square) / 2;
        GrayImage::from_fn(size, size, |x, y| {
            let inside = x >= start && x < start + square && y >= start && y < start + square;
            Luma([if inside { 50 } else { 200 }])
        })
    }

    #[test]
    fn flat_histogram_yields_empty_mask() {
        let gray = GrayImage::from_pixel(32, 32, Luma([0]));
        for polarity in [Polarity::Dark, Polarity::Bright] {
            let mask = otsu_threshold(&gray, polarity);
            assert_eq!(count_foreground(&mask), 0);
        }
    }

    #[test]
    fn otsu_separates_bimodal_image() {
        let gray = dark_square_on_light(40, 10);
        assert_eq!(count_foreground(&otsu_threshold(&gray, Polarity::Dark)), 100);
        assert_eq!(count_foreground(&otsu_threshold(&gray, Polarity::Bright)), 1500);
    }

    #[test]
    fn adaptive_finds_small_dark_object() {
        let gray = dark_square_on_light(80, 10);
        let mask = binarize(&gray, BinarizeStrategy::adaptive(), Polarity::Dark);
        assert_eq!(count_foreground(&mask), 100);
        assert_eq!(mask.get_pixel(40, 40)[0], FOREGROUND);
    }

    #[test]
    fn adaptive_ignores_uniform_image() {
        let gray = GrayImage::from_pixel(100, 100, Luma([25]));
        for polarity in [Polarity::Dark, Polarity::Bright] {
            let mask = binarize(&gray, BinarizeStrategy::adaptive(), polarity);
            assert_eq!(count_foreground(&mask), 0);
        }
    }
}
