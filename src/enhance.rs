// src/enhance.rs - Local contrast enhancement and noise smoothing

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// Tile grid used by the clip-limited equalization
pub const CLAHE_TILE_GRID: u32 = 8;
/// Relative clip limit (multiples of the uniform bin height)
pub const CLAHE_CLIP_LIMIT: f32 = 2.0;

pub const BILATERAL_DIAMETER: u32 = 9;
pub const BILATERAL_SIGMA_COLOR: f32 = 75.0;
pub const BILATERAL_SIGMA_SPACE: f32 = 75.0;

/// Smoothing stage applied to the intensity image before binarization
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Smoothing {
    /// Clip-limited local equalization followed by an edge-preserving bilateral filter
    ClaheBilateral,
    /// Median filter with the given radius
    Median(u32),
    /// Gaussian blur with the given sigma
    Gaussian(f32),
}

/// Run the configured smoothing on an intensity image
pub fn enhance(gray: &GrayImage, smoothing: Smoothing) -> GrayImage {
    match smoothing {
        Smoothing::ClaheBilateral => {
            let equalized = clahe(gray, CLAHE_TILE_GRID, CLAHE_CLIP_LIMIT);
            bilateral_filter(
                &equalized,
                BILATERAL_DIAMETER / 2,
                BILATERAL_SIGMA_COLOR,
                BILATERAL_SIGMA_SPACE,
            )
        }
        Smoothing::Median(radius) => imageproc::filter::median_filter(gray, radius, radius),
        Smoothing::Gaussian(sigma) => imageproc::filter::gaussian_blur_f32(gray, sigma),
    }
}

/// Build the clipped, equalized lookup table for one tile histogram
fn tile_lut(hist: &mut [u32; 256], tile_pixels: u32, clip_limit: f32) -> [u8; 256] {
    let clip = ((clip_limit * tile_pixels as f32 / 256.0) as u32).max(1);

    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }

    // Spread the clipped mass evenly, then hand out the remainder at a fixed stride
    let per_bin = excess / 256;
    let residual = excess % 256;
    for bin in hist.iter_mut() {
        *bin += per_bin;
    }
    if residual > 0 {
        let step = (256 / residual).max(1) as usize;
        let mut left = residual;
        let mut i = 0usize;
        while i < 256 && left > 0 {
            hist[i] += 1;
            left -= 1;
            i += step;
        }
    }

    let scale = 255.0 / tile_pixels.max(1) as f32;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    for (value, bin) in hist.iter().enumerate() {
        cumulative += bin;
        lut[value] = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Mirror an out-of-range coordinate back into `0..len` without repeating the edge
#[inline]
fn reflect(i: u32, len: u32) -> u32 {
    if i < len {
        i
    } else {
        (2 * (len - 1)).saturating_sub(i)
    }
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `grid × grid` tile layout, each tile gets its own
/// clipped equalization table, and every pixel is mapped by bilinear
/// interpolation between the four nearest tile tables.
pub fn clahe(gray: &GrayImage, grid: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let tiles_x = grid.min(width).max(1);
    let tiles_y = grid.min(height).max(1);
    let tile_w = (width + tiles_x - 1) / tiles_x;
    let tile_h = (height + tiles_y - 1) / tiles_y;

    let mut luts = vec![[0u8; 256]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;

            // Tiles hanging over the edge are filled by reflection so every
            // tile holds the same number of samples
            let mut hist = [0u32; 256];
            for y in y0..y0 + tile_h {
                for x in x0..x0 + tile_w {
                    let value = gray.get_pixel(reflect(x, width), reflect(y, height))[0];
                    hist[value as usize] += 1;
                }
            }
            luts[(ty * tiles_x + tx) as usize] = tile_lut(&mut hist, tile_w * tile_h, clip_limit);
        }
    }

    let mut result = GrayImage::new(width, height);
    for (x, y, pixel) in result.enumerate_pixels_mut() {
        let value = gray.get_pixel(x, y)[0] as usize;

        // Position relative to tile centres
        let gx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let gy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let tx0 = gx.floor().clamp(0.0, (tiles_x - 1) as f32) as u32;
        let ty0 = gy.floor().clamp(0.0, (tiles_y - 1) as f32) as u32;
        let tx1 = (tx0 + 1).min(tiles_x - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let fx = (gx - tx0 as f32).clamp(0.0, 1.0);
        let fy = (gy - ty0 as f32).clamp(0.0, 1.0);

        let at = |tx: u32, ty: u32| luts[(ty * tiles_x + tx) as usize][value] as f32;
        let top = at(tx0, ty0) * (1.0 - fx) + at(tx1, ty0) * fx;
        let bottom = at(tx0, ty1) * (1.0 - fx) + at(tx1, ty1) * fx;
        let mapped = top * (1.0 - fy) + bottom * fy;

        *pixel = Luma([mapped.round().clamp(0.0, 255.0) as u8]);
    }

    result
}

/// Edge-preserving bilateral filter over a circular window of `radius`.
///
/// Weights combine a spatial Gaussian on pixel distance and a range Gaussian
/// on intensity difference, so flat areas are smoothed while object borders
/// stay sharp.
pub fn bilateral_filter(gray: &GrayImage, radius: u32, sigma_color: f32, sigma_space: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let r = radius as i32;

    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    let range_weights: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    // Circular window, like a filter specified by diameter
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            let dist_sq = (dx * dx + dy * dy) as f32;
            if dist_sq <= (r * r) as f32 {
                offsets.push((dx, dy, (dist_sq * space_coeff).exp()));
            }
        }
    }

    let mut result = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let center = gray.get_pixel(x, y)[0] as i32;
            let mut sum = 0.0f32;
            let mut weight_sum = 0.0f32;

            for &(dx, dy, spatial) in &offsets {
                // Replicate border pixels
                let nx = (x as i32 + dx).clamp(0, width as i32 - 1) as u32;
                let ny = (y as i32 + dy).clamp(0, height as i32 - 1) as u32;
                let value = gray.get_pixel(nx, ny)[0] as i32;

                let weight = spatial * range_weights[(value - center).unsigned_abs() as usize];
                sum += value as f32 * weight;
                weight_sum += weight;
            }

            let filtered = if weight_sum > 0.0 { sum / weight_sum } else { center as f32 };
            result.put_pixel(x, y, Luma([filtered.round().clamp(0.0, 255.0) as u8]));
        }
    }

    result
}
