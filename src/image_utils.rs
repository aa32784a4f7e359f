// src/image_utils.rs - Resizing, mask helpers and component selection

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::region_labelling::{connected_components, Connectivity};

/// Mask value for candidate-object pixels
pub const FOREGROUND: u8 = 255;

/// Mask value for background pixels
pub const BACKGROUND: u8 = 0;

/// Resize an image so its width matches `target_width`, keeping the aspect ratio.
/// Returns the resized image and the linear scale factor that was applied.
pub fn resize_to_width(image: &RgbImage, target_width: u32) -> (RgbImage, f64) {
    let (width, height) = image.dimensions();
    if width == target_width || width == 0 {
        return (image.clone(), 1.0);
    }

    let scale = target_width as f64 / width as f64;
    let target_height = ((height as f64 * scale).round() as u32).max(1);
    let resized = image::imageops::resize(
        image,
        target_width,
        target_height,
        image::imageops::FilterType::Triangle,
    );

    (resized, scale)
}

/// Convert to single-channel intensity
pub fn to_gray(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Check if a point is inside the image bounds
#[inline]
pub fn in_bounds(x: i32, y: i32, width: u32, height: u32) -> bool {
    x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height
}

#[inline]
pub fn is_foreground(pixel: &Luma<u8>) -> bool {
    pixel[0] > BACKGROUND
}

/// Number of foreground pixels in a mask
pub fn count_foreground(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| is_foreground(p)).count()
}

/// Pixel-wise AND of two masks of equal size
pub fn mask_and(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let (width, height) = a.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if is_foreground(a.get_pixel(x, y)) && is_foreground(b.get_pixel(x, y)) {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Black out every pixel outside the region of interest
pub fn apply_roi(image: &RgbImage, roi: &GrayImage) -> RgbImage {
    let mut result = image.clone();
    for (x, y, pixel) in result.enumerate_pixels_mut() {
        if !is_foreground(roi.get_pixel(x, y)) {
            *pixel = Rgb([0, 0, 0]);
        }
    }
    result
}

/// Largest 8-connected piece of a mask and its pixel count; ties go to the
/// piece found first in raster order
pub fn largest_component(mask: &GrayImage) -> Option<(GrayImage, u32)> {
    let components = connected_components(mask, Connectivity::Eight, Luma([BACKGROUND]));

    let mut sizes: Vec<u32> = Vec::new();
    for pixel in components.pixels() {
        let label = pixel[0] as usize;
        if label == 0 {
            continue;
        }
        if sizes.len() <= label {
            sizes.resize(label + 1, 0);
        }
        sizes[label] += 1;
    }

    let (best, &count) = sizes
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))?;
    if count == 0 {
        return None;
    }

    let (width, height) = mask.dimensions();
    let component = GrayImage::from_fn(width, height, |x, y| {
        Luma([if components.get_pixel(x, y)[0] as usize == best { FOREGROUND } else { BACKGROUND }])
    });

    Some((component, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_keeps_aspect_ratio() {
        let image = RgbImage::new(1280, 720);
        let (resized, scale) = resize_to_width(&image, 640);
        assert_eq!(resized.dimensions(), (640, 360));
        assert!((scale - 0.5).abs() < 1e-9);

        let (same, scale) = resize_to_width(&resized, 640);
        assert_eq!(same.dimensions(), (640, 360));
        assert_eq!(scale, 1.0);
    }

    #[test]
    fn roi_blacks_out_outside_pixels() {
        let image = RgbImage::from_pixel(4, 4, Rgb([200, 180, 160]));
        let mut roi = GrayImage::new(4, 4);
        roi.put_pixel(1, 1, Luma([FOREGROUND]));

        let masked = apply_roi(&image, &roi);
        assert_eq!(masked.get_pixel(1, 1), &Rgb([200, 180, 160]));
        assert_eq!(masked.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn largest_component_prefers_size_then_raster_order() {
        let mut mask = GrayImage::new(12, 6);
        // 2x2 block, then two 3x3 blocks of equal size
        for (x0, y0, side) in [(0u32, 0u32, 2u32), (4, 0, 3), (8, 2, 3)] {
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    mask.put_pixel(x, y, Luma([FOREGROUND]));
                }
            }
        }

        let (component, count) = largest_component(&mask).expect("mask has foreground");
        assert_eq!(count, 9);
        assert!(is_foreground(component.get_pixel(4, 0)));
        assert!(!is_foreground(component.get_pixel(8, 2)));
        assert!(!is_foreground(component.get_pixel(0, 0)));

        assert!(largest_component(&GrayImage::new(5, 5)).is_none());
    }
}
