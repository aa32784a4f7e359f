// src/morphology.rs - Opening, dilation and mask fills

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::image_utils::{in_bounds, is_foreground, FOREGROUND};

/// Square structuring element radius used for noise removal (3×3)
pub const OPENING_RADIUS: u8 = 1;
/// Square structuring element radius used to estimate the background (3×3)
pub const BACKGROUND_DILATION_RADIUS: u8 = 1;

/// Output of the cleaning stage
#[derive(Debug, Clone)]
pub struct CleanedMask {
    /// Mask after opening
    pub opened: GrayImage,
    /// Generous estimate of everything that might belong to an object
    pub sure_background: Option<GrayImage>,
}

/// Morphological opening with a square `(2r+1)×(2r+1)` element.
/// Erosion removes isolated specks and thin bridges, dilation restores the survivors.
pub fn apply_opening(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    imageproc::morphology::open(mask, Norm::LInf, radius)
}

/// Dilation with a square `(2r+1)×(2r+1)` element
pub fn apply_dilation(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    imageproc::morphology::dilate(mask, Norm::LInf, radius)
}

/// Open the mask and, when asked, derive the sure-background estimate
pub fn clean_mask(mask: &GrayImage, opening_radius: u8, with_background: bool) -> CleanedMask {
    let opened = apply_opening(mask, opening_radius);
    let sure_background = if with_background {
        Some(apply_dilation(&opened, BACKGROUND_DILATION_RADIUS))
    } else {
        None
    };

    CleanedMask { opened, sure_background }
}

/// Fill a convex polygon, edges included, into a new mask of the given size
pub fn fill_convex_polygon(width: u32, height: u32, polygon: &[Point<i32>]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if polygon.len() < 3 {
        for p in polygon {
            if in_bounds(p.x, p.y, width, height) {
                mask.put_pixel(p.x as u32, p.y as u32, Luma([FOREGROUND]));
            }
        }
        return mask;
    }

    draw_polygon_mut(&mut mask, polygon, Luma([FOREGROUND]));
    mask
}

/// Keep only the pixels of `mask` that are foreground in both masks
pub fn restrict_to(mask: &GrayImage, roi: &GrayImage) -> GrayImage {
    let mut result = mask.clone();
    for (x, y, pixel) in result.enumerate_pixels_mut() {
        if !is_foreground(roi.get_pixel(x, y)) {
            *pixel = Luma([0]);
        }
    }
    result
}
