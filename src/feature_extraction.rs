// src/feature_extraction.rs - Per-grain shape and color descriptors

use image::GrayImage;
use serde::Serialize;

use crate::image_utils::is_foreground;
use crate::separation::Region;
use crate::shape_analysis::{calculate_circularity, RATIO_EPSILON};

/// Descriptors measured for one accepted region
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrainFeatures {
    /// Pixel count of the region
    pub area: f64,

    /// Closed contour length
    pub perimeter: f64,

    /// 4π · area / perimeter², 1.0 for a disc
    pub circularity: f64,

    /// Bounding-box width over height
    pub aspect_ratio: f64,

    /// Longer bounding-box side over the shorter one
    pub elongation: f64,

    /// Contour area over convex hull area
    pub solidity: f64,

    /// Fraction of bounding-box pixels inside the active color band
    pub color_ratio: f64,
}

/// Fraction of the bounding box of `region` that is set in `band_mask`
pub fn color_ratio(region: &Region, band_mask: &GrayImage) -> f64 {
    let bbox = region.bbox;
    let right = (bbox.x + bbox.width).min(band_mask.width());
    let bottom = (bbox.y + bbox.height).min(band_mask.height());

    let mut inside = 0u64;
    for y in bbox.y..bottom {
        for x in bbox.x..right {
            if is_foreground(band_mask.get_pixel(x, y)) {
                inside += 1;
            }
        }
    }

    inside as f64 / (bbox.pixel_count() as f64 + RATIO_EPSILON)
}

/// Measure every descriptor of one region
///
/// # Arguments
/// * `region` - Accepted region from the separator
/// * `band_mask` - Color band mask of the working image (same resolution as the region)
pub fn extract_features(region: &Region, band_mask: &GrayImage) -> GrainFeatures {
    let area = region.area as f64;

    GrainFeatures {
        area,
        perimeter: region.perimeter,
        circularity: calculate_circularity(area, region.perimeter),
        aspect_ratio: region.aspect_ratio(),
        elongation: region.bbox.elongation(),
        solidity: region.solidity(),
        color_ratio: color_ratio(region, band_mask),
    }
}
