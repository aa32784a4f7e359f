// src/tray.rs - Restricting analysis to the inside of a red tray

use image::{GrayImage, Luma, RgbImage};
use imageproc::point::Point;

use crate::color::{band_mask, ColorBand};
use crate::image_utils::{is_foreground, largest_component, BACKGROUND, FOREGROUND};
use crate::morphology::{apply_opening, fill_convex_polygon};
use crate::shape_analysis::convex_hull;

/// Opening radius applied to the red mask (15×15 element)
pub const TRAY_OPENING_RADIUS: u8 = 7;

/// Mask of the tray interior: the filled convex hull of the largest red area.
///
/// Returns `None` when no red pixel survives the opening; callers then use
/// the whole image.
pub fn locate_tray(image: &RgbImage) -> Option<GrayImage> {
    let (width, height) = image.dimensions();

    let low = band_mask(image, &ColorBand::RED_LOW);
    let high = band_mask(image, &ColorBand::RED_HIGH);
    let red = GrayImage::from_fn(width, height, |x, y| {
        let inside = is_foreground(low.get_pixel(x, y)) || is_foreground(high.get_pixel(x, y));
        Luma([if inside { FOREGROUND } else { BACKGROUND }])
    });

    let opened = apply_opening(&red, TRAY_OPENING_RADIUS);
    let (largest, _) = largest_component(&opened)?;

    let points: Vec<Point<i32>> = largest
        .enumerate_pixels()
        .filter(|(_, _, pixel)| is_foreground(pixel))
        .map(|(x, y, _)| Point::new(x as i32, y as i32))
        .collect();
    let hull = convex_hull(&points);

    log::debug!(
        "Tray: {} red pixels in largest area, hull of {} vertices",
        points.len(),
        hull.len()
    );

    Some(fill_convex_polygon(width, height, &hull))
}
