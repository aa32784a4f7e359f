// src/annotate.rs - Drawing classification results onto the image

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::classify::Category;
use crate::font::{glyph, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::image_utils::in_bounds;
use crate::shape_analysis::BoundingBox;

/// Rectangle outline thickness in pixels
pub const BOX_THICKNESS: u32 = 2;

/// Gap between a label and the top of its box
const LABEL_MARGIN: u32 = 2;

/// Draw text using the bitmap font; pixels outside the image are skipped
pub fn draw_text(image: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let mut cursor_x = x;

    for c in text.chars() {
        if let Some(bitmap) = glyph(c) {
            for (row, bits) in bitmap.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (0b1000_0000 >> col) == 0 {
                        continue;
                    }
                    let px = cursor_x + col as i32;
                    let py = y + row as i32;
                    if in_bounds(px, py, width, height) {
                        image.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }

        cursor_x += GLYPH_ADVANCE as i32;
        if cursor_x >= width as i32 {
            break;
        }
    }
}

/// Outline a box with [`BOX_THICKNESS`] nested rectangles
pub fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    for inset in 0..BOX_THICKNESS {
        let w = bbox.width.saturating_sub(2 * inset);
        let h = bbox.height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32).of_size(w, h);
        draw_hollow_rect_mut(image, rect, color);
    }
}

/// Copy of `image` with a colored box and category label per grain.
/// Labels sit above the box, or just inside it when the box touches the top edge.
pub fn annotate(image: &RgbImage, grains: &[(BoundingBox, Category)]) -> RgbImage {
    let mut annotated = image.clone();

    for (bbox, category) in grains {
        let color = category.color();
        draw_box(&mut annotated, bbox, color);

        let label_height = GLYPH_HEIGHT + LABEL_MARGIN;
        let label_y = if bbox.y >= label_height {
            bbox.y - label_height
        } else {
            bbox.y + BOX_THICKNESS + LABEL_MARGIN
        };
        draw_text(&mut annotated, category.name(), bbox.x as i32, label_y as i32, color);
    }

    annotated
}
