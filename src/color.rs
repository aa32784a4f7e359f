// src/color.rs - Color space conversion, cast correction and HSV band masks

use image::{GrayImage, Luma, Rgb, RgbImage};
use palette::{FromColor, Hsv, IntoColor, Lab, LinSrgb, Srgb};
use serde::{Deserialize, Serialize};

use crate::errors::{GraderError, Result};

/// Gain applied to the chrominance shift during cast correction
pub const CAST_CORRECTION_GAIN: f32 = 1.1;

/// Neutral value of an 8-bit chrominance channel
const NEUTRAL_CHROMA: f32 = 128.0;

/// Inclusive HSV band in the 8-bit convention (H: 0..=180, S and V: 0..=255)
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct ColorBand {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorBand {
    /// Yellowish discoloration of spoiled grains
    pub const SPOILAGE: ColorBand = ColorBand { lower: [18, 40, 120], upper: [40, 255, 255] };

    /// Default operator-tunable fail color, a slightly wider yellow
    pub const FAIL_COLOR: ColorBand = ColorBand { lower: [15, 50, 100], upper: [45, 255, 255] };

    /// Low saturation, high value: polished rice
    pub const WHITE: ColorBand = ColorBand { lower: [0, 0, 150], upper: [180, 60, 255] };

    /// Red sits on both ends of the hue circle, so the tray needs two bands
    pub const RED_LOW: ColorBand = ColorBand { lower: [0, 70, 50], upper: [10, 255, 255] };
    pub const RED_HIGH: ColorBand = ColorBand { lower: [170, 70, 50], upper: [180, 255, 255] };

    /// Build a band from the six integers an operator supplies
    pub fn from_values(values: [u8; 6]) -> Result<Self> {
        let band = ColorBand {
            lower: [values[0], values[1], values[2]],
            upper: [values[3], values[4], values[5]],
        };
        band.validate()?;
        Ok(band)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lower[0] > 180 || self.upper[0] > 180 {
            return Err(GraderError::Config(
                "hue bounds must be within 0..=180".to_string(),
            ));
        }

        for channel in 0..3 {
            if self.lower[channel] > self.upper[channel] {
                return Err(GraderError::Config(format!(
                    "color band lower bound {:?} exceeds upper bound {:?}",
                    self.lower, self.upper
                )));
            }
        }

        Ok(())
    }

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }
}

#[inline]
fn to_srgb(pixel: &Rgb<u8>) -> Srgb<f32> {
    Srgb::new(pixel[0] as f32 / 255.0, pixel[1] as f32 / 255.0, pixel[2] as f32 / 255.0)
}

/// Convert an RGB pixel to 8-bit HSV (hue halved to fit 0..180)
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> [u8; 3] {
    let hsv: Hsv = Hsv::from_color(to_srgb(pixel));

    let h = (hsv.hue.into_positive_degrees() / 2.0).round() as u32 % 180;
    let s = (hsv.saturation * 255.0).round().clamp(0.0, 255.0) as u8;
    let v = (hsv.value * 255.0).round().clamp(0.0, 255.0) as u8;
    [h as u8, s, v]
}

/// Mask of pixels whose HSV value falls inside the band (255 inside, 0 outside)
pub fn band_mask(image: &RgbImage, band: &ColorBand) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut mask = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        if band.contains(rgb_to_hsv(pixel)) {
            mask.put_pixel(x, y, Luma([255]));
        }
    }

    mask
}

/// Convert RGB to 8-bit L*a*b* (L scaled to 0..255, a/b offset by 128)
pub fn rgb_to_lab(pixel: &Rgb<u8>) -> [f32; 3] {
    let lin: LinSrgb<f32> = to_srgb(pixel).into_linear();
    let lab: Lab = Lab::from_color(lin);

    [lab.l * 255.0 / 100.0, lab.a + NEUTRAL_CHROMA, lab.b + NEUTRAL_CHROMA]
}

/// Inverse of [`rgb_to_lab`]
pub fn lab_to_rgb(lab: [f32; 3]) -> Rgb<u8> {
    let lab: Lab = Lab::new(lab[0] * 100.0 / 255.0, lab[1] - NEUTRAL_CHROMA, lab[2] - NEUTRAL_CHROMA);
    let lin: LinSrgb<f32> = lab.into_color();
    let srgb: Srgb<f32> = Srgb::from_linear(lin);

    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb([to_byte(srgb.red), to_byte(srgb.green), to_byte(srgb.blue)])
}

/// Remove a global color cast.
///
/// Each chrominance channel is shifted towards neutral by its image-wide
/// deviation, weighted by the pixel's own lightness so dark pixels barely move.
pub fn normalize_color(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let pixel_count = (width as usize) * (height as usize);
    if pixel_count == 0 {
        return image.clone();
    }

    let lab: Vec<[f32; 3]> = image.pixels().map(rgb_to_lab).collect();

    // Channel means are computed on the quantized 8-bit values
    let (sum_a, sum_b) = lab.iter().fold((0.0f64, 0.0f64), |(sa, sb), p| {
        (sa + p[1].round().clamp(0.0, 255.0) as f64, sb + p[2].round().clamp(0.0, 255.0) as f64)
    });
    let shift_a = (sum_a / pixel_count as f64) as f32 - NEUTRAL_CHROMA;
    let shift_b = (sum_b / pixel_count as f64) as f32 - NEUTRAL_CHROMA;

    let mut result = RgbImage::new(width, height);
    for (out, p) in result.pixels_mut().zip(lab.iter()) {
        let l = p[0].round().clamp(0.0, 255.0);
        let weight = (l / 255.0) * CAST_CORRECTION_GAIN;
        let a = (p[1].round() - shift_a * weight).clamp(0.0, 255.0);
        let b = (p[2].round() - shift_b * weight).clamp(0.0, 255.0);
        *out = lab_to_rgb([l, a.floor(), b.floor()]);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_of_primaries() {
        assert_eq!(rgb_to_hsv(&Rgb([255, 0, 0])), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 255, 0])), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 255])), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 0])), [0, 0, 0]);
    }

    #[test]
    fn yellow_grain_falls_in_spoilage_band() {
        // hue 40 deg -> 20 in 8-bit, saturation ~0.5, value 220
        let hsv = rgb_to_hsv(&Rgb([220, 183, 110]));
        assert!(ColorBand::SPOILAGE.contains(hsv), "hsv {:?}", hsv);
        assert!(!ColorBand::SPOILAGE.contains(rgb_to_hsv(&Rgb([235, 235, 230]))));
    }

    #[test]
    fn band_rejects_inverted_bounds() {
        assert!(ColorBand::from_values([40, 0, 0, 10, 255, 255]).is_err());
        assert!(ColorBand::from_values([0, 0, 0, 200, 255, 255]).is_err());
        assert!(ColorBand::from_values([15, 50, 100, 45, 255, 255]).is_ok());
    }

    #[test]
    fn gray_is_neutral_in_lab() {
        let lab = rgb_to_lab(&Rgb([128, 128, 128]));
        assert!((lab[1] - 128.0).abs() < 0.5);
        assert!((lab[2] - 128.0).abs() < 0.5);

        let back = lab_to_rgb(lab);
        for c in 0..3 {
            assert!((back[c] as i32 - 128).abs() <= 1);
        }
    }

    #[test]
    fn lab_uses_eight_bit_scaling() {
        let white = rgb_to_lab(&Rgb([255, 255, 255]));
        assert!((white[0] - 255.0).abs() < 0.5);
        assert!((white[1] - 128.0).abs() < 0.5);
        assert!((white[2] - 128.0).abs() < 0.5);

        assert!(rgb_to_lab(&Rgb([0, 0, 0]))[0].abs() < 0.5);
        // Yellow carries a strongly positive b*
        assert!(rgb_to_lab(&Rgb([220, 200, 60]))[2] > 180.0);
    }

    #[test]
    fn lab_round_trip_of_grain_colors() {
        for color in [Rgb([220, 200, 60]), Rgb([70, 65, 60]), Rgb([200, 20, 20])] {
            let back = lab_to_rgb(rgb_to_lab(&color));
            for c in 0..3 {
                assert!((back[c] as i32 - color[c] as i32).abs() <= 1, "{:?} -> {:?}", color, back);
            }
        }
    }

    #[test]
    fn cast_is_pulled_towards_neutral() {
        let mut image = RgbImage::new(16, 16);
        for (x, _, p) in image.enumerate_pixels_mut() {
            let v = 120 + (x as u8) * 8;
            *p = Rgb([v, v, (v as f32 * 0.7) as u8]);
        }

        let mean_b = |img: &RgbImage| {
            img.pixels().map(|p| rgb_to_lab(p)[2] as f64).sum::<f64>() / (img.width() * img.height()) as f64
        };

        let before = mean_b(&image) - 128.0;
        let after = mean_b(&normalize_color(&image)) - 128.0;
        assert!(before > 5.0, "test image should carry a yellow cast, got {}", before);
        assert!(after.abs() < before.abs());
    }
}
