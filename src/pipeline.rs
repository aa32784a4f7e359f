// src/pipeline.rs - One configurable grading pass with variant presets

use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::annotate::annotate;
use crate::classify::{Classifier, DEFAULT_COLOR_SENSITIVITY};
use crate::color::{band_mask, normalize_color, ColorBand};
use crate::enhance::{enhance, Smoothing};
use crate::errors::{GraderError, Result};
use crate::feature_extraction::extract_features;
use crate::image_io::{frame_from_raw, rgb_from_dynamic, ChannelOrder};
use crate::image_utils::{apply_roi, count_foreground, mask_and, resize_to_width, to_gray};
use crate::morphology::{clean_mask, restrict_to, OPENING_RADIUS};
use crate::report::{CategoryCounts, GradingReport, GrainRecord};
use crate::separation::{RegionFilter, RegionSeparator, SeparationMode, DEFAULT_SEPARATION_SENSITIVITY, MIN_SOLIDITY};
use crate::threshold::{binarize, BinarizeStrategy, Polarity};
use crate::tray::locate_tray;

/// Sigma matching a 7×7 Gaussian kernel
pub const TRAY_BLUR_SIGMA: f32 = 1.4;
/// Median radius matching a 5×5 window
pub const REALTIME_MEDIAN_RADIUS: u32 = 2;
pub const REALTIME_MAX_WIDTH: u32 = 640;
pub const TRAY_WORKING_WIDTH: u32 = 800;
/// 5×5 opening of the grain mask in the tray variant
pub const TRAY_MASK_OPENING_RADIUS: u8 = 2;

/// Preset pipelines
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Still images at native resolution, four categories
    #[default]
    Accurate,
    /// Live frames, downscaled, pass/fail
    Realtime,
    /// Grains on a red tray, four categories
    Tray,
}

/// Resolution the pass works at
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkingWidth {
    Native,
    /// Downscale wider images; narrower ones are left alone
    AtMost(u32),
    /// Always resample to this width
    Exactly(u32),
}

/// Fixed structure of a pipeline, chosen at construction
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    pub working_width: WorkingWidth,
    pub normalize_color: bool,
    pub smoothing: Smoothing,
    pub binarize: BinarizeStrategy,
    pub polarity: Polarity,
    /// Restrict analysis to the inside of a red tray
    pub isolate_tray: bool,
    /// Band the binary mask is intersected with
    pub object_band: Option<ColorBand>,
    pub opening_radius: u8,
    pub separation: SeparationMode,
    pub classifier: Classifier,
    /// Area limits are in input-image pixels
    pub filter: RegionFilter,
    /// Color band used when the settings carry none
    pub default_color_band: ColorBand,
}

impl PipelineSpec {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Accurate => Self {
                working_width: WorkingWidth::Native,
                normalize_color: true,
                smoothing: Smoothing::ClaheBilateral,
                binarize: BinarizeStrategy::adaptive(),
                polarity: Polarity::Dark,
                isolate_tray: false,
                object_band: None,
                opening_radius: OPENING_RADIUS,
                separation: SeparationMode::Accurate,
                classifier: Classifier::four_category(),
                filter: RegionFilter {
                    min_area: 120.0,
                    max_area: Some(8000.0),
                    min_solidity: MIN_SOLIDITY,
                    aspect_band: None,
                },
                default_color_band: ColorBand::SPOILAGE,
            },
            Variant::Realtime => Self {
                working_width: WorkingWidth::AtMost(REALTIME_MAX_WIDTH),
                normalize_color: false,
                smoothing: Smoothing::Median(REALTIME_MEDIAN_RADIUS),
                binarize: BinarizeStrategy::Otsu,
                polarity: Polarity::Dark,
                isolate_tray: false,
                object_band: None,
                opening_radius: OPENING_RADIUS,
                separation: SeparationMode::Fast,
                classifier: Classifier::pass_fail(),
                filter: RegionFilter {
                    min_area: 150.0,
                    max_area: None,
                    min_solidity: MIN_SOLIDITY,
                    aspect_band: None,
                },
                default_color_band: ColorBand::FAIL_COLOR,
            },
            Variant::Tray => Self {
                working_width: WorkingWidth::Exactly(TRAY_WORKING_WIDTH),
                normalize_color: false,
                smoothing: Smoothing::Gaussian(TRAY_BLUR_SIGMA),
                binarize: BinarizeStrategy::Otsu,
                polarity: Polarity::Bright,
                isolate_tray: true,
                object_band: Some(ColorBand::WHITE),
                opening_radius: TRAY_MASK_OPENING_RADIUS,
                separation: SeparationMode::Fast,
                classifier: Classifier::four_category(),
                filter: RegionFilter {
                    min_area: 300.0,
                    max_area: Some(4000.0),
                    min_solidity: MIN_SOLIDITY,
                    aspect_band: Some((0.25, 4.0)),
                },
                default_color_band: ColorBand::SPOILAGE,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.working_width {
            WorkingWidth::AtMost(0) | WorkingWidth::Exactly(0) => {
                return Err(GraderError::Config("working width must be > 0".to_string()));
            }
            _ => {}
        }

        if let BinarizeStrategy::Adaptive { window, .. } = self.binarize {
            if window < 3 || window % 2 == 0 {
                return Err(GraderError::Config(
                    "adaptive window must be odd and >= 3".to_string(),
                ));
            }
        }

        if let Smoothing::Gaussian(sigma) = self.smoothing {
            if sigma <= 0.0 {
                return Err(GraderError::Config("gaussian sigma must be > 0.0".to_string()));
            }
        }

        if self.filter.min_area < 0.0 {
            return Err(GraderError::Config("min_area must be >= 0".to_string()));
        }

        if let Some(max_area) = self.filter.max_area {
            if max_area < self.filter.min_area {
                return Err(GraderError::Config("max_area must be >= min_area".to_string()));
            }
        }

        if !(0.0..=1.0).contains(&self.filter.min_solidity) {
            return Err(GraderError::Config(
                "min_solidity must be between 0.0 and 1.0".to_string(),
            ));
        }

        if let Some((low, high)) = self.filter.aspect_band {
            if low <= 0.0 || high < low {
                return Err(GraderError::Config(
                    "aspect band must satisfy 0 < low <= high".to_string(),
                ));
            }
        }

        if let Some(band) = &self.object_band {
            band.validate()?;
        }
        self.default_color_band.validate()
    }
}

/// Per-pass tunables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Fraction of the peak distance a seed must exceed (accurate separation only)
    pub separation_sensitivity: f64,
    /// Color ratio above which a grain is spoiled or failed
    pub color_sensitivity: f64,
    /// Overrides the variant's color band
    pub color_band: Option<ColorBand>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            separation_sensitivity: DEFAULT_SEPARATION_SENSITIVITY,
            color_sensitivity: DEFAULT_COLOR_SENSITIVITY,
            color_band: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if !(self.separation_sensitivity > 0.0 && self.separation_sensitivity < 1.0) {
            return Err(GraderError::Config(format!(
                "separation_sensitivity must be in (0, 1), got {}",
                self.separation_sensitivity
            )));
        }

        if !(self.color_sensitivity > 0.0 && self.color_sensitivity < 1.0) {
            return Err(GraderError::Config(format!(
                "color_sensitivity must be in (0, 1), got {}",
                self.color_sensitivity
            )));
        }

        if let Some(band) = &self.color_band {
            band.validate()?;
        }

        Ok(())
    }
}

/// Intermediate images of one pass, kept for debugging
#[derive(Debug, Clone)]
pub struct Intermediates {
    /// Color image at working resolution after ROI and cast correction
    pub prepared: RgbImage,
    pub tray: Option<GrayImage>,
    pub enhanced: GrayImage,
    pub binary: GrayImage,
    pub opened: GrayImage,
    pub color_mask: GrayImage,
}

/// Immutable grading pipeline; safe to share between threads
pub struct Pipeline {
    spec: PipelineSpec,
    separator: Box<dyn RegionSeparator>,
}

impl Pipeline {
    pub fn new(spec: PipelineSpec) -> Result<Self> {
        spec.validate()?;
        let separator = spec.separation.separator();
        Ok(Self { spec, separator })
    }

    pub fn for_variant(variant: Variant) -> Result<Self> {
        Self::new(PipelineSpec::for_variant(variant))
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    /// Grade one image
    pub fn process(&self, image: &RgbImage, settings: &Settings) -> Result<GradingReport> {
        self.process_traced(image, settings).map(|(report, _)| report)
    }

    /// Grade a decoded image; it must have exactly three channels
    pub fn process_dynamic(&self, image: &DynamicImage, settings: &Settings) -> Result<GradingReport> {
        let rgb = rgb_from_dynamic(image)?;
        self.process(&rgb, settings)
    }

    /// Grade a raw interleaved frame, as delivered by a camera
    pub fn process_frame(
        &self,
        width: u32,
        height: u32,
        channels: u8,
        data: &[u8],
        order: ChannelOrder,
        settings: &Settings,
    ) -> Result<GradingReport> {
        let rgb = frame_from_raw(width, height, channels, data, order)?;
        self.process(&rgb, settings)
    }

    /// Grade one image and also return the intermediate images
    pub fn process_traced(
        &self,
        image: &RgbImage,
        settings: &Settings,
    ) -> Result<(GradingReport, Intermediates)> {
        let (input_width, input_height) = image.dimensions();
        if input_width == 0 || input_height == 0 {
            return Err(GraderError::InvalidInput(format!(
                "image has zero dimension ({}x{})",
                input_width, input_height
            )));
        }
        settings.validate()?;

        // Step 1: Working resolution
        let (working, scale) = match self.spec.working_width {
            WorkingWidth::Native => (image.clone(), 1.0),
            WorkingWidth::AtMost(width) if input_width > width => resize_to_width(image, width),
            WorkingWidth::AtMost(_) => (image.clone(), 1.0),
            WorkingWidth::Exactly(width) => resize_to_width(image, width),
        };
        let area_factor = scale * scale;
        log::debug!(
            "Working at {}x{} (scale {:.3})",
            working.width(),
            working.height(),
            scale
        );

        // Step 2: Tray region of interest
        let tray = if self.spec.isolate_tray {
            let roi = locate_tray(&working);
            if roi.is_none() {
                log::warn!("No red tray found, analysing the whole image");
            }
            roi
        } else {
            None
        };
        let masked = match &tray {
            Some(roi) => apply_roi(&working, roi),
            None => working,
        };

        // Step 3: Color cast correction
        let prepared = if self.spec.normalize_color {
            normalize_color(&masked)
        } else {
            masked
        };

        // Step 4: Contrast and smoothing
        let enhanced = enhance(&to_gray(&prepared), self.spec.smoothing);

        // Step 5: Binarization
        let mut binary = binarize(&enhanced, self.spec.binarize, self.spec.polarity);
        if let Some(band) = &self.spec.object_band {
            binary = mask_and(&binary, &band_mask(&prepared, band));
        }
        if let Some(roi) = &tray {
            binary = restrict_to(&binary, roi);
        }
        log::debug!("Binary mask covers {} pixels", count_foreground(&binary));

        // Step 6: Cleaning and separation
        let with_background = self.spec.separation == SeparationMode::Accurate;
        let cleaned = clean_mask(&binary, self.spec.opening_radius, with_background);
        let filter = self.spec.filter.with_area_scale(area_factor);
        let regions = self.separator.separate(
            &cleaned,
            &prepared,
            settings.separation_sensitivity,
            &filter,
        );

        // Step 7: Features and classification
        let band = settings.color_band.unwrap_or(self.spec.default_color_band);
        let color_mask = band_mask(&prepared, &band);
        let classifier = self.spec.classifier.with_area_scale(area_factor);

        let mut counts = CategoryCounts::new(classifier.categories());
        let mut grains = Vec::with_capacity(regions.len());
        for (index, region) in regions.iter().enumerate() {
            let features = extract_features(region, &color_mask);
            let category = classifier.classify(&features, settings.color_sensitivity);
            counts.record(category);
            grains.push(GrainRecord {
                index,
                bbox: region.bbox.scaled(1.0 / scale, input_width, input_height),
                features,
                category,
            });
        }

        // Step 8: Annotation at input resolution
        let boxes: Vec<_> = grains.iter().map(|grain| (grain.bbox, grain.category)).collect();
        let annotated = annotate(image, &boxes);

        log::debug!("Graded {} grains", grains.len());

        let report = GradingReport { annotated, counts, grains };
        let intermediates = Intermediates {
            prepared,
            tray,
            enhanced,
            binary,
            opened: cleaned.opened,
            color_mask,
        };

        Ok((report, intermediates))
    }
}
