// src/separation.rs - Splitting the cleaned mask into one region per object

use std::collections::BTreeMap;

use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::{Deserialize, Serialize};

use crate::distance::distance_transform;
use crate::image_utils::{is_foreground, largest_component, BACKGROUND, FOREGROUND};
use crate::morphology::{apply_dilation, CleanedMask, BACKGROUND_DILATION_RADIUS};
use crate::shape_analysis::{calculate_perimeter, convex_hull_area, polygon_area, BoundingBox};
use crate::watershed::{flood, MarkerImage, BACKGROUND_LABEL, FIRST_SEED_LABEL, UNKNOWN};

/// Minimum contour-to-hull area ratio for a region to count as one object
pub const MIN_SOLIDITY: f64 = 0.75;

/// Default fraction of the peak distance a pixel must exceed to seed a region
pub const DEFAULT_SEPARATION_SENSITIVITY: f64 = 0.4;

/// One connected object found in the mask
#[derive(Debug, Clone)]
pub struct Region {
    pub label: u32,
    pub bbox: BoundingBox,
    /// Ordered outer boundary in image coordinates
    pub contour: Vec<Point<i32>>,
    /// Pixel count of the region
    pub area: u32,
    /// Area enclosed by the contour polygon
    pub contour_area: f64,
    pub perimeter: f64,
    pub hull_area: f64,
}

impl Region {
    /// Contour area over convex hull area; zero for a degenerate hull
    pub fn solidity(&self) -> f64 {
        if self.hull_area > 0.0 {
            self.contour_area / self.hull_area
        } else {
            0.0
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.bbox.aspect_ratio()
    }
}

/// Acceptance rules shared by both separation modes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionFilter {
    pub min_area: f64,
    pub max_area: Option<f64>,
    pub min_solidity: f64,
    /// Inclusive bounding-box aspect ratio band
    pub aspect_band: Option<(f64, f64)>,
}

impl Default for RegionFilter {
    fn default() -> Self {
        Self {
            min_area: 0.0,
            max_area: None,
            min_solidity: MIN_SOLIDITY,
            aspect_band: None,
        }
    }
}

impl RegionFilter {
    pub fn accepts(&self, region: &Region) -> bool {
        let area = region.area as f64;
        if area < self.min_area {
            return false;
        }
        if let Some(max_area) = self.max_area {
            if area > max_area {
                return false;
            }
        }
        if region.hull_area <= 0.0 || region.solidity() < self.min_solidity {
            return false;
        }
        if let Some((low, high)) = self.aspect_band {
            let ratio = region.aspect_ratio();
            if ratio < low || ratio > high {
                return false;
            }
        }
        true
    }

    /// Same filter with its area limits multiplied by `factor`
    pub fn with_area_scale(&self, factor: f64) -> Self {
        Self {
            min_area: self.min_area * factor,
            max_area: self.max_area.map(|max_area| max_area * factor),
            ..*self
        }
    }
}

/// Strategy that turns a cleaned mask into regions
pub trait RegionSeparator: Send + Sync {
    fn mode(&self) -> SeparationMode;

    /// Emit one accepted region per distinct object
    fn separate(
        &self,
        cleaned: &CleanedMask,
        source: &RgbImage,
        sensitivity: f64,
        filter: &RegionFilter,
    ) -> Vec<Region>;
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeparationMode {
    /// Distance-seeded marker flood; splits touching objects
    Accurate,
    /// Connected components of the mask; touching objects merge
    Fast,
}

impl SeparationMode {
    pub fn separator(self) -> Box<dyn RegionSeparator> {
        match self {
            SeparationMode::Accurate => Box::new(AccurateSeparator),
            SeparationMode::Fast => Box::new(FastSeparator),
        }
    }
}

/// Marker-controlled flood seeded from the cores of the distance field
#[derive(Debug, Clone, Copy, Default)]
pub struct AccurateSeparator;

impl RegionSeparator for AccurateSeparator {
    fn mode(&self) -> SeparationMode {
        SeparationMode::Accurate
    }

    fn separate(
        &self,
        cleaned: &CleanedMask,
        source: &RgbImage,
        sensitivity: f64,
        filter: &RegionFilter,
    ) -> Vec<Region> {
        let opened = &cleaned.opened;
        let (width, height) = opened.dimensions();

        let field = distance_transform(opened);
        let cutoff = sensitivity as f32 * field.max();
        let sure_foreground = GrayImage::from_fn(width, height, |x, y| {
            Luma([if field.get(x, y) > cutoff { FOREGROUND } else { BACKGROUND }])
        });

        let dilated;
        let sure_background = match &cleaned.sure_background {
            Some(background) => background,
            None => {
                dilated = apply_dilation(opened, BACKGROUND_DILATION_RADIUS);
                &dilated
            }
        };

        let seeds = connected_components(&sure_foreground, Connectivity::Eight, Luma([BACKGROUND]));
        let mut markers = MarkerImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let seed = seeds.get_pixel(x, y)[0];
                let label = if seed > 0 {
                    seed as i32 + BACKGROUND_LABEL
                } else if is_foreground(sure_background.get_pixel(x, y)) {
                    UNKNOWN
                } else {
                    BACKGROUND_LABEL
                };
                markers.set(x, y, label);
            }
        }
        log::debug!(
            "Marker flood: {} seeds above distance {:.2}",
            markers.seed_labels().len(),
            cutoff
        );

        flood(&mut markers, source);

        extract_regions(
            width,
            height,
            |x, y| {
                let label = markers.get(x, y);
                if label >= FIRST_SEED_LABEL {
                    Some(label as u32)
                } else {
                    None
                }
            },
            filter,
        )
    }
}

/// Direct contour tracing of the mask's connected components
#[derive(Debug, Clone, Copy, Default)]
pub struct FastSeparator;

impl RegionSeparator for FastSeparator {
    fn mode(&self) -> SeparationMode {
        SeparationMode::Fast
    }

    fn separate(
        &self,
        cleaned: &CleanedMask,
        _source: &RgbImage,
        _sensitivity: f64,
        filter: &RegionFilter,
    ) -> Vec<Region> {
        let (width, height) = cleaned.opened.dimensions();
        let components = connected_components(&cleaned.opened, Connectivity::Eight, Luma([BACKGROUND]));

        extract_regions(
            width,
            height,
            |x, y| {
                let label = components.get_pixel(x, y)[0];
                if label > 0 {
                    Some(label)
                } else {
                    None
                }
            },
            filter,
        )
    }
}

/// Trace every labelled set and keep the ones the filter accepts, in label order
fn extract_regions<F>(width: u32, height: u32, label_at: F, filter: &RegionFilter) -> Vec<Region>
where
    F: Fn(u32, u32) -> Option<u32>,
{
    // label -> [min_x, min_y, max_x, max_y]
    let mut extents: BTreeMap<u32, [u32; 4]> = BTreeMap::new();
    for y in 0..height {
        for x in 0..width {
            if let Some(label) = label_at(x, y) {
                let extent = extents.entry(label).or_insert([x, y, x, y]);
                extent[0] = extent[0].min(x);
                extent[1] = extent[1].min(y);
                extent[2] = extent[2].max(x);
                extent[3] = extent[3].max(y);
            }
        }
    }

    let mut regions = Vec::new();
    let mut rejected = 0usize;
    for (&label, &extent) in &extents {
        match trace_region(label, extent, &label_at) {
            Some(region) if filter.accepts(&region) => regions.push(region),
            _ => rejected += 1,
        }
    }

    log::debug!("Regions: {} accepted, {} rejected", regions.len(), rejected);
    regions
}

/// Crop one label with a pixel of padding, keep its largest fragment and
/// measure its outer contour
fn trace_region<F>(label: u32, extent: [u32; 4], label_at: &F) -> Option<Region>
where
    F: Fn(u32, u32) -> Option<u32>,
{
    let [min_x, min_y, max_x, max_y] = extent;
    let crop_width = max_x - min_x + 3;
    let crop_height = max_y - min_y + 3;

    let crop = GrayImage::from_fn(crop_width, crop_height, |cx, cy| {
        let on_padding = cx == 0 || cy == 0 || cx == crop_width - 1 || cy == crop_height - 1;
        if !on_padding && label_at(min_x + cx - 1, min_y + cy - 1) == Some(label) {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });

    let (fragment, area) = largest_component(&crop)?;
    let outer = find_contours::<i32>(&fragment)
        .into_iter()
        .find(|contour| matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none())?;

    let offset_x = min_x as i32 - 1;
    let offset_y = min_y as i32 - 1;
    let contour: Vec<Point<i32>> = outer
        .points
        .iter()
        .map(|p| Point::new(p.x + offset_x, p.y + offset_y))
        .collect();
    let bbox = BoundingBox::from_points(&contour)?;

    Some(Region {
        label,
        bbox,
        area,
        contour_area: polygon_area(&contour),
        perimeter: calculate_perimeter(&contour),
        hull_area: convex_hull_area(&contour),
        contour,
    })
}
