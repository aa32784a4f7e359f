// src/classify.rs - Rule-based grain categories

use std::fmt;

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::feature_extraction::GrainFeatures;

/// Default color ratio above which a grain counts as discolored
pub const DEFAULT_COLOR_SENSITIVITY: f64 = 0.12;

pub const BROKEN_AREA_THRESHOLD: f64 = 350.0;
pub const FOREIGN_CIRCULARITY_THRESHOLD: f64 = 0.7;
pub const FAIL_AREA_THRESHOLD: f64 = 300.0;
/// Grains are expected to be elongated; rounder objects fail
pub const MIN_ELONGATION: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Good,
    Broken,
    Spoiled,
    Foreign,
    Pass,
    Fail,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Good => "Good",
            Category::Broken => "Broken",
            Category::Spoiled => "Spoiled",
            Category::Foreign => "Foreign",
            Category::Pass => "Pass",
            Category::Fail => "Fail",
        }
    }

    /// Annotation color
    pub fn color(&self) -> Rgb<u8> {
        match self {
            Category::Good | Category::Pass => Rgb([0, 255, 0]),
            Category::Broken | Category::Fail => Rgb([255, 0, 0]),
            Category::Spoiled => Rgb([255, 165, 0]),
            Category::Foreign => Rgb([0, 0, 255]),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Limits of the four-category form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FourCategoryThresholds {
    pub broken_area: f64,
    pub foreign_circularity: f64,
}

impl Default for FourCategoryThresholds {
    fn default() -> Self {
        Self {
            broken_area: BROKEN_AREA_THRESHOLD,
            foreign_circularity: FOREIGN_CIRCULARITY_THRESHOLD,
        }
    }
}

/// Limits of the pass/fail form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassFailThresholds {
    pub fail_area: f64,
    pub min_elongation: f64,
}

impl Default for PassFailThresholds {
    fn default() -> Self {
        Self {
            fail_area: FAIL_AREA_THRESHOLD,
            min_elongation: MIN_ELONGATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classifier {
    FourCategory(FourCategoryThresholds),
    PassFail(PassFailThresholds),
}

const FOUR_CATEGORIES: [Category; 4] = [Category::Good, Category::Broken, Category::Spoiled, Category::Foreign];
const PASS_FAIL_CATEGORIES: [Category; 2] = [Category::Pass, Category::Fail];

impl Classifier {
    pub fn four_category() -> Self {
        Classifier::FourCategory(FourCategoryThresholds::default())
    }

    pub fn pass_fail() -> Self {
        Classifier::PassFail(PassFailThresholds::default())
    }

    /// Every category this form can emit
    pub fn categories(&self) -> &'static [Category] {
        match self {
            Classifier::FourCategory(_) => &FOUR_CATEGORIES,
            Classifier::PassFail(_) => &PASS_FAIL_CATEGORIES,
        }
    }

    /// Same classifier with its area limits multiplied by `factor`
    pub fn with_area_scale(&self, factor: f64) -> Self {
        match *self {
            Classifier::FourCategory(t) => Classifier::FourCategory(FourCategoryThresholds {
                broken_area: t.broken_area * factor,
                ..t
            }),
            Classifier::PassFail(t) => Classifier::PassFail(PassFailThresholds {
                fail_area: t.fail_area * factor,
                ..t
            }),
        }
    }

    /// Assign a category; for the four-category form the first matching rule wins
    pub fn classify(&self, features: &GrainFeatures, color_sensitivity: f64) -> Category {
        match self {
            Classifier::FourCategory(t) => {
                if features.area < t.broken_area {
                    Category::Broken
                } else if features.color_ratio > color_sensitivity {
                    Category::Spoiled
                } else if features.circularity > t.foreign_circularity {
                    Category::Foreign
                } else {
                    Category::Good
                }
            }
            Classifier::PassFail(t) => {
                let fails = features.area < t.fail_area
                    || features.color_ratio > color_sensitivity
                    || features.elongation < t.min_elongation;
                if fails {
                    Category::Fail
                } else {
                    Category::Pass
                }
            }
        }
    }
}
