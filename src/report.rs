// src/report.rs - Aggregated result of one grading pass

use std::collections::BTreeMap;

use image::RgbImage;
use serde::Serialize;

use crate::classify::Category;
use crate::feature_extraction::GrainFeatures;
use crate::shape_analysis::BoundingBox;

/// Per-category totals; always holds every category of the classifier form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryCounts(BTreeMap<Category, usize>);

impl CategoryCounts {
    /// Zeroed counter over the given categories
    pub fn new(categories: &[Category]) -> Self {
        Self(categories.iter().map(|&category| (category, 0)).collect())
    }

    pub fn record(&mut self, category: Category) {
        *self.0.entry(category).or_insert(0) += 1;
    }

    pub fn get(&self, category: Category) -> usize {
        self.0.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.0.iter().map(|(&category, &count)| (category, count))
    }
}

/// One accepted grain
#[derive(Debug, Clone, Serialize)]
pub struct GrainRecord {
    pub index: usize,
    /// Bounding box in input image coordinates
    pub bbox: BoundingBox,
    /// Measurements at the working resolution
    pub features: GrainFeatures,
    pub category: Category,
}

/// Everything a pass hands back to the caller
#[derive(Debug, Clone)]
pub struct GradingReport {
    /// Input image with boxes and labels, at input resolution
    pub annotated: RgbImage,
    pub counts: CategoryCounts,
    pub grains: Vec<GrainRecord>,
}

impl GradingReport {
    pub fn total(&self) -> usize {
        self.counts.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_start_at_zero_for_every_category() {
        let counts = CategoryCounts::new(&[Category::Pass, Category::Fail]);
        assert_eq!(counts.get(Category::Pass), 0);
        assert_eq!(counts.get(Category::Fail), 0);
        assert_eq!(counts.iter().count(), 2);
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn total_is_sum_of_counts() {
        let mut counts = CategoryCounts::new(&[Category::Good, Category::Broken, Category::Spoiled, Category::Foreign]);
        counts.record(Category::Good);
        counts.record(Category::Good);
        counts.record(Category::Spoiled);
        assert_eq!(counts.get(Category::Good), 2);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn counts_serialize_as_a_flat_map() {
        let mut counts = CategoryCounts::new(&[Category::Pass, Category::Fail]);
        counts.record(Category::Fail);
        let json = serde_json::to_string(&counts).expect("serializable");
        assert_eq!(json, r#"{"Pass":0,"Fail":1}"#);
    }
}
