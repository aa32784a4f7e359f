// src/lib.rs - Library interface for the rice grader

pub mod annotate;
pub mod classify;
pub mod color;
pub mod config;
pub mod distance;
pub mod enhance;
pub mod errors;
pub mod feature_extraction;
pub mod font;
pub mod image_io;
pub mod image_utils;
pub mod morphology;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod separation;
pub mod shape_analysis;
pub mod threshold;
pub mod tray;
pub mod watershed;

// Re-export commonly used types and functions
pub use errors::{GraderError, Result};
pub use config::Config;
pub use pipeline::{Intermediates, Pipeline, PipelineSpec, Settings, Variant, WorkingWidth};
pub use image_io::{ChannelOrder, InputImage, frame_from_raw, load_image, rgb_from_dynamic, save_image};
pub use report::{CategoryCounts, GradingReport, GrainRecord};

// Re-export the processing stages
pub use classify::{Category, Classifier};
pub use color::{normalize_color, ColorBand};
pub use enhance::{enhance, Smoothing};
pub use feature_extraction::{extract_features, GrainFeatures};
pub use morphology::{clean_mask, CleanedMask};
pub use separation::{
    AccurateSeparator,
    FastSeparator,
    Region,
    RegionFilter,
    RegionSeparator,
    SeparationMode,
};
pub use threshold::{binarize, BinarizeStrategy, Polarity};
