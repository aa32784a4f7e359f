// src/output.rs - Writing grain tables, counts and annotated images

use std::fs;
use std::path::{Path, PathBuf};
use csv::Writer;
use serde::Serialize;

use crate::classify::Category;
use crate::errors::Result;
use crate::image_io::{save_gray_image, save_image};
use crate::pipeline::Intermediates;
use crate::report::{CategoryCounts, GradingReport, GrainRecord};

/// Count summary written next to the grain table
#[derive(Debug, Serialize)]
struct CountSummary<'a> {
    image: &'a str,
    total: usize,
    counts: &'a CategoryCounts,
}

fn prepare_path<P: AsRef<Path>>(output_dir: P, subdir: &str, file_name: String) -> Result<PathBuf> {
    let output_path = output_dir.as_ref().join(subdir).join(file_name);

    // Create directory if it doesn't exist
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    Ok(output_path)
}

/// Write per-grain features to `<output_dir>/grains/<filename>.csv`
pub fn write_grain_csv<P: AsRef<Path>>(
    grains: &[GrainRecord],
    output_dir: P,
    filename: &str,
) -> Result<PathBuf> {
    let output_path = prepare_path(output_dir, "grains", format!("{}.csv", filename))?;
    let mut writer = Writer::from_path(&output_path)?;

    writer.write_record([
        "Index",
        "Category",
        "Box_X",
        "Box_Y",
        "Box_Width",
        "Box_Height",
        "Area",
        "Perimeter",
        "Circularity",
        "Aspect_Ratio",
        "Elongation",
        "Solidity",
        "Color_Ratio",
    ])?;

    for grain in grains {
        let f = &grain.features;
        writer.write_record(&[
            grain.index.to_string(),
            grain.category.to_string(),
            grain.bbox.x.to_string(),
            grain.bbox.y.to_string(),
            grain.bbox.width.to_string(),
            grain.bbox.height.to_string(),
            format!("{:.0}", f.area),
            format!("{:.6}", f.perimeter),
            format!("{:.6}", f.circularity),
            format!("{:.6}", f.aspect_ratio),
            format!("{:.6}", f.elongation),
            format!("{:.6}", f.solidity),
            format!("{:.6}", f.color_ratio),
        ])?;
    }

    writer.flush()?;
    Ok(output_path)
}

/// Write the category counts to `<output_dir>/counts/<filename>.json`
pub fn write_counts_json<P: AsRef<Path>>(
    counts: &CategoryCounts,
    output_dir: P,
    filename: &str,
) -> Result<PathBuf> {
    let output_path = prepare_path(output_dir, "counts", format!("{}.json", filename))?;
    let summary = CountSummary {
        image: filename,
        total: counts.total(),
        counts,
    };

    fs::write(&output_path, serde_json::to_string_pretty(&summary)?)?;
    Ok(output_path)
}

/// Save the annotated image to `<output_dir>/annotated/<filename>.png`
pub fn save_annotated<P: AsRef<Path>>(
    report: &GradingReport,
    output_dir: P,
    filename: &str,
) -> Result<PathBuf> {
    let output_path = prepare_path(output_dir, "annotated", format!("{}.png", filename))?;
    save_image(&report.annotated, &output_path)?;
    Ok(output_path)
}

/// Save intermediate images under `<output_dir>/debug/`
pub fn save_intermediates<P: AsRef<Path>>(
    intermediates: &Intermediates,
    output_dir: P,
    filename: &str,
) -> Result<()> {
    let output_dir = output_dir.as_ref();

    let prepared = prepare_path(output_dir, "debug", format!("{}_prepared.png", filename))?;
    save_image(&intermediates.prepared, prepared)?;

    let stages = [
        ("enhanced", &intermediates.enhanced),
        ("binary", &intermediates.binary),
        ("opened", &intermediates.opened),
        ("color_mask", &intermediates.color_mask),
    ];
    for (stage, image) in stages {
        let path = prepare_path(output_dir, "debug", format!("{}_{}.png", filename, stage))?;
        save_gray_image(image, path)?;
    }

    if let Some(tray) = &intermediates.tray {
        let path = prepare_path(output_dir, "debug", format!("{}_tray.png", filename))?;
        save_gray_image(tray, path)?;
    }

    Ok(())
}

/// One-line summary used by the CLI
pub fn format_counts(counts: &CategoryCounts) -> String {
    let parts: Vec<String> = counts
        .iter()
        .map(|(category, count): (Category, usize)| format!("{}={}", category, count))
        .collect();
    format!("{} (total {})", parts.join(", "), counts.total())
}
