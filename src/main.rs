// src/main.rs - Command-line grading of image files and directories

use std::path::{Path, PathBuf};
use std::time::Instant;
use clap::{Parser, ValueEnum};
use rayon::prelude::*;

use rice_grader_lib::config::Config;
use rice_grader_lib::errors::{GraderError, Result};
use rice_grader_lib::image_io::{get_image_files_in_dir, load_image, InputImage};
use rice_grader_lib::output::{format_counts, save_annotated, save_intermediates, write_counts_json, write_grain_csv};
use rice_grader_lib::pipeline::{Pipeline, Settings, Variant};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "Rice grain grading from tray images and camera frames")]
struct Args {
    /// Path to input file or directory
    #[clap(short, long)]
    input: Option<String>,

    /// Path to output directory
    #[clap(short, long)]
    output: Option<String>,

    /// Path to configuration file (defaults are used when it does not exist)
    #[clap(short, long, default_value = "config.toml")]
    config: String,

    /// Pipeline preset (overwrites config)
    #[clap(short, long)]
    variant: Option<VariantArg>,

    /// Grain separation sensitivity in (0, 1) (overwrites config)
    #[clap(short, long)]
    separation: Option<f64>,

    /// Spoiled/fail color sensitivity in (0, 1) (overwrites config)
    #[clap(long)]
    sensitivity: Option<f64>,

    /// Enable debug mode (save intermediate images)
    #[clap(short, long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Accurate,
    Realtime,
    Tray,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Accurate => Variant::Accurate,
            VariantArg::Realtime => Variant::Realtime,
            VariantArg::Tray => Variant::Tray,
        }
    }
}

/// Grade one loaded image and write its outputs
fn process_image(
    input_image: InputImage,
    pipeline: &Pipeline,
    settings: &Settings,
    config: &Config,
    debug: bool,
) -> Result<()> {
    let InputImage { image, path, filename } = input_image;
    let output_dir = Path::new(&config.output_base_dir);

    let report = if debug {
        let (report, intermediates) = pipeline.process_traced(&image, settings)?;
        save_intermediates(&intermediates, output_dir, &filename)?;
        report
    } else {
        pipeline.process(&image, settings)?
    };

    if config.save_annotated {
        save_annotated(&report, output_dir, &filename)?;
    }
    if config.write_grain_csv {
        write_grain_csv(&report.grains, output_dir, &filename)?;
    }
    write_counts_json(&report.counts, output_dir, &filename)?;

    log::info!("{}: {}", path.display(), format_counts(&report.counts));
    Ok(())
}

fn load_and_process(path: &Path, pipeline: &Pipeline, settings: &Settings, config: &Config, debug: bool) -> Result<()> {
    log::info!("Processing: {}", path.display());
    let input_image = load_image(path)?;
    process_image(input_image, pipeline, settings, config, debug)
}

/// Main function
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::from_file_or_default(&args.config)?;

    // Override config with command-line arguments
    if let Some(input) = args.input.clone() {
        config.input_path = input;
    }

    if let Some(output) = args.output.clone() {
        config.output_base_dir = output;
    }

    if let Some(variant) = args.variant {
        config.variant = variant.into();
    }

    if let Some(separation) = args.separation {
        config.separation_sensitivity = separation;
    }

    if let Some(sensitivity) = args.sensitivity {
        config.color_sensitivity = sensitivity;
    }

    // Validate configuration
    config.validate()?;

    let pipeline = Pipeline::new(config.pipeline_spec())?;
    let settings = config.settings()?;

    // Start timing
    let start_time = Instant::now();

    // Process input
    let input_path = PathBuf::from(&config.input_path);

    if input_path.is_file() {
        log::info!("Processing single file: {}", input_path.display());
        load_and_process(&input_path, &pipeline, &settings, &config, args.debug)?;
    } else if input_path.is_dir() {
        log::info!("Processing directory: {}", input_path.display());
        let image_files = get_image_files_in_dir(&input_path)?;

        log::info!("Found {} image files", image_files.len());

        let failures = if config.use_parallel {
            image_files.par_iter()
                .filter_map(|path| {
                    load_and_process(path, &pipeline, &settings, &config, args.debug)
                        .err()
                        .map(|e| (path.clone(), e))
                })
                .collect::<Vec<_>>()
        } else {
            image_files.iter()
                .filter_map(|path| {
                    load_and_process(path, &pipeline, &settings, &config, args.debug)
                        .err()
                        .map(|e| (path.clone(), e))
                })
                .collect::<Vec<_>>()
        };

        for (path, e) in &failures {
            log::error!("Error processing {}: {}", path.display(), e);
        }
        if !failures.is_empty() {
            log::warn!("{} of {} files failed", failures.len(), image_files.len());
        }
    } else {
        return Err(GraderError::InvalidPath(input_path));
    }

    // Report elapsed time
    let elapsed = start_time.elapsed();
    log::info!("Processing completed in {:.2} seconds", elapsed.as_secs_f64());

    Ok(())
}
