// src/image_io.rs - Loading, saving and decoding input images and frames

use std::path::{Path, PathBuf};
use std::fs;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use crate::errors::{GraderError, Result};

/// Extensions picked up when scanning a directory
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Represents an input image with its metadata
pub struct InputImage {
    pub image: RgbImage,
    pub path: PathBuf,
    pub filename: String,
}

/// Byte order of the color channels in a raw frame
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    /// Blue first, as most camera drivers deliver
    Bgr,
}

/// Get all image files from a directory (recursively), sorted by path
pub fn get_image_files_in_dir<P: AsRef<Path>>(dir_path: P) -> Result<Vec<PathBuf>> {
    let dir_path = dir_path.as_ref();

    if !dir_path.exists() {
        return Err(GraderError::InvalidPath(dir_path.to_path_buf()));
    }

    if !dir_path.is_dir() {
        return Err(GraderError::Config(format!(
            "{} is not a directory", dir_path.display()
        )));
    }

    let mut image_files = Vec::new();
    find_image_files_recursive(dir_path, &mut image_files)?;
    image_files.sort();

    Ok(image_files)
}

fn find_image_files_recursive(dir_path: &Path, result: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();

        if path.is_dir() {
            find_image_files_recursive(&path, result)?;
        } else if path.is_file() && has_image_extension(&path) {
            result.push(path);
        }
    }

    Ok(())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Load an image from disk as 8-bit RGB
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<InputImage> {
    let path = path.as_ref();

    // Get filename without extension
    let filename = path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| GraderError::InvalidPath(path.to_path_buf()))?
        .to_string();

    let img = image::open(path)?;
    let image = rgb_from_dynamic(&img)?;

    Ok(InputImage {
        image,
        path: path.to_path_buf(),
        filename,
    })
}

/// Accept a decoded image only when it has exactly three color channels
pub fn rgb_from_dynamic(image: &DynamicImage) -> Result<RgbImage> {
    let channels = image.color().channel_count();
    if channels != 3 {
        return Err(GraderError::InvalidInput(format!(
            "expected a 3-channel image, got {} channel(s)", channels
        )));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(GraderError::InvalidInput("image has zero dimension".to_string()));
    }

    Ok(image.to_rgb8())
}

/// Build an RGB image from an interleaved 8-bit frame buffer
pub fn frame_from_raw(
    width: u32,
    height: u32,
    channels: u8,
    data: &[u8],
    order: ChannelOrder,
) -> Result<RgbImage> {
    if width == 0 || height == 0 {
        return Err(GraderError::InvalidInput(format!(
            "frame has zero dimension ({}x{})", width, height
        )));
    }
    if channels != 3 {
        return Err(GraderError::InvalidInput(format!(
            "expected 3 channels per pixel, got {}", channels
        )));
    }

    let expected = width as usize * height as usize * 3;
    if data.len() != expected {
        return Err(GraderError::InvalidInput(format!(
            "frame buffer holds {} bytes, {}x{}x3 needs {}",
            data.len(), width, height, expected
        )));
    }

    let mut buffer = data.to_vec();
    if order == ChannelOrder::Bgr {
        for pixel in buffer.chunks_exact_mut(3) {
            pixel.swap(0, 2);
        }
    }

    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| GraderError::InvalidInput("frame buffer does not match its size".to_string()))
}

/// Save an RGB image as PNG
pub fn save_image<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a mask or intensity image as PNG
pub fn save_gray_image<P: AsRef<Path>>(image: &GrayImage, path: P) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
