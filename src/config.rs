// src/config.rs - File-based configuration for the grading CLI

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::DEFAULT_COLOR_SENSITIVITY;
use crate::color::ColorBand;
use crate::errors::{GraderError, Result};
use crate::pipeline::{PipelineSpec, Settings, Variant};
use crate::separation::{SeparationMode, DEFAULT_SEPARATION_SENSITIVITY};

/// Configuration for the rice grader
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_input_path")]
    pub input_path: String,

    #[serde(default = "default_output_base_dir")]
    pub output_base_dir: String,

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,

    #[serde(default)]
    pub variant: Variant,

    /// Overrides the separation mode of the variant preset
    #[serde(default)]
    pub separation_mode: Option<SeparationMode>,

    #[serde(default = "default_separation_sensitivity")]
    pub separation_sensitivity: f64,

    /// Spoiled (four-category) or fail (pass/fail) color ratio threshold
    #[serde(default = "default_color_sensitivity")]
    pub color_sensitivity: f64,

    /// Six integers: lower H, S, V then upper H, S, V
    #[serde(default)]
    pub color_band: Option<[u8; 6]>,

    #[serde(default = "default_save_annotated")]
    pub save_annotated: bool,

    #[serde(default = "default_write_grain_csv")]
    pub write_grain_csv: bool,
}

fn default_input_path() -> String {
    "./input".to_string()
}

fn default_output_base_dir() -> String {
    "./output".to_string()
}

fn default_parallel() -> bool {
    true
}

fn default_separation_sensitivity() -> f64 {
    DEFAULT_SEPARATION_SENSITIVITY
}

fn default_color_sensitivity() -> f64 {
    DEFAULT_COLOR_SENSITIVITY
}

fn default_save_annotated() -> bool {
    true
}

fn default_write_grain_csv() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GraderError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content).map_err(|source| GraderError::ConfigLoad {
            source,
            path: path.to_path_buf(),
        })?;

        Ok(config)
    }

    /// Load the file when it exists, otherwise fall back to defaults
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            log::warn!("Config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Create default configuration
    pub fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_base_dir: default_output_base_dir(),
            use_parallel: true,
            variant: Variant::Accurate,
            separation_mode: None,
            separation_sensitivity: DEFAULT_SEPARATION_SENSITIVITY,
            color_sensitivity: DEFAULT_COLOR_SENSITIVITY,
            color_band: None,
            save_annotated: true,
            write_grain_csv: true,
        }
    }

    /// Validate the tunables; does not touch the filesystem
    pub fn validate_settings(&self) -> Result<()> {
        self.settings()?.validate()?;
        self.pipeline_spec().validate()
    }

    /// Validate configuration, including the input path, and create the output directory
    pub fn validate(&self) -> Result<()> {
        // Check input path exists
        let input_path = PathBuf::from(&self.input_path);
        if !input_path.exists() {
            return Err(GraderError::InvalidPath(input_path));
        }

        self.validate_settings()?;

        fs::create_dir_all(&self.output_base_dir)?;

        Ok(())
    }

    /// Pipeline structure from the variant preset and the optional separation override
    pub fn pipeline_spec(&self) -> PipelineSpec {
        let mut spec = PipelineSpec::for_variant(self.variant);
        if let Some(mode) = self.separation_mode {
            spec.separation = mode;
        }
        spec
    }

    /// Per-pass settings
    pub fn settings(&self) -> Result<Settings> {
        let color_band = match self.color_band {
            Some(values) => Some(ColorBand::from_values(values)?),
            None => None,
        };

        Ok(Settings {
            separation_sensitivity: self.separation_sensitivity,
            color_sensitivity: self.color_sensitivity,
            color_band,
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            GraderError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }
}
