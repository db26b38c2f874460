use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{EXIT_FILES_FAILED, EXIT_SUCCESS, Result, SynthesisError};

pub mod batch;
pub mod error;
pub mod image_utils;
pub mod report;
pub mod synthesis;

pub use batch::DatasetSynthesizer;
pub use synthesis::{compositor::ShadowCompositor, mask::MaskLibrary};

// 0 darkens fully shadowed pixels to black, 1 leaves them untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityRange {
    pub low: f64,
    pub high: f64,
}

impl IntensityRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(SynthesisError::InvalidParameter(
                "Shadow intensity bounds must be finite".into(),
            ));
        }

        if self.low < 0.0 || self.high > 1.0 || self.low > self.high {
            return Err(SynthesisError::InvalidParameter(format!(
                "Shadow intensity range must satisfy 0 <= low <= high <= 1, got ({}, {})",
                self.low, self.high
            )));
        }

        Ok(())
    }
}

impl Default for IntensityRange {
    fn default() -> Self {
        Self {
            low: 0.15,
            high: 0.8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    pub shadow_mask_library_dir: PathBuf,
    pub shadow_free_images_dir: PathBuf,
    pub output_shadow_masks_dir: PathBuf,
    pub output_shadow_images_dir: PathBuf,
    pub output_adjusted_masks_dir: PathBuf,
    pub shadow_intensity_range: IntensityRange,
    pub seed: Option<u64>,
    pub parallel: bool,
    pub threads: Option<usize>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            shadow_mask_library_dir: PathBuf::from("shadows"),
            shadow_free_images_dir: PathBuf::from("shadow_free_images"),
            output_shadow_masks_dir: PathBuf::from("output/shadow_masks"),
            output_shadow_images_dir: PathBuf::from("output/shadow_images"),
            output_adjusted_masks_dir: PathBuf::from("output/adjusted_masks"),
            shadow_intensity_range: IntensityRange::default(),
            seed: None,
            parallel: false,
            threads: None,
        }
    }
}

impl SynthesisConfig {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(mask_library: P, shadow_free_images: Q) -> Self {
        Self {
            shadow_mask_library_dir: mask_library.as_ref().to_path_buf(),
            shadow_free_images_dir: shadow_free_images.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_output_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        let root = root.as_ref();
        self.output_shadow_masks_dir = root.join("shadow_masks");
        self.output_shadow_images_dir = root.join("shadow_images");
        self.output_adjusted_masks_dir = root.join("adjusted_masks");
        self
    }

    pub fn with_intensity_range(mut self, range: IntensityRange) -> Self {
        self.shadow_intensity_range = range;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self.parallel = true;
        self
    }

    // Checks parameters and input directories only; nothing is created.
    pub fn validate(&self) -> Result<()> {
        self.shadow_intensity_range.validate()?;

        if self.threads == Some(0) {
            return Err(SynthesisError::InvalidParameter(
                "Thread count must be at least 1".into(),
            ));
        }

        for (role, path) in [
            ("Shadow-free images", &self.shadow_free_images_dir),
            ("Shadow mask library", &self.shadow_mask_library_dir),
        ] {
            if !path.is_dir() {
                return Err(SynthesisError::MissingDirectory {
                    role,
                    path: path.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn output_dirs(&self) -> [&Path; 3] {
        [
            self.output_shadow_masks_dir.as_path(),
            self.output_shadow_images_dir.as_path(),
            self.output_adjusted_masks_dir.as_path(),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct CompositeResult {
    pub shadowed: RgbImage,
    pub adjusted_mask: RgbImage,
    pub intensity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SynthesisRecord {
    pub file_name: String,
    pub mask_file: String,
    pub intensity: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub records: Vec<SynthesisRecord>,
    pub failures: Vec<FailedFile>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_files(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.file_name.as_str()).collect()
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FILES_FAILED
        }
    }
}
