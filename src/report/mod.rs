use std::{fs, path::Path};

use serde::Serialize;

use crate::{
    BatchReport, FailedFile, IntensityRange, SynthesisConfig, SynthesisRecord, error::Result,
};

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub total: usize,
    pub generated: usize,
    pub failed: usize,
    pub intensity_range: IntensityRange,
    pub seed: Option<u64>,
    pub outputs: OutputSection<'a>,
    pub records: &'a [SynthesisRecord],
    pub failures: &'a [FailedFile],
}

#[derive(Serialize)]
pub struct OutputSection<'a> {
    pub shadow_masks: &'a Path,
    pub shadow_images: &'a Path,
    pub adjusted_masks: &'a Path,
}

impl<'a> JsonReport<'a> {
    pub fn new(report: &'a BatchReport, config: &'a SynthesisConfig) -> Self {
        Self {
            total: report.total(),
            generated: report.records.len(),
            failed: report.failures.len(),
            intensity_range: config.shadow_intensity_range,
            seed: config.seed,
            outputs: OutputSection {
                shadow_masks: &config.output_shadow_masks_dir,
                shadow_images: &config.output_shadow_images_dir,
                adjusted_masks: &config.output_adjusted_masks_dir,
            },
            records: &report.records,
            failures: &report.failures,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
