use std::{fs, path::Path};

use image::GenericImageView;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    BatchReport, FailedFile, SynthesisConfig, SynthesisRecord,
    error::{Result, SynthesisError},
    synthesis::{
        compositor::ShadowCompositor,
        mask::{MaskLibrary, list_files},
        seeding::rng_for_file,
    },
};

pub struct DatasetSynthesizer {
    config: SynthesisConfig,
    library: MaskLibrary,
    compositor: ShadowCompositor,
}

impl DatasetSynthesizer {
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        config.validate()?;
        let compositor = ShadowCompositor::new(config.shadow_intensity_range)?;
        let library = MaskLibrary::open(&config.shadow_mask_library_dir)?;

        Ok(Self {
            config,
            library,
            compositor,
        })
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn library(&self) -> &MaskLibrary {
        &self.library
    }

    pub fn prepare_output_dirs(&self) -> Result<()> {
        for dir in self.config.output_dirs() {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn documents(&self) -> Result<Vec<String>> {
        list_files(&self.config.shadow_free_images_dir)
    }

    pub fn run(&self) -> Result<BatchReport> {
        self.prepare_output_dirs()?;
        let documents = self.documents()?;
        let range = self.compositor.range();

        log::info!(
            "Starting to process {} shadow-free document images...",
            documents.len()
        );
        log::info!("Shadow intensity range: {:.2} - {:.2}", range.low, range.high);
        log::info!(
            "Output directory: {}",
            self.config.output_shadow_images_dir.display()
        );

        let outcomes: Vec<(String, Result<SynthesisRecord>)> = if self.config.parallel {
            match self.config.threads {
                Some(threads) => rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?
                    .install(|| self.process_parallel(&documents)),
                None => self.process_parallel(&documents),
            }
        } else {
            documents
                .iter()
                .map(|name| (name.clone(), self.process_file(name)))
                .collect()
        };

        let mut report = BatchReport::default();
        for (file_name, outcome) in outcomes {
            match outcome {
                Ok(record) => report.records.push(record),
                Err(e) => {
                    log::error!("Failed to synthesize {}: {}", file_name, e);
                    report.failures.push(FailedFile {
                        file_name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "Data processing completed: {} generated, {} failed",
            report.records.len(),
            report.failures.len()
        );

        Ok(report)
    }

    fn process_parallel(&self, documents: &[String]) -> Vec<(String, Result<SynthesisRecord>)> {
        documents
            .par_iter()
            .map(|name| (name.clone(), self.process_file(name)))
            .collect()
    }

    pub fn process_file(&self, file_name: &str) -> Result<SynthesisRecord> {
        let mut rng = rng_for_file(self.config.seed, file_name);

        let document_path = self.config.shadow_free_images_dir.join(file_name);
        let document = open_image(&document_path)?;
        let (width, height) = document.dimensions();

        let resized = self.library.select_and_resize(
            file_name,
            (width, height),
            &self.config.output_shadow_masks_dir,
            &mut rng,
        )?;

        log::info!(
            "Processing: {} | Using mask: {} | Saved to: {}",
            file_name,
            resized.mask_file,
            resized.saved_to.display()
        );

        // Composite from the mask as persisted, so lossy formats match the dataset on disk.
        let mask = open_image(&resized.saved_to)?;
        let result = self
            .compositor
            .composite_random(&document.to_rgb8(), &mask, &mut rng)?;

        save_rgb(
            &result.shadowed,
            &self.config.output_shadow_images_dir.join(file_name),
        )?;
        save_rgb(
            &result.adjusted_mask,
            &self.config.output_adjusted_masks_dir.join(file_name),
        )?;

        Ok(SynthesisRecord {
            file_name: file_name.to_string(),
            mask_file: resized.mask_file,
            intensity: result.intensity,
            width,
            height,
        })
    }
}

fn open_image(path: &Path) -> Result<image::DynamicImage> {
    image::open(path).map_err(|source| SynthesisError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn save_rgb(image: &image::RgbImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|source| SynthesisError::Encode {
        path: path.to_path_buf(),
        source,
    })
}
