use std::{
    fs,
    path::{Path, PathBuf},
};

use image::{DynamicImage, GenericImageView, imageops::FilterType};
use rand::Rng;

use crate::error::{Result, SynthesisError};

#[derive(Debug, Clone)]
pub struct ResizedMask {
    pub mask_file: String,
    pub image: DynamicImage,
    pub saved_to: PathBuf,
}

pub struct MaskLibrary {
    dir: PathBuf,
    files: Vec<String>,
}

impl MaskLibrary {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let files = list_files(&dir)?;

        if files.is_empty() {
            return Err(SynthesisError::EmptyLibrary(dir));
        }

        log::debug!("Mask library {} holds {} files", dir.display(), files.len());

        Ok(Self { dir, files })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn choose<R: Rng>(&self, rng: &mut R) -> &str {
        &self.files[rng.random_range(0..self.files.len())]
    }

    pub fn resize_to(&self, mask_file: &str, width: u32, height: u32) -> Result<DynamicImage> {
        let path = self.dir.join(mask_file);
        let mask = image::open(&path).map_err(|source| SynthesisError::Decode { path, source })?;

        Ok(mask.resize_exact(width, height, FilterType::Lanczos3))
    }

    pub fn select_and_resize<R: Rng>(
        &self,
        document_file: &str,
        size: (u32, u32),
        output_dir: &Path,
        rng: &mut R,
    ) -> Result<ResizedMask> {
        let mask_file = self.choose(rng).to_string();
        let (width, height) = size;
        let image = self.resize_to(&mask_file, width, height)?;

        let saved_to = output_dir.join(document_file);
        image
            .save(&saved_to)
            .map_err(|source| SynthesisError::Encode {
                path: saved_to.clone(),
                source,
            })?;

        debug_assert_eq!(image.dimensions(), size);

        Ok(ResizedMask {
            mask_file,
            image,
            saved_to,
        })
    }
}

pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() && !entry.path().is_file() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => files.push(name),
            Err(name) => {
                log::warn!("Skipping non UTF-8 file name {:?} in {}", name, dir.display())
            }
        }
    }

    files.sort();
    Ok(files)
}
