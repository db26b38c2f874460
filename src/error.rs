use std::path::PathBuf;

use thiserror::Error;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FILES_FAILED: u8 = 1;
pub const EXIT_FATAL: u8 = 2;

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Configuration error: {role} directory does not exist - {}", .path.display())]
    MissingDirectory { role: &'static str, path: PathBuf },

    #[error("No image files found in the shadow mask library: {}", .0.display())]
    EmptyLibrary(PathBuf),

    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}

impl SynthesisError {
    // Errors that only concern one document and must not stop the batch.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            SynthesisError::Decode { .. }
                | SynthesisError::Encode { .. }
                | SynthesisError::ShapeMismatch(_)
        )
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_per_file() {
            EXIT_FILES_FAILED
        } else {
            EXIT_FATAL
        }
    }
}

pub type Result<T> = std::result::Result<T, SynthesisError>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_batch_fatal_errors_exit_with_fatal_code() {
        let missing = SynthesisError::MissingDirectory {
            role: "Shadow mask library",
            path: PathBuf::from("nowhere"),
        };
        assert_eq!(missing.exit_code(), EXIT_FATAL);
        assert_eq!(
            SynthesisError::EmptyLibrary(PathBuf::from("shadows")).exit_code(),
            EXIT_FATAL
        );
        assert_eq!(
            SynthesisError::InvalidParameter("threads".into()).exit_code(),
            EXIT_FATAL
        );
    }

    #[test]
    fn test_per_file_errors_exit_with_files_failed_code() {
        let err = SynthesisError::ShapeMismatch("4x4 vs 8x8".into());
        assert!(err.is_per_file());
        assert_eq!(err.exit_code(), EXIT_FILES_FAILED);
    }
}
