use std::path::{Path, PathBuf};

use image::ImageFormat;
use tokio::fs;
use tracing::{info, warn};

use crate::config::UploadsConfig;
use crate::constants::PLACEHOLDER_IMAGE;

/// One file from a multipart request, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Unsupported image type for {0}: only JPEG, PNG and WebP are accepted")]
    UnsupportedType(String),

    #[error("File {0} is not a valid image")]
    CorruptImage(String),

    #[error("File {name} exceeds the {limit_bytes} byte limit")]
    TooLarge { name: String, limit_bytes: u64 },

    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Validates and persists uploaded product images.
pub struct UploadService {
    uploads_path: PathBuf,
    max_bytes: u64,
}

impl UploadService {
    #[must_use]
    pub fn new(config: &UploadsConfig) -> Self {
        Self {
            uploads_path: PathBuf::from(&config.uploads_path),
            max_bytes: config.max_image_bytes,
        }
    }

    /// Validate and store a batch of images. All files are validated before
    /// any is written; a write failure removes files already written, so a
    /// failed batch leaves no partial state on disk.
    ///
    /// Returns the stored filenames in input order.
    pub async fn store_batch(&self, files: &[UploadedFile]) -> Result<Vec<String>, UploadError> {
        let mut planned = Vec::with_capacity(files.len());

        for file in files {
            let format = self.validate(file)?;
            planned.push(format!(
                "{}.{}",
                uuid::Uuid::new_v4(),
                extension_for(format)
            ));
        }

        if !planned.is_empty() && !self.uploads_path.exists() {
            fs::create_dir_all(&self.uploads_path).await?;
        }

        let mut written: Vec<PathBuf> = Vec::with_capacity(planned.len());
        for (file, name) in files.iter().zip(&planned) {
            let dest = self.uploads_path.join(name);
            if let Err(e) = fs::write(&dest, &file.bytes).await {
                for path in &written {
                    let _ = fs::remove_file(path).await;
                }
                return Err(e.into());
            }
            written.push(dest);
        }

        info!(count = planned.len(), "Stored uploaded images");
        Ok(planned)
    }

    fn validate(&self, file: &UploadedFile) -> Result<ImageFormat, UploadError> {
        let name = &file.original_name;

        if name.contains('\0') || name.contains("..") {
            return Err(UploadError::InvalidName(name.clone()));
        }

        if file.bytes.len() as u64 > self.max_bytes {
            return Err(UploadError::TooLarge {
                name: name.clone(),
                limit_bytes: self.max_bytes,
            });
        }

        // Sniff from content; the client-supplied type and extension are
        // never trusted.
        let format = image::guess_format(&file.bytes)
            .map_err(|_| UploadError::UnsupportedType(name.clone()))?;

        if !matches!(
            format,
            ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP
        ) {
            return Err(UploadError::UnsupportedType(name.clone()));
        }

        image::load_from_memory_with_format(&file.bytes, format)
            .map_err(|_| UploadError::CorruptImage(name.clone()))?;

        Ok(format)
    }

    /// Best-effort removal of a product's stored images. The shared
    /// placeholder is never unlinked and failures are only logged.
    pub async fn delete_images(&self, joined: &str) {
        for name in split_images(joined) {
            if name == PLACEHOLDER_IMAGE {
                continue;
            }

            let path = self.uploads_path.join(&name);
            if let Err(e) = fs::remove_file(&path).await {
                warn!(file = %path.display(), error = %e, "Failed to remove product image");
            }
        }
    }

    #[must_use]
    pub fn uploads_path(&self) -> &Path {
        &self.uploads_path
    }
}

const fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        _ => "jpg",
    }
}

/// Split a comma-joined image column into filenames, dropping empties.
#[must_use]
pub fn split_images(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Join the final image list for storage, falling back to the placeholder
/// sentinel when empty, and clamp the requested main-image index into range.
#[must_use]
pub fn finalize_images(images: Vec<String>, requested_main: i64) -> (String, i32) {
    if images.is_empty() {
        return (PLACEHOLDER_IMAGE.to_string(), 0);
    }

    let max_index = (images.len() - 1) as i64;
    let main = requested_main.clamp(0, max_index) as i32;
    (images.join(","), main)
}
