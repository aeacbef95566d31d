//! Source image intake — validate uploaded bytes and read their dimensions.
//!
//! Only JPEG, PNG, WebP and GIF are accepted, up to a configurable size
//! (4 MiB by default). Dimensions come from the image header; the pixels are
//! never decoded here since the processing service does the real work.

use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use image::{ImageFormat, ImageReader};
use tracing::info;

pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 4 * 1024 * 1024;

const ACCEPTED_FORMATS: [ImageFormat; 4] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP, ImageFormat::Gif];

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("unsupported image format (expected JPEG, PNG, WebP or GIF)")]
    UnsupportedFormat,
    #[error("image is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("could not read image dimensions: {0}")]
    Dimensions(String),
    #[error("could not read image file: {0}")]
    Io(#[from] std::io::Error),
}

/// An accepted source image. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct SourceImage {
    bytes: Bytes,
    name: String,
    mime_type: &'static str,
    natural_width: u32,
    natural_height: u32,
}

impl SourceImage {
    /// Validate `bytes` and read the image header.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the payload is too large, not one of the
    /// accepted formats, or its header cannot be read.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Bytes>, max_bytes: u64) -> Result<Self, SourceError> {
        let bytes = bytes.into();
        let name = name.into();

        let size = bytes.len() as u64;
        if size > max_bytes {
            return Err(SourceError::TooLarge { size, limit: max_bytes });
        }

        let format = image::guess_format(&bytes).map_err(|_| SourceError::UnsupportedFormat)?;
        if !ACCEPTED_FORMATS.contains(&format) {
            return Err(SourceError::UnsupportedFormat);
        }

        let (natural_width, natural_height) = ImageReader::with_format(Cursor::new(&bytes[..]), format)
            .into_dimensions()
            .map_err(|e| SourceError::Dimensions(e.to_string()))?;

        info!(%name, size, natural_width, natural_height, format = ?format, "source image accepted");

        Ok(Self { bytes, name, mime_type: format.to_mime_type(), natural_width, natural_height })
    }

    /// Read and validate an image file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the file cannot be read, otherwise as
    /// [`SourceImage::from_bytes`].
    pub async fn from_path(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await?.len();
        if size > max_bytes {
            return Err(SourceError::TooLarge { size, limit: max_bytes });
        }
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
        Self::from_bytes(name, bytes, max_bytes)
    }

    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn natural_width(&self) -> u32 {
        self.natural_width
    }

    #[must_use]
    pub fn natural_height(&self) -> u32 {
        self.natural_height
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
