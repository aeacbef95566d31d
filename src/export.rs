//! Export orchestrator — the explicit, full-fidelity render.
//!
//! Export reads the same parameters as the preview but carries the real output
//! format, the crop region and the rotation. It is not tracked by the preview
//! generation scheme: every export runs to completion and several may run at
//! once.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::params::{FillMode, OutputFormat, TransformParameters};
use crate::process::{ImageProcessor, ProcessError, ProcessRequest};
use crate::source::SourceImage;

pub const EXPORT_FILE_STEM: &str = "processed-image";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no source image loaded")]
    NoSource,

    #[error("width and height must be positive")]
    InvalidDimensions,

    #[error("preview engine is no longer running")]
    EngineClosed,

    #[error("export failed after {elapsed:?} ({attempted_bytes} bytes uploaded)")]
    Failed {
        elapsed: Duration,
        attempted_bytes: usize,
        source: ProcessError,
    },
}

/// A finished export ready to be saved.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Bytes,
    pub format: OutputFormat,
    pub byte_size: usize,
    pub elapsed: Duration,
}

impl ExportArtifact {
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// `processed-image.<ext>`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{EXPORT_FILE_STEM}.{}", self.extension())
    }

    /// Write the artifact into `dir` under [`ExportArtifact::file_name`].
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be written.
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name());
        tokio::fs::write(&path, &self.bytes).await?;
        info!(path = %path.display(), byte_size = self.byte_size, "export written");
        Ok(path)
    }
}

/// Build the full export request.
///
/// # Errors
///
/// Returns [`ExportError::InvalidDimensions`] unless width and height are finite and positive.
pub fn build_export_request(
    params: &TransformParameters,
    source: &Arc<SourceImage>,
) -> Result<ProcessRequest, ExportError> {
    if !params.has_positive_dimensions() {
        return Err(ExportError::InvalidDimensions);
    }
    let (Some(width), Some(height)) = (params.width, params.height) else {
        return Err(ExportError::InvalidDimensions);
    };

    let rotation = params.normalized_rotation();
    Ok(ProcessRequest {
        image: Arc::clone(source),
        width,
        height,
        unit: params.unit,
        mode: params.mode,
        is_preview: false,
        format: params.format,
        quality: params.quality,
        background_color: (params.mode == FillMode::Color).then(|| params.background_color.clone()),
        max_size_kb: params.max_size_kb,
        resolution_mode: params.resolution_mode,
        dpi: params.dpi,
        crop: params.effective_crop(),
        rotate: (rotation != 0).then_some(rotation),
    })
}

/// Run one export against the processor.
///
/// # Errors
///
/// - [`ExportError::NoSource`] when no source is loaded
/// - [`ExportError::InvalidDimensions`] for non-positive dimensions
/// - [`ExportError::Failed`] when the processing call fails
pub async fn export_image(
    processor: &dyn ImageProcessor,
    params: &TransformParameters,
    source: Option<&Arc<SourceImage>>,
) -> Result<ExportArtifact, ExportError> {
    let source = source.ok_or(ExportError::NoSource)?;
    let request = build_export_request(params, source)?;
    let format = request.format;
    let attempted_bytes = source.byte_size();

    info!(%format, attempted_bytes, crop = request.crop.is_some(), rotate = ?request.rotate, "export started");
    let started = Instant::now();
    match processor.process(request).await {
        Ok(bytes) => {
            let elapsed = started.elapsed();
            let byte_size = bytes.len();
            info!(%format, byte_size, ?elapsed, "export finished");
            Ok(ExportArtifact { bytes, format, byte_size, elapsed })
        }
        Err(source) => {
            let elapsed = started.elapsed();
            warn!(error = %source, attempted_bytes, ?elapsed, "export failed");
            Err(ExportError::Failed { elapsed, attempted_bytes, source })
        }
    }
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
