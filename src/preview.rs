//! Preview fetch pipeline — build the latency-optimized request and turn the
//! response into a displayable preview handle.
//!
//! The preview never carries crop or rotation, and PDF output previews as
//! JPEG. Everything else in the parameter set passes through unchanged.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::params::{FillMode, OutputFormat, TransformParameters};
use crate::process::{ImageProcessor, ProcessError, ProcessRequest};
use crate::source::SourceImage;

/// A rendered preview. Shared as `Arc<PreviewState>`; dropping the last clone
/// releases the image.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewState {
    pub image: Bytes,
    pub byte_size: usize,
    /// Generation of the request that produced this preview.
    pub generation: u64,
    pub format: OutputFormat,
}

impl PreviewState {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size_kb(&self) -> f64 {
        self.byte_size as f64 / 1024.0
    }

    /// Size for display, e.g. `"12.3 KB"`.
    #[must_use]
    pub fn size_label(&self) -> String {
        format!("{:.1} KB", self.size_kb())
    }

    /// Whether the preview meets a size budget. `None` without a budget.
    #[must_use]
    pub fn within_budget(&self, max_size_kb: Option<u32>) -> Option<bool> {
        max_size_kb.map(|kb| self.size_kb() <= f64::from(kb))
    }
}

/// Build the preview request, or `None` unless width and height are finite and positive.
#[must_use]
pub fn build_preview_request(params: &TransformParameters, source: &Arc<SourceImage>) -> Option<ProcessRequest> {
    if !params.has_positive_dimensions() {
        return None;
    }
    let (Some(width), Some(height)) = (params.width, params.height) else {
        return None;
    };

    Some(ProcessRequest {
        image: Arc::clone(source),
        width,
        height,
        unit: params.unit,
        mode: params.mode,
        is_preview: true,
        format: params.format.for_preview(),
        quality: params.quality,
        background_color: (params.mode == FillMode::Color).then(|| params.background_color.clone()),
        max_size_kb: params.max_size_kb,
        resolution_mode: params.resolution_mode,
        dpi: params.dpi,
        crop: None,
        rotate: None,
    })
}

/// Resolve one preview request against the processor.
///
/// # Errors
///
/// Propagates the processor's [`ProcessError`].
pub async fn fetch_preview(
    processor: &dyn ImageProcessor,
    request: ProcessRequest,
    generation: u64,
) -> Result<PreviewState, ProcessError> {
    let format = request.format;
    let image = processor.process(request).await?;
    let byte_size = image.len();
    info!(generation, byte_size, %format, "preview rendered");
    Ok(PreviewState { image, byte_size, generation, format })
}

#[cfg(test)]
#[path = "preview_test.rs"]
mod tests;
