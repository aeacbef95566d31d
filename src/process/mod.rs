//! Processing service client — the `POST /process` endpoint both the preview
//! and export paths call.
//!
//! DESIGN
//! ======
//! `ImageProcessor` is the seam: the engine only ever talks to
//! `Arc<dyn ImageProcessor>`, so tests substitute a mock the same way the
//! HTTP implementation is substituted in production. `ProcessRequest` is the
//! typed form body; `form_fields` renders it to the wire field list, which is
//! where optional-field rules (background color only in color mode, crop and
//! rotate only when present) are enforced.

pub mod config;
pub mod http;

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use crate::params::{CropRegion, FillMode, OutputFormat, ResolutionMode};
use crate::source::SourceImage;
use crate::units::Unit;

pub use config::ProcessorConfig;
pub use http::HttpProcessor;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by a processing call.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response (connect, timeout, body read).
    #[error("processing request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("processing failed (status {status}): {message}")]
    Server { status: u16, message: String },
}

/// Extract a human-readable message from an error response body.
///
/// JSON with an `error` or `message` string yields that string, other JSON
/// yields its compact text, and anything else is returned as raw text.
#[must_use]
pub fn describe_error_payload(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(text) = value.get(key).and_then(serde_json::Value::as_str) {
                return text.to_string();
            }
        }
        return value.to_string();
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() { "empty error response".to_string() } else { text }
}

// =============================================================================
// REQUEST
// =============================================================================

/// Typed body of one `POST /process` call.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub image: Arc<SourceImage>,
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
    pub mode: FillMode,
    pub is_preview: bool,
    pub format: OutputFormat,
    pub quality: u8,
    pub background_color: Option<String>,
    pub max_size_kb: Option<u32>,
    pub resolution_mode: ResolutionMode,
    pub dpi: u32,
    pub crop: Option<CropRegion>,
    pub rotate: Option<i32>,
}

#[derive(Serialize)]
struct CropWire {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    unit: &'static str,
}

impl From<CropRegion> for CropWire {
    fn from(c: CropRegion) -> Self {
        Self { x: c.x, y: c.y, width: c.width, height: c.height, unit: "%" }
    }
}

impl ProcessRequest {
    /// Text fields of the multipart body, in wire order. The `image` part is separate.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("unit", self.unit.to_string()),
            ("mode", self.mode.to_string()),
        ];
        if self.is_preview {
            fields.push(("isPreview", "true".to_string()));
        }
        fields.push(("format", self.format.to_string()));
        fields.push(("quality", self.quality.to_string()));
        if let Some(color) = &self.background_color {
            fields.push(("backgroundColor", color.clone()));
        }
        if let Some(kb) = self.max_size_kb {
            fields.push(("maxSizeKB", kb.to_string()));
        }
        fields.push(("resolutionMode", self.resolution_mode.to_string()));
        fields.push(("dpi", self.dpi.to_string()));
        if let Some(crop) = self.crop {
            // Four floats and a static str; serialization cannot fail.
            let json = serde_json::to_string(&CropWire::from(crop)).unwrap_or_default();
            fields.push(("crop", json));
        }
        if let Some(degrees) = self.rotate {
            fields.push(("rotate", degrees.to_string()));
        }
        fields
    }

    /// Value of a rendered form field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        self.form_fields()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

// =============================================================================
// PROCESSOR TRAIT
// =============================================================================

/// Provider-neutral async seam for the processing endpoint. Enables mocking in tests.
#[async_trait::async_trait]
pub trait ImageProcessor: Send + Sync {
    /// Submit one request and return the response payload.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] if the request fails or the service reports
    /// an error.
    async fn process(&self, request: ProcessRequest) -> Result<Bytes, ProcessError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

// =============================================================================
// TEST HELPERS
// =============================================================================
