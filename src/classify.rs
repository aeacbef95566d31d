//! Change classifier — does a parameter delta need a new preview render?
//!
//! DESIGN
//! ======
//! The preview-relevant view of the parameters is a `PreviewSnapshot`: every
//! field that changes the rendered preview, with the format already mapped
//! through the preview substitution. Crop and rotation are not part of it, so
//! dragging a crop handle or clicking rotate never re-renders the preview.
//! Snapshots are compared in their serialized form.

use serde::Serialize;

use crate::params::{FillMode, OutputFormat, ResolutionMode, TransformParameters};
use crate::units::Unit;

/// The preview-relevant subset of [`TransformParameters`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewSnapshot {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub unit: Unit,
    pub mode: FillMode,
    pub format: OutputFormat,
    pub quality: u8,
    pub background_color: String,
    pub max_size_kb: Option<u32>,
    pub resolution_mode: ResolutionMode,
    pub dpi: u32,
}

impl From<&TransformParameters> for PreviewSnapshot {
    fn from(p: &TransformParameters) -> Self {
        Self {
            width: p.width,
            height: p.height,
            unit: p.unit,
            mode: p.mode,
            format: p.format.for_preview(),
            quality: p.quality,
            background_color: p.background_color.clone(),
            max_size_kb: p.max_size_kb,
            resolution_mode: p.resolution_mode,
            dpi: p.dpi,
        }
    }
}

impl PreviewSnapshot {
    fn serialized(&self) -> String {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub relevant: bool,
}

/// Compare two snapshots. No previous snapshot is always relevant.
#[must_use]
pub fn classify(previous: Option<&PreviewSnapshot>, next: &PreviewSnapshot) -> Classification {
    let relevant = previous.is_none_or(|prev| prev.serialized() != next.serialized());
    Classification { relevant }
}

/// Remembers the last snapshot that was applied to the preview.
#[derive(Debug, Default)]
pub struct ChangeClassifier {
    last_applied: Option<PreviewSnapshot>,
}

impl ChangeClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `next` against the last applied snapshot, recording it when relevant.
    pub fn observe(&mut self, next: PreviewSnapshot) -> Classification {
        let classification = classify(self.last_applied.as_ref(), &next);
        if classification.relevant {
            self.last_applied = Some(next);
        }
        classification
    }

    #[must_use]
    pub fn last_applied(&self) -> Option<&PreviewSnapshot> {
        self.last_applied.as_ref()
    }
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
