//! Transform parameters — the authoritative configuration for one source image.
//!
//! DESIGN
//! ======
//! `TransformParameters` is mutated one field at a time through
//! `ParameterChange`, mirroring how an editor applies single user actions.
//! `apply` is the only mutation path, so clamping (quality, dpi, size
//! budget) and unit-switch conversion live in one place. Rotation is stored
//! exactly as mutated and normalized only when read for display or
//! transmission.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::units::{self, Unit};

pub const DEFAULT_WIDTH: f64 = 1920.0;
pub const DEFAULT_HEIGHT: f64 = 1080.0;
pub const DEFAULT_QUALITY: u8 = 90;
pub const DEFAULT_DPI: u32 = 300;
pub const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFF";

// =============================================================================
// ENUM PARSING
// =============================================================================

/// A string did not name a known variant of a parameter enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.trim().to_string() }
    }
}

macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| ParseEnumError::new($kind, s))
            }
        }
    };
}

// =============================================================================
// FIELD TYPES
// =============================================================================

/// Fill strategy when the target aspect ratio differs from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    #[default]
    Stretch,
    Blur,
    Color,
}

string_enum!(FillMode, "mode", { Stretch => "stretch", Blur => "blur", Color => "color" });

/// Output encoding requested from the processing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
    Pdf,
}

string_enum!(OutputFormat, "format", { Jpeg => "jpeg", Png => "png", Webp => "webp", Pdf => "pdf" });

impl OutputFormat {
    /// Format used for the interactive preview image. PDF previews render as JPEG.
    #[must_use]
    pub fn for_preview(self) -> Self {
        match self {
            Self::Pdf => Self::Jpeg,
            other => other,
        }
    }

    /// File extension for a downloaded artifact.
    #[must_use]
    pub fn extension(self) -> &'static str {
        self.as_str()
    }
}

/// Whether DPI is derived from the active unit or fixed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    #[default]
    Auto,
    Fixed,
}

string_enum!(ResolutionMode, "resolution mode", { Auto => "auto", Fixed => "fixed" });

/// Crop region in percentages of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// A region with non-positive width or height means "no crop".
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl FromStr for CropRegion {
    type Err = ParseEnumError;

    /// Parse `x,y,width,height`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| ParseEnumError::new("crop region", s))?;
        match parts.as_slice() {
            [x, y, width, height] => Ok(Self::new(*x, *y, *width, *height)),
            _ => Err(ParseEnumError::new("crop region", s)),
        }
    }
}

/// Reduce any rotation to `[0, 360)`.
#[must_use]
pub fn normalize_rotation(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

// =============================================================================
// TRANSFORM PARAMETERS
// =============================================================================

/// The full parameter set for one editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformParameters {
    /// `None` while the field is being edited and empty.
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
    pub crop: Option<CropRegion>,
    /// Degrees as mutated; see [`TransformParameters::normalized_rotation`].
    pub rotation: i32,
}

impl Default for TransformParameters {
    fn default() -> Self {
        Self {
            width: Some(DEFAULT_WIDTH),
            height: Some(DEFAULT_HEIGHT),
            unit: Unit::Px,
            mode: FillMode::Stretch,
            format: OutputFormat::Jpeg,
            quality: DEFAULT_QUALITY,
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            max_size_kb: None,
            resolution_mode: ResolutionMode::Auto,
            dpi: DEFAULT_DPI,
            crop: None,
            rotation: 0,
        }
    }
}

/// A single user edit.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterChange {
    Width(Option<f64>),
    Height(Option<f64>),
    /// Switch the active unit, converting width and height.
    Unit(Unit),
    Mode(FillMode),
    Format(OutputFormat),
    Quality(u8),
    BackgroundColor(String),
    MaxSizeKb(Option<u32>),
    ResolutionMode(ResolutionMode),
    Dpi(u32),
    Crop(Option<CropRegion>),
    Rotation(i32),
    RotateLeft,
    RotateRight,
    /// Reset width and height to the source's natural size in the active unit.
    FitToSource { natural_width: u32, natural_height: u32 },
}

impl TransformParameters {
    /// Apply one edit.
    pub fn apply(&mut self, change: ParameterChange) {
        match change {
            ParameterChange::Width(w) => self.width = w,
            ParameterChange::Height(h) => self.height = h,
            ParameterChange::Unit(unit) => self.switch_unit(unit),
            ParameterChange::Mode(mode) => self.mode = mode,
            ParameterChange::Format(format) => self.format = format,
            ParameterChange::Quality(q) => self.quality = q.clamp(1, 100),
            ParameterChange::BackgroundColor(color) => self.background_color = color,
            ParameterChange::MaxSizeKb(kb) => self.max_size_kb = kb.filter(|kb| *kb > 0),
            ParameterChange::ResolutionMode(mode) => self.resolution_mode = mode,
            ParameterChange::Dpi(dpi) => self.dpi = dpi.max(1),
            ParameterChange::Crop(crop) => self.crop = crop,
            ParameterChange::Rotation(degrees) => self.rotation = degrees,
            ParameterChange::RotateLeft => self.rotation = (normalize_rotation(self.rotation) - 90) % 360,
            ParameterChange::RotateRight => self.rotation = (normalize_rotation(self.rotation) + 90) % 360,
            ParameterChange::FitToSource { natural_width, natural_height } => {
                let dpi = self.effective_dpi();
                let fit = |px: u32| units::round_for_unit(units::from_pixels(f64::from(px), self.unit, dpi), self.unit);
                self.width = Some(fit(natural_width));
                self.height = Some(fit(natural_height));
            }
        }
    }

    fn switch_unit(&mut self, unit: Unit) {
        let (width, height) =
            units::convert_dimensions(self.width, self.height, self.unit, unit, self.resolution_mode, self.dpi);
        self.unit = unit;
        self.width = Some(width);
        self.height = Some(height);
    }

    /// Rotation reduced to `[0, 360)`.
    #[must_use]
    pub fn normalized_rotation(&self) -> i32 {
        normalize_rotation(self.rotation)
    }

    /// `true` when both dimensions are present, finite and strictly positive.
    #[must_use]
    pub fn has_positive_dimensions(&self) -> bool {
        matches!((self.width, self.height), (Some(w), Some(h)) if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0)
    }

    /// The crop region to transmit, if it is a real sub-region.
    #[must_use]
    pub fn effective_crop(&self) -> Option<CropRegion> {
        self.crop.filter(CropRegion::is_effective)
    }

    /// Size-budget mode: the service picks quality to meet `max_size_kb`.
    #[must_use]
    pub fn quality_is_auto(&self) -> bool {
        self.max_size_kb.is_some()
    }

    /// DPI implied by the active unit and resolution mode.
    #[must_use]
    pub fn effective_dpi(&self) -> u32 {
        units::effective_dpi(self.resolution_mode, self.dpi, self.unit)
    }
}

#[cfg(test)]
#[path = "params_test.rs"]
mod tests;
