//! Unit converter — pixel ↔ physical unit conversion at a given DPI.
//!
//! DESIGN
//! ======
//! Pure functions, no state. Conversions stay unrounded internally; only the
//! value that lands back in the parameter store is rounded (pixels to whole
//! numbers, physical units to two decimals). Switching the active unit
//! re-derives DPI for both the outgoing and the incoming unit from the
//! current resolution mode rather than remembering the DPI the values were
//! entered at.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::params::{ParseEnumError, ResolutionMode};

/// DPI used in `auto` resolution mode for physical units.
pub const PRINT_DPI: u32 = 300;
/// DPI used in `auto` resolution mode for pixel units.
pub const SCREEN_DPI: u32 = 96;

const CM_PER_INCH: f64 = 2.54;
const MM_PER_INCH: f64 = 25.4;

// =============================================================================
// UNIT
// =============================================================================

/// Measurement unit for target width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Px,
    In,
    Cm,
    Mm,
}

impl Unit {
    pub const ALL: [Unit; 4] = [Unit::Px, Unit::In, Unit::Cm, Unit::Mm];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::In => "in",
            Self::Cm => "cm",
            Self::Mm => "mm",
        }
    }

    /// `true` for inch, centimetre and millimetre.
    #[must_use]
    pub fn is_physical(self) -> bool {
        !matches!(self, Self::Px)
    }

    /// Length of one unit in inches, `None` for pixels.
    fn inches_per_unit(self) -> Option<f64> {
        match self {
            Self::Px => None,
            Self::In => Some(1.0),
            Self::Cm => Some(1.0 / CM_PER_INCH),
            Self::Mm => Some(1.0 / MM_PER_INCH),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError::new("unit", s))
    }
}

// =============================================================================
// CONVERSION
// =============================================================================

/// Convert a value in `unit` to pixels at `dpi`. Unrounded.
#[must_use]
pub fn to_pixels(value: f64, unit: Unit, dpi: u32) -> f64 {
    match unit.inches_per_unit() {
        None => value,
        Some(inches) => value * inches * f64::from(dpi),
    }
}

/// Convert pixels to a value in `unit` at `dpi`. Unrounded.
#[must_use]
pub fn from_pixels(pixels: f64, unit: Unit, dpi: u32) -> f64 {
    match unit.inches_per_unit() {
        None => pixels,
        Some(inches) => pixels / f64::from(dpi.max(1)) / inches,
    }
}

/// Round a value for storage in `unit`: whole pixels, or two decimals.
#[must_use]
pub fn round_for_unit(value: f64, unit: Unit) -> f64 {
    if unit.is_physical() {
        (value * 100.0).round() / 100.0
    } else {
        value.round()
    }
}

/// DPI implied by `unit` under the given resolution mode.
#[must_use]
pub fn effective_dpi(mode: ResolutionMode, dpi: u32, unit: Unit) -> u32 {
    match mode {
        ResolutionMode::Fixed => dpi,
        ResolutionMode::Auto if unit.is_physical() => PRINT_DPI,
        ResolutionMode::Auto => SCREEN_DPI,
    }
}

/// Convert a width/height pair when the active unit switches from `from` to `to`.
///
/// Empty or non-finite inputs are read as 0.
#[must_use]
pub fn convert_dimensions(
    width: Option<f64>,
    height: Option<f64>,
    from: Unit,
    to: Unit,
    mode: ResolutionMode,
    dpi: u32,
) -> (f64, f64) {
    let outgoing_dpi = effective_dpi(mode, dpi, from);
    let incoming_dpi = effective_dpi(mode, dpi, to);

    let convert = |value: Option<f64>| {
        let value = value.filter(|v| v.is_finite()).unwrap_or(0.0);
        let pixels = to_pixels(value, from, outgoing_dpi);
        round_for_unit(from_pixels(pixels, to, incoming_dpi), to)
    };

    (convert(width), convert(height))
}

/// Parse user-entered numeric text. Malformed input reads as 0.
#[must_use]
pub fn parse_number(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
#[path = "units_test.rs"]
mod tests;
