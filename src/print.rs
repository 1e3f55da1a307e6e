//! Print Geometry and Export Presets
//!
//! Fixed page setup for the output document and the named preset used for
//! the print export.

use serde::{Deserialize, Serialize};

use crate::fonts::FontSource;

/// Millimetres to PDF points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page setup of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub facing_pages: bool,
    pub orientation: Orientation,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4_magazine()
    }
}

impl PageGeometry {
    /// A4 portrait with facing pages, the magazine default.
    pub fn a4_magazine() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            facing_pages: true,
            orientation: Orientation::Portrait,
        }
    }

    /// Page size in points, with orientation applied.
    pub fn size_pt(&self) -> (f64, f64) {
        let (short, long) = if self.width_mm <= self.height_mm {
            (self.width_mm, self.height_mm)
        } else {
            (self.height_mm, self.width_mm)
        };
        match self.orientation {
            Orientation::Portrait => (mm_to_pt(short), mm_to_pt(long)),
            Orientation::Landscape => (mm_to_pt(long), mm_to_pt(short)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
}

/// Named export preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPreset {
    pub name: String,
    pub format: ExportFormat,
    pub compress: bool,
    /// Embedded for text; the standard Helvetica when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontSource>,
}

pub const HIGH_QUALITY_PRINT: &str = "[High Quality Print]";

impl Default for ExportPreset {
    fn default() -> Self {
        Self::high_quality_print()
    }
}

impl ExportPreset {
    pub fn high_quality_print() -> Self {
        Self {
            name: HIGH_QUALITY_PRINT.to_string(),
            format: ExportFormat::Pdf,
            compress: true,
            font: None,
        }
    }

    pub fn with_font(mut self, font: FontSource) -> Self {
        self.font = Some(font);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_portrait_in_points() {
        let (w, h) = PageGeometry::a4_magazine().size_pt();
        assert!((w - 595.28).abs() < 0.01);
        assert!((h - 841.89).abs() < 0.01);
    }

    #[test]
    fn landscape_swaps_sides() {
        let geometry = PageGeometry {
            orientation: Orientation::Landscape,
            ..PageGeometry::a4_magazine()
        };
        let (w, h) = geometry.size_pt();
        assert!(w > h);
    }
}
