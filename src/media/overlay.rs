//! Word overlays for the subtitle track
//!
//! One [`SubtitleOverlay`] per timed word; the compositor burns them in.

use serde::{Deserialize, Serialize};

use crate::timing::WordTiming;

/// Where an overlay is anchored on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlayPosition {
    TopCenter,
    MiddleCenter,
    /// Standard subtitle position
    #[default]
    BottomCenter,
}

impl OverlayPosition {
    /// Convert to ASS alignment value (numpad style)
    #[must_use]
    pub fn to_ass_alignment(self) -> u8 {
        match self {
            Self::BottomCenter => 2,
            Self::MiddleCenter => 5,
            Self::TopCenter => 8,
        }
    }
}

/// Visual style shared by every word overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub font_name: String,
    /// Font size in canvas pixels
    pub font_size: u32,
    /// Text color (hex: RRGGBB)
    pub color: String,
    /// Stroke color (hex: RRGGBB)
    pub outline_color: String,
    /// Stroke width in canvas pixels
    pub outline_width: f32,
    pub bold: bool,
    /// Vertical distance from the anchored edge
    pub margin: u32,
    pub position: OverlayPosition,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 60,
            color: "FFFFFF".to_string(),
            outline_color: "000000".to_string(),
            outline_width: 3.0,
            bold: true,
            margin: 50,
            position: OverlayPosition::BottomCenter,
        }
    }
}

/// One word shown on screen from `start` to `end` (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleOverlay {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Build one overlay per word, dropping words with no visible duration.
#[must_use]
pub fn overlays_from_words(words: &[WordTiming]) -> Vec<SubtitleOverlay> {
    words
        .iter()
        .filter(|w| w.end > w.start && !w.word.trim().is_empty())
        .map(|w| SubtitleOverlay {
            text: w.word.trim().to_string(),
            start: w.start,
            end: w.end,
        })
        .collect()
}

/// Convert an `RRGGBB` color to ASS `&H00BBGGRR` notation.
///
/// Malformed input falls back to white.
#[must_use]
pub fn rgb_to_ass(rgb: &str) -> String {
    let hex = rgb.trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return "&H00FFFFFF".to_string();
    }
    let (r, g, b) = (&hex[0..2], &hex[2..4], &hex[4..6]);
    format!("&H00{b}{g}{r}").to_uppercase()
}
