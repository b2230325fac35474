//! Chart Palette
//! Colours handed to both renderers; configured as hex strings.

use egui::Color32;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#RRGGBB` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_color32(self) -> Color32 {
        Color32::from_rgb(self.0, self.1, self.2)
    }

    pub fn to_plotters(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }

    /// Black or white, whichever reads better on this colour.
    pub fn contrasting_text(self) -> Self {
        let luma = 0.299 * self.0 as f32 + 0.587 * self.1 as f32 + 0.114 * self.2 as f32;
        if luma > 150.0 {
            Self(0, 0, 0)
        } else {
            Self(255, 255, 255)
        }
    }
}

const FALLBACK: Rgb = Rgb(96, 125, 139);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Category bar colour.
    pub bar: String,
    /// Time-series line colour.
    pub line: String,
    pub scatter: String,
    /// Country donut slices, cycled.
    pub slices: Vec<String>,
    /// Treemap sub-category colours, cycled.
    pub treemap: Vec<String>,
}

impl Default for Palette {
    fn default() -> Self {
        let hex = |colors: &[&str]| colors.iter().map(|c| c.to_string()).collect();
        Self {
            bar: "#008000".to_string(),
            line: "#FF0000".to_string(),
            scatter: "#1F77B4".to_string(),
            slices: hex(&[
                "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692",
                "#B6E880", "#FF97FF", "#FECB52",
            ]),
            treemap: hex(&[
                "#FF5733", "#FFC300", "#DAF7A6", "#C70039", "#FF5733", "#FFC300", "#DAF7A6",
                "#C70039",
            ]),
        }
    }
}

impl Palette {
    pub fn bar_color(&self) -> Rgb {
        Rgb::from_hex(&self.bar).unwrap_or(FALLBACK)
    }

    pub fn line_color(&self) -> Rgb {
        Rgb::from_hex(&self.line).unwrap_or(FALLBACK)
    }

    pub fn scatter_color(&self) -> Rgb {
        Rgb::from_hex(&self.scatter).unwrap_or(FALLBACK)
    }

    pub fn slice_color(&self, index: usize) -> Rgb {
        Self::cycle(&self.slices, index)
    }

    pub fn treemap_color(&self, index: usize) -> Rgb {
        Self::cycle(&self.treemap, index)
    }

    fn cycle(colors: &[String], index: usize) -> Rgb {
        if colors.is_empty() {
            return FALLBACK;
        }
        Rgb::from_hex(&colors[index % colors.len()]).unwrap_or(FALLBACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colours() {
        assert_eq!(Rgb::from_hex("#FF5733"), Some(Rgb(255, 87, 51)));
        assert_eq!(Rgb::from_hex("c70039"), Some(Rgb(199, 0, 57)));
        assert_eq!(Rgb::from_hex("#FFF"), None);
        assert_eq!(Rgb::from_hex("#GGGGGG"), None);
    }

    #[test]
    fn colours_cycle_and_fall_back() {
        let palette = Palette::default();
        assert_eq!(palette.treemap_color(0), palette.treemap_color(8));

        let broken = Palette {
            bar: "green".to_string(),
            slices: Vec::new(),
            ..Palette::default()
        };
        assert_eq!(broken.bar_color(), FALLBACK);
        assert_eq!(broken.slice_color(3), FALLBACK);
    }

    #[test]
    fn text_contrasts_with_fill() {
        assert_eq!(Rgb(255, 195, 0).contrasting_text(), Rgb(0, 0, 0));
        assert_eq!(Rgb(199, 0, 57).contrasting_text(), Rgb(255, 255, 255));
    }
}
