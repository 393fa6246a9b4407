//! Font configuration for the glyph atlas.

use crate::{parse_color, ColorError};

/// Options handed to the atlas rasterizer on every regeneration.
#[derive(Clone, Debug, PartialEq)]
pub struct FontOptions {
    /// Font family name. Rasterizers without font lookup ignore it.
    pub family: String,
    /// Label font size in pixels, as seen on screen.
    pub size: f32,
    /// Glyph color, packed `0xRRGGBB`.
    pub foreground: u32,
    /// Atlas background color, packed `0xRRGGBB`.
    pub background: u32,
    /// Oversampling factor. Glyphs are rasterized at `size * dpi_scale` pixels and the geometry
    /// builder scales them back down by `1 / dpi_scale`. Values below 1 are treated as 1.
    pub dpi_scale: f32,
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            family: "Verdana".to_string(),
            size: 10.0,
            foreground: 0xffffff,
            background: crate::DEFAULT_COLOR,
            dpi_scale: 10.0,
        }
    }
}

impl FontOptions {
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_dpi_scale(mut self, dpi_scale: f32) -> Self {
        self.dpi_scale = dpi_scale.max(1.0);
        self
    }

    /// Sets foreground and background from hex strings (`#rgb`, `#rrggbb`, `#rrggbbaa`).
    pub fn with_colors(mut self, foreground: &str, background: &str) -> Result<Self, ColorError> {
        self.foreground = parse_color(Some(foreground))?;
        self.background = parse_color(Some(background))?;
        Ok(self)
    }

    /// Pixel size glyphs are rasterized at.
    #[inline]
    pub fn raster_px(&self) -> f32 {
        self.size * self.oversampling()
    }

    /// Factor converting atlas pixels into label units.
    #[inline]
    pub fn geometry_scale(&self) -> f32 {
        1.0 / self.oversampling()
    }

    #[inline]
    fn oversampling(&self) -> f32 {
        self.dpi_scale.max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_font() {
        let options = FontOptions::default();
        assert_eq!(options.family, "Verdana");
        assert_eq!(options.raster_px(), 100.0);
        assert_eq!(options.geometry_scale(), 0.1);
        assert_eq!(options.background, 0x009ee8);
    }

    #[test]
    fn test_raster_and_geometry_scale_agree_below_one() {
        let options = FontOptions {
            dpi_scale: 0.5,
            ..FontOptions::default()
        };
        assert_eq!(options.raster_px(), options.size);
        assert_eq!(options.raster_px() * options.geometry_scale(), options.size);
    }

    #[test]
    fn test_with_colors_propagates_parse_errors() {
        let options = FontOptions::default().with_colors("#000", "#fff").unwrap();
        assert_eq!(options.foreground, 0x000000);
        assert_eq!(options.background, 0xffffff);

        assert!(FontOptions::default().with_colors("black", "#fff").is_err());
    }
}
