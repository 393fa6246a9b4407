//! cosmic-text rasterizer: real fonts, shaped per character and rendered with swash.

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache, SwashContent};
use text_nodes::{AtlasRasterizer, FontOptions, GlyphInfo};

use crate::{compose, GlyphCell};

/// Line height relative to the font size.
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Rasterizes glyphs from system fonts.
///
/// Owns the cosmic-text font database and swash cache so repeated atlas regenerations reuse
/// loaded faces and cached outlines.
pub struct CosmicRasterizer {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl CosmicRasterizer {
    /// Loads the system font database. This can take a while on the first call.
    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new())
    }

    pub fn with_font_system(font_system: FontSystem) -> Self {
        Self {
            font_system,
            swash_cache: SwashCache::new(),
        }
    }

    fn render_cell(&mut self, options: &FontOptions, ch: char) -> Option<GlyphCell> {
        if ch.is_control() {
            return None;
        }

        let px = options.raster_px().max(1.0);
        let metrics = Metrics::new(px, (px * LINE_HEIGHT_FACTOR).ceil());
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(
            &mut self.font_system,
            Some(f32::MAX),
            Some(metrics.line_height),
        );

        let attrs = Attrs::new().family(Family::Name(&options.family));
        let mut text = [0u8; 4];
        buffer.set_text(
            &mut self.font_system,
            ch.encode_utf8(&mut text),
            &attrs,
            Shaping::Advanced,
            None,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        let run = buffer.layout_runs().next()?;
        if run.glyphs.is_empty() {
            log::debug!("no font provides a glyph for {ch:?}");
            return None;
        }

        let width = run.line_w.ceil().max(1.0) as u32;
        let height = metrics.line_height as u32;
        let mut cell = GlyphCell::blank(ch, width, height);

        for glyph in run.glyphs.iter() {
            let physical = glyph.physical((0.0, 0.0), 1.0);
            let Some(image) = self
                .swash_cache
                .get_image(&mut self.font_system, physical.cache_key)
                .clone()
            else {
                // Whitespace has no bitmap, only an advance.
                continue;
            };
            if image.content != SwashContent::Mask {
                log::debug!("skipping non-mask glyph image for {ch:?}");
                continue;
            }

            // Swash places the bitmap relative to the baseline, top measured upward.
            let x = physical.x + image.placement.left;
            let y = run.line_y as i32 + physical.y - image.placement.top;
            cell.blit(
                x,
                y,
                image.placement.width,
                image.placement.height,
                &image.data,
            );
        }

        Some(cell)
    }
}

impl Default for CosmicRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl AtlasRasterizer for CosmicRasterizer {
    fn rasterize(&mut self, options: &FontOptions, chars: &[char]) -> GlyphInfo {
        let cells = chars
            .iter()
            .filter_map(|ch| self.render_cell(options, *ch))
            .collect();
        compose(options, cells)
    }
}
