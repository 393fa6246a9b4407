//! Packing rendered glyph cells into one RGBA atlas surface.

use std::collections::HashMap;

use text_nodes::{rgb_bytes, AtlasSurface, FontOptions, GlyphInfo};

use crate::ShelfPacker;

/// Transparent border kept around every cell in the atlas.
pub const CELL_PADDING: u32 = 1;
/// Upper bound for the atlas width; wider cells are dropped.
pub const MAX_ATLAS_WIDTH: u32 = 8192;
/// Upper bound for the atlas height, matching the default wgpu 2D texture limit. Cells that
/// no longer fit are dropped and render as empty quads.
pub const MAX_ATLAS_HEIGHT: u32 = 8192;

/// One character rendered into its layout box: `width` is the advance, `height` the line
/// height. `coverage` is row-major, one byte per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphCell {
    pub ch: char,
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

impl GlyphCell {
    pub fn blank(ch: char, width: u32, height: u32) -> Self {
        Self {
            ch,
            width,
            height,
            coverage: vec![0; (width * height) as usize],
        }
    }

    /// Adds a `width` x `height` coverage mask with its top-left corner at `(x, y)`.
    /// Parts falling outside the cell are clipped.
    pub fn blit(&mut self, x: i32, y: i32, width: u32, height: u32, mask: &[u8]) {
        for row in 0..height as i32 {
            let cy = y + row;
            if cy < 0 || cy >= self.height as i32 {
                continue;
            }
            for col in 0..width as i32 {
                let cx = x + col;
                if cx < 0 || cx >= self.width as i32 {
                    continue;
                }
                let Some(&value) = mask.get((row * width as i32 + col) as usize) else {
                    continue;
                };
                let idx = (cy as u32 * self.width + cx as u32) as usize;
                self.coverage[idx] = self.coverage[idx].saturating_add(value);
            }
        }
    }

    #[inline]
    pub fn coverage_at(&self, x: u32, y: u32) -> u8 {
        self.coverage[(y * self.width + x) as usize]
    }
}

/// Packs `cells` into a surface filled with the background color and paints each glyph with
/// the foreground color, blended by coverage.
pub fn compose(options: &FontOptions, cells: Vec<GlyphCell>) -> GlyphInfo {
    compose_within(options, cells, MAX_ATLAS_WIDTH, MAX_ATLAS_HEIGHT)
}

fn compose_within(
    options: &FontOptions,
    cells: Vec<GlyphCell>,
    max_width: u32,
    max_height: u32,
) -> GlyphInfo {
    if cells.is_empty() {
        return GlyphInfo::default();
    }

    let width = atlas_width(&cells, max_width);
    let mut packer = ShelfPacker::new(width, CELL_PADDING).with_max_height(max_height);
    let mut placed = Vec::with_capacity(cells.len());
    for cell in cells {
        match packer.insert(cell.width, cell.height) {
            Some(rect) => placed.push((cell, rect)),
            None => log::warn!(
                "glyph {:?} ({}x{}px) does not fit a {}x{}px atlas; dropping it",
                cell.ch,
                cell.width,
                cell.height,
                width,
                max_height
            ),
        }
    }

    let height = packer.height().max(1);
    let background = rgb_bytes(options.background);
    let foreground = rgb_bytes(options.foreground);
    let mut surface = AtlasSurface::filled(width, height, background);

    let mut metrics = HashMap::with_capacity(placed.len());
    for (cell, rect) in placed {
        for y in 0..cell.height {
            for x in 0..cell.width {
                let coverage = cell.coverage_at(x, y);
                if coverage == 0 {
                    continue;
                }
                let idx = (((rect.y + y) * width + rect.x + x) * 4) as usize;
                for c in 0..3 {
                    surface.pixels[idx + c] = blend(background[c], foreground[c], coverage);
                }
            }
        }
        metrics.insert(cell.ch, rect);
    }

    log::debug!(
        "composed {} glyph cells into {}x{} atlas",
        metrics.len(),
        width,
        height
    );
    GlyphInfo { surface, metrics }
}

/// Power-of-two width giving a roughly square atlas, never narrower than the widest cell.
fn atlas_width(cells: &[GlyphCell], max_width: u32) -> u32 {
    let pad = CELL_PADDING * 2;
    let area: u64 = cells
        .iter()
        .map(|c| u64::from(c.width + pad) * u64::from(c.height + pad))
        .sum();
    let widest = cells.iter().map(|c| c.width + pad).max().unwrap_or(1);

    let side = (area as f64).sqrt().ceil() as u32;
    side.max(widest).next_power_of_two().min(max_width)
}

#[inline]
fn blend(background: u8, foreground: u8, coverage: u8) -> u8 {
    let c = u32::from(coverage);
    ((u32::from(background) * (255 - c) + u32::from(foreground) * c + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FontOptions {
        FontOptions::default()
            .with_colors("#fff", "#000")
            .unwrap()
    }

    fn solid(ch: char, width: u32, height: u32) -> GlyphCell {
        GlyphCell {
            ch,
            width,
            height,
            coverage: vec![255; (width * height) as usize],
        }
    }

    fn pixel(surface: &AtlasSurface, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * surface.width + x) * 4) as usize;
        [
            surface.pixels[idx],
            surface.pixels[idx + 1],
            surface.pixels[idx + 2],
            surface.pixels[idx + 3],
        ]
    }

    #[test]
    fn test_glyphs_painted_over_background() {
        let mut blank = GlyphCell::blank(' ', 4, 6);
        blank.blit(0, 0, 1, 1, &[0]);
        let info = compose(&options(), vec![solid('a', 4, 6), blank]);

        let a = info.metrics[&'a'];
        let space = info.metrics[&' '];
        assert_eq!(pixel(&info.surface, a.x, a.y), [255, 255, 255, 255]);
        assert_eq!(pixel(&info.surface, space.x, space.y), [0, 0, 0, 255]);
        // Padding stays background.
        assert_eq!(pixel(&info.surface, 0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_every_cell_gets_metrics() {
        let cells: Vec<GlyphCell> = "abcdefghij".chars().map(|c| solid(c, 7, 11)).collect();
        let info = compose(&options(), cells);

        assert_eq!(info.metrics.len(), 10);
        for m in info.metrics.values() {
            assert_eq!((m.width, m.height), (7, 11));
            assert!(m.x + m.width <= info.surface.width);
            assert!(m.y + m.height <= info.surface.height);
        }
        assert!(info.surface.width.is_power_of_two());
    }

    #[test]
    fn test_empty_set_yields_empty_surface() {
        let info = compose(&options(), Vec::new());
        assert!(info.surface.is_empty());
        assert!(info.metrics.is_empty());
    }

    #[test]
    fn test_cells_past_height_limit_are_dropped() {
        let cells: Vec<GlyphCell> = "abcdef".chars().map(|c| solid(c, 14, 14)).collect();
        // 16px cells with padding: two per 32px row, two rows under the 40px limit.
        let info = compose_within(&options(), cells, 32, 40);

        assert_eq!(info.metrics.len(), 4);
        assert!(info.surface.height <= 40);
        assert!(info.metrics.contains_key(&'a'));
        assert!(!info.metrics.contains_key(&'f'));
    }

    #[test]
    fn test_blit_clips_and_accumulates() {
        let mut cell = GlyphCell::blank('x', 3, 3);
        cell.blit(-1, -1, 2, 2, &[10, 20, 30, 40]);
        cell.blit(0, 0, 1, 1, &[250]);
        assert_eq!(cell.coverage_at(0, 0), 255);
        assert_eq!(cell.coverage_at(1, 1), 0);
    }

    #[test]
    fn test_partial_coverage_blends() {
        assert_eq!(blend(0, 255, 0), 0);
        assert_eq!(blend(0, 255, 255), 255);
        assert_eq!(blend(0, 200, 128), 100);
    }
}
