//! Turns a label plus glyph metrics into quad vertices and glyph coordinates.

use std::collections::HashMap;

use glam::Vec2;

use crate::{GlyphMetrics, SlotData, TextNode};

/// Two triangles per character.
pub const VERTICES_PER_CHARACTER: usize = 6;
/// `x, y` for positions and `u, v` for glyph coordinates.
pub const COMPONENTS_PER_VERTEX: usize = 2;
/// Floats one character occupies in each packed buffer. Shared by the allocator and the
/// geometry builder so their strides cannot drift apart.
pub const ATTRIBUTES_PER_CHARACTER: usize = VERTICES_PER_CHARACTER * COMPONENTS_PER_VERTEX;

/// Read-only view of the atlas the geometry is built against.
#[derive(Copy, Clone, Debug)]
pub struct AtlasSnapshot<'a> {
    pub metrics: &'a HashMap<char, GlyphMetrics>,
    pub width: u32,
    pub height: u32,
    pub version: u64,
    /// Atlas pixels to label units.
    pub scale: f32,
}

impl AtlasSnapshot<'_> {
    /// Missing glyphs measure as zero so they collapse to an invisible quad.
    #[inline]
    pub fn glyph(&self, ch: char) -> GlyphMetrics {
        match self.metrics.get(&ch) {
            Some(g) => *g,
            None => {
                log::trace!("no glyph metrics for {ch:?}; emitting an empty quad");
                GlyphMetrics::default()
            }
        }
    }
}

/// Per-label geometry writer bound to one atlas snapshot.
pub struct GeometryBuilder<'a> {
    atlas: AtlasSnapshot<'a>,
}

impl<'a> GeometryBuilder<'a> {
    pub fn new(atlas: AtlasSnapshot<'a>) -> Self {
        Self { atlas }
    }

    /// Label width (sum of advances) and height (tallest glyph), in label units.
    pub fn measure(&self, text: &str) -> (f32, f32) {
        let mut width = 0u32;
        let mut height = 0u32;
        for ch in text.chars() {
            let g = self.atlas.glyph(ch);
            width += g.width;
            height = height.max(g.height);
        }
        (width as f32 * self.atlas.scale, height as f32 * self.atlas.scale)
    }

    /// Writes one quad per character, laid out left to right and centered on `position`.
    ///
    /// `out` must hold `ATTRIBUTES_PER_CHARACTER` floats per character; characters beyond
    /// its length are dropped and unused quads are zeroed.
    pub fn write_vertices(&self, text: &str, position: Vec2, extent: (f32, f32), out: &mut [f32]) {
        let (width, height) = extent;
        let half_h = height * 0.5;
        let top = position.y - half_h;
        let bottom = position.y + half_h;

        let mut pen = position.x - width * 0.5;
        let mut quads = out.chunks_exact_mut(ATTRIBUTES_PER_CHARACTER);
        for (ch, quad) in text.chars().zip(quads.by_ref()) {
            let glyph_w = self.atlas.glyph(ch).width as f32 * self.atlas.scale;
            let left = pen;
            let right = pen + glyph_w;
            quad.copy_from_slice(&[
                left, top, //
                right, top, //
                left, bottom, //
                left, bottom, //
                right, top, //
                right, bottom,
            ]);
            pen = right;
        }
        for quad in quads {
            quad.fill(0.0);
        }
    }

    /// Writes each character's atlas rectangle as normalized glyph coordinates.
    pub fn write_glyph_coords(&self, text: &str, out: &mut [f32]) {
        let inv_w = if self.atlas.width > 0 {
            1.0 / self.atlas.width as f32
        } else {
            0.0
        };
        let inv_h = if self.atlas.height > 0 {
            1.0 / self.atlas.height as f32
        } else {
            0.0
        };

        let mut quads = out.chunks_exact_mut(ATTRIBUTES_PER_CHARACTER);
        for (ch, quad) in text.chars().zip(quads.by_ref()) {
            let g = self.atlas.glyph(ch);
            let u1 = g.x as f32 * inv_w;
            let u2 = (g.x + g.width) as f32 * inv_w;
            let v_top = g.y as f32 * inv_h;
            let v_bottom = (g.y + g.height) as f32 * inv_h;
            quad.copy_from_slice(&[
                u1, v_top, //
                u2, v_top, //
                u1, v_bottom, //
                u1, v_bottom, //
                u2, v_top, //
                u2, v_bottom,
            ]);
        }
        for quad in quads {
            quad.fill(0.0);
        }
    }

    /// Rebuilds `node`'s geometry in its slot.
    ///
    /// The label extent is reused while `node.cache` matches the atlas version. Glyph
    /// coordinates are only rewritten when the node or its slot saw an older atlas.
    /// Returns `true` if glyph coordinates were written.
    pub fn build(&self, node: &mut TextNode, position: Vec2, data: SlotData<'_>) -> bool {
        let version = self.atlas.version;
        let node_fresh = node.cache.atlas_version == Some(version);

        if !node_fresh {
            let (width, height) = self.measure(&node.text);
            node.cache.width = width;
            node.cache.height = height;
            node.cache.atlas_version = Some(version);
        }

        let extent = (node.cache.width, node.cache.height);
        self.write_vertices(&node.text, position, extent, data.vertices);

        let rewrite_glyphs = !node_fresh || data.slot.glyph_version != Some(version);
        if rewrite_glyphs {
            self.write_glyph_coords(&node.text, data.glyph_coords);
        }
        rewrite_glyphs
    }
}
