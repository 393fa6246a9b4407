//! Glyph atlas lifecycle: character histogram, dirty tracking and regeneration.
//!
//! The atlas always contains exactly the characters used by live labels. Registering a label
//! bumps per-character reference counts; the atlas only goes stale when a character appears
//! for the first time or disappears for good. Regeneration is explicit ([`GlyphAtlasManager::ensure_fresh`])
//! so callers decide when the rasterization cost is paid.

use std::collections::{BTreeMap, HashMap};

use crate::{AtlasSnapshot, FontOptions};

/// Pixel rectangle of one glyph inside the atlas surface (top-left origin).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl GlyphMetrics {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// CPU-side RGBA8 raster of the whole atlas, row-major.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AtlasSurface {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl AtlasSurface {
    /// Surface filled with a single opaque color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Output of one rasterization: the surface plus where every glyph landed on it.
#[derive(Clone, Debug, Default)]
pub struct GlyphInfo {
    pub surface: AtlasSurface,
    pub metrics: HashMap<char, GlyphMetrics>,
}

/// Turns a character set into glyph bitmaps packed into one surface.
///
/// Implementations may omit characters they cannot render; those characters end up as
/// zero-size quads instead of failing the frame.
pub trait AtlasRasterizer {
    fn rasterize(&mut self, options: &FontOptions, chars: &[char]) -> GlyphInfo;
}

impl<R: AtlasRasterizer + ?Sized> AtlasRasterizer for Box<R> {
    fn rasterize(&mut self, options: &FontOptions, chars: &[char]) -> GlyphInfo {
        (**self).rasterize(options, chars)
    }
}

/// Whether the rasterized atlas matches the character histogram.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AtlasState {
    Clean,
    Dirty,
}

/// Owns the character histogram and the current atlas snapshot.
pub struct GlyphAtlasManager<R> {
    rasterizer: R,
    options: FontOptions,
    histogram: BTreeMap<char, usize>,
    state: AtlasState,
    version: u64,
    info: GlyphInfo,
}

impl<R: AtlasRasterizer> GlyphAtlasManager<R> {
    pub fn new(options: FontOptions, rasterizer: R) -> Self {
        Self {
            rasterizer,
            options,
            histogram: BTreeMap::new(),
            state: AtlasState::Clean,
            version: 0,
            info: GlyphInfo::default(),
        }
    }

    /// Adds one reference per character occurrence in `text`.
    pub fn register_characters(&mut self, text: &str) {
        for ch in text.chars() {
            let count = self.histogram.entry(ch).or_insert(0);
            *count += 1;
            if *count == 1 {
                self.state = AtlasState::Dirty;
            }
        }
    }

    /// Drops one reference per character occurrence in `text`.
    ///
    /// Characters reaching zero are evicted. Unknown characters are ignored.
    pub fn unregister_characters(&mut self, text: &str) {
        for ch in text.chars() {
            let Some(count) = self.histogram.get_mut(&ch) else {
                log::warn!("unregistering unknown character {ch:?}");
                continue;
            };
            *count -= 1;
            if *count == 0 {
                self.histogram.remove(&ch);
                self.state = AtlasState::Dirty;
            }
        }
    }

    /// Re-rasterizes the atlas if the character set changed since the last call.
    ///
    /// Returns `true` when a new surface was produced; the caller must upload it before
    /// drawing anything that samples the atlas.
    pub fn ensure_fresh(&mut self) -> bool {
        if self.state == AtlasState::Clean {
            return false;
        }

        let chars: Vec<char> = self.histogram.keys().copied().collect();
        self.info = self.rasterizer.rasterize(&self.options, &chars);
        self.version += 1;
        self.state = AtlasState::Clean;

        log::debug!(
            "glyph atlas v{} rasterized: {} chars, {}x{} px",
            self.version,
            chars.len(),
            self.info.surface.width,
            self.info.surface.height
        );
        true
    }

    /// Metrics for `ch` in the current snapshot, if the rasterizer produced any.
    #[inline]
    pub fn glyph(&self, ch: char) -> Option<GlyphMetrics> {
        self.info.metrics.get(&ch).copied()
    }

    /// View of the current atlas for geometry building. Call [`Self::ensure_fresh`] first.
    pub fn snapshot(&self) -> AtlasSnapshot<'_> {
        AtlasSnapshot {
            metrics: &self.info.metrics,
            width: self.info.surface.width,
            height: self.info.surface.height,
            version: self.version,
            scale: self.options.geometry_scale(),
        }
    }

    #[inline]
    pub fn surface(&self) -> &AtlasSurface {
        &self.info.surface
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn state(&self) -> AtlasState {
        self.state
    }

    #[inline]
    pub fn options(&self) -> &FontOptions {
        &self.options
    }

    /// Reference count for `ch` (0 when absent).
    #[inline]
    pub fn count(&self, ch: char) -> usize {
        self.histogram.get(&ch).copied().unwrap_or(0)
    }

    /// Characters currently referenced by at least one label, sorted.
    pub fn characters(&self) -> impl Iterator<Item = char> + '_ {
        self.histogram.keys().copied()
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedRasterizer;

    fn manager() -> GlyphAtlasManager<FixedRasterizer> {
        GlyphAtlasManager::new(FontOptions::default(), FixedRasterizer::default())
    }

    #[test]
    fn test_new_character_marks_dirty() {
        let mut atlas = manager();
        assert_eq!(atlas.state(), AtlasState::Clean);

        atlas.register_characters("ab");
        assert_eq!(atlas.state(), AtlasState::Dirty);
        assert!(atlas.ensure_fresh());
        assert_eq!(atlas.state(), AtlasState::Clean);

        // Only counts change; the character set is the same.
        atlas.register_characters("ba");
        assert_eq!(atlas.state(), AtlasState::Clean);
        assert_eq!(atlas.count('a'), 2);
    }

    #[test]
    fn test_ensure_fresh_is_idempotent() {
        let mut atlas = manager();
        atlas.register_characters("hello");

        assert!(atlas.ensure_fresh());
        assert!(!atlas.ensure_fresh());
        assert_eq!(atlas.rasterizer().calls(), 1);
        assert_eq!(atlas.version(), 1);
    }

    #[test]
    fn test_histogram_tracks_live_characters() {
        let mut atlas = manager();
        atlas.register_characters("aab");
        atlas.register_characters("bc");
        atlas.ensure_fresh();

        atlas.unregister_characters("aab");
        assert_eq!(atlas.count('a'), 0);
        assert_eq!(atlas.count('b'), 1);
        assert_eq!(atlas.characters().collect::<Vec<_>>(), vec!['b', 'c']);
        assert_eq!(atlas.state(), AtlasState::Dirty);
    }

    #[test]
    fn test_removing_shared_character_keeps_atlas_clean() {
        let mut atlas = manager();
        atlas.register_characters("x");
        atlas.register_characters("x");
        atlas.ensure_fresh();

        atlas.unregister_characters("x");
        assert_eq!(atlas.state(), AtlasState::Clean);
        atlas.unregister_characters("x");
        assert_eq!(atlas.state(), AtlasState::Dirty);
    }

    #[test]
    fn test_unknown_character_is_ignored() {
        let mut atlas = manager();
        atlas.unregister_characters("q");
        assert_eq!(atlas.count('q'), 0);
        assert_eq!(atlas.state(), AtlasState::Clean);
    }

    #[test]
    fn test_rasterizer_receives_sorted_character_set() {
        let mut atlas = manager();
        atlas.register_characters("cab");
        atlas.ensure_fresh();
        assert_eq!(atlas.rasterizer().last_chars(), &['a', 'b', 'c']);
        assert!(atlas.glyph('a').is_some());
        assert!(atlas.glyph('z').is_none());
    }
}
