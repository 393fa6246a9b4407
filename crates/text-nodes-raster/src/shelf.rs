//! Row-based shelf packer for glyph cells.
//!
//! The atlas has a fixed width and grows downward up to a height limit. Each insertion goes into the first shelf
//! that is tall enough and has room left, otherwise a new shelf is opened below the last one.
//! Not optimal packing, but simple and fast, and label glyphs are all about the same height.

use text_nodes::GlyphMetrics;

#[derive(Copy, Clone, Debug)]
struct Shelf {
    y: u32,
    height: u32,
    x_cursor: u32,
}

/// Places rectangles in an atlas of fixed width.
///
/// `padding` pixels are reserved around every rectangle so linear sampling does not bleed
/// neighbouring glyphs into each other.
#[derive(Debug)]
pub struct ShelfPacker {
    width: u32,
    padding: u32,
    max_height: u32,
    shelves: Vec<Shelf>,
    next_shelf_y: u32,
}

impl ShelfPacker {
    pub fn new(width: u32, padding: u32) -> Self {
        Self {
            width,
            padding,
            max_height: u32::MAX,
            shelves: Vec::new(),
            next_shelf_y: 0,
        }
    }

    /// Caps how far the atlas may grow downward.
    pub fn with_max_height(mut self, max_height: u32) -> Self {
        self.max_height = max_height;
        self
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height used so far; the atlas surface must be at least this tall.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.next_shelf_y
    }

    /// Reserves a `width` x `height` rectangle.
    ///
    /// Returns the rectangle (excluding padding), or `None` if it is wider than the atlas or
    /// no shelf fits below the height limit.
    pub fn insert(&mut self, width: u32, height: u32) -> Option<GlyphMetrics> {
        let pad = self.padding;
        let reserved_w = width.saturating_add(pad.saturating_mul(2));
        let reserved_h = height.saturating_add(pad.saturating_mul(2));

        if reserved_w > self.width {
            return None;
        }

        for shelf in &mut self.shelves {
            if reserved_h <= shelf.height && shelf.x_cursor.saturating_add(reserved_w) <= self.width
            {
                let x = shelf.x_cursor;
                shelf.x_cursor += reserved_w;
                return Some(GlyphMetrics::new(x + pad, shelf.y + pad, width, height));
            }
        }

        if self.next_shelf_y.saturating_add(reserved_h) > self.max_height {
            return None;
        }

        let shelf = Shelf {
            y: self.next_shelf_y,
            height: reserved_h,
            x_cursor: reserved_w,
        };
        self.next_shelf_y = self.next_shelf_y.saturating_add(reserved_h);
        self.shelves.push(shelf);

        Some(GlyphMetrics::new(pad, shelf.y + pad, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlaps(a: &GlyphMetrics, b: &GlyphMetrics) -> bool {
        a.x < b.x + b.width && b.x < a.x + a.width && a.y < b.y + b.height && b.y < a.y + a.height
    }

    #[test]
    fn test_fills_shelf_then_opens_new_one() {
        let mut packer = ShelfPacker::new(32, 1);
        let a = packer.insert(10, 20).unwrap();
        let b = packer.insert(10, 20).unwrap();
        let c = packer.insert(10, 20).unwrap();

        assert_eq!((a.x, a.y), (1, 1));
        assert_eq!((b.x, b.y), (13, 1));
        // 3 * 12 > 32: third cell goes to a second shelf.
        assert_eq!((c.x, c.y), (1, 23));
        assert_eq!(packer.height(), 44);
    }

    #[test]
    fn test_placements_never_overlap() {
        let mut packer = ShelfPacker::new(64, 2);
        let sizes = [(8, 12), (16, 12), (5, 30), (20, 10), (30, 12), (8, 8), (40, 20)];
        let placed: Vec<GlyphMetrics> = sizes
            .iter()
            .map(|(w, h)| packer.insert(*w, *h).unwrap())
            .collect();

        for (i, a) in placed.iter().enumerate() {
            assert!(a.x + a.width <= packer.width());
            assert!(a.y + a.height <= packer.height());
            for b in &placed[i + 1..] {
                assert!(!overlaps(a, b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_too_wide_is_rejected() {
        let mut packer = ShelfPacker::new(16, 1);
        assert!(packer.insert(15, 4).is_none());
        assert_eq!(packer.height(), 0);
    }

    #[test]
    fn test_height_limit_rejects_new_shelf() {
        let mut packer = ShelfPacker::new(24, 1).with_max_height(30);
        packer.insert(10, 20).unwrap();
        packer.insert(10, 20).unwrap();
        assert!(packer.insert(10, 20).is_none());
        assert_eq!(packer.height(), 22);
    }

    #[test]
    fn test_short_cell_reuses_taller_shelf() {
        let mut packer = ShelfPacker::new(100, 0);
        packer.insert(10, 30).unwrap();
        let short = packer.insert(10, 10).unwrap();
        assert_eq!(short.y, 0);
        assert_eq!(packer.height(), 30);
    }
}
