//! Built-in stroke font.
//!
//! Every glyph is a handful of segments on a monospace cell, 7-segment style. Crude but
//! readable at label sizes and fully deterministic, so it works headless and in tests.
//! Printable characters without a dedicated shape render as a placeholder box; control
//! characters are omitted from the atlas.

use text_nodes::{AtlasRasterizer, FontOptions, GlyphInfo};

use crate::{compose, GlyphCell};

/// Base cell size in pixels at scale 1.
pub const BASE_ADVANCE: u32 = 8;
pub const BASE_HEIGHT: u32 = 12;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stroke {
    Top,
    Mid,
    Bottom,
    Left,
    Right,
    LeftUpper,
    LeftLower,
    RightUpper,
    RightLower,
    Center,
    CenterUpper,
    CenterLower,
    /// Horizontal bar, offset from the middle in quarter-box units.
    Bar(i8),
    /// Square dot, offset from the middle in quarter-box units.
    Dot(i8, i8),
    Slash,
    Backslash,
    Frame,
}

use Stroke::*;

fn strokes(ch: char) -> &'static [Stroke] {
    match ch {
        ' ' => &[],
        '0' | 'O' | 'o' | 'D' | 'd' => &[Top, Bottom, Left, Right],
        '1' => &[Right],
        '2' => &[Top, Mid, Bottom, RightUpper, LeftLower],
        '3' => &[Top, Mid, Bottom, Right],
        '4' => &[Mid, LeftUpper, Right],
        '5' | 'S' | 's' => &[Top, Mid, Bottom, LeftUpper, RightLower],
        '6' => &[Top, Mid, Bottom, Left, RightLower],
        '7' => &[Top, Right],
        '8' | 'B' | 'b' => &[Top, Mid, Bottom, Left, Right],
        '9' => &[Top, Mid, Bottom, Right, LeftUpper],
        'A' | 'a' => &[Top, Mid, Left, Right],
        'C' | 'c' => &[Top, Bottom, Left],
        'E' | 'e' => &[Top, Mid, Bottom, Left],
        'F' | 'f' => &[Top, Mid, Left],
        'G' | 'g' => &[Top, Bottom, Left, RightLower, Dot(1, 0)],
        'H' | 'h' => &[Left, Right, Mid],
        'I' | 'i' => &[Top, Bottom, Center],
        'J' | 'j' => &[Right, Bottom, LeftLower],
        'K' | 'k' => &[Left, Dot(0, 0), Dot(1, -1), Dot(1, 1)],
        'L' | 'l' => &[Left, Bottom],
        'M' | 'm' => &[Left, Right, Dot(-1, -1), Dot(1, -1)],
        'N' | 'n' => &[Left, Right, Backslash],
        'P' | 'p' => &[Left, Top, Mid, RightUpper],
        'Q' | 'q' => &[Top, Bottom, Left, Right, Dot(1, 1)],
        'R' | 'r' => &[Left, Top, Mid, RightUpper, Dot(0, 1)],
        'T' | 't' => &[Top, Center],
        'U' | 'u' => &[Left, Right, Bottom],
        'V' | 'v' => &[LeftUpper, RightUpper, Dot(-1, 1), Dot(1, 1), Dot(0, 2)],
        'W' | 'w' => &[Left, Right, Bottom, CenterLower],
        'X' | 'x' => &[Slash, Backslash],
        'Y' | 'y' => &[Mid, CenterLower, Dot(-1, -1), Dot(1, -1)],
        'Z' | 'z' => &[Top, Bottom, Slash],
        '-' => &[Mid],
        '_' => &[Bottom],
        '.' => &[Dot(0, 2)],
        ',' => &[Dot(0, 2), Dot(-1, 2)],
        ':' => &[Dot(0, -1), Dot(0, 1)],
        ';' => &[Dot(0, -1), Dot(0, 1), Dot(-1, 2)],
        '!' => &[CenterUpper, Dot(0, 2)],
        '?' => &[Top, RightUpper, Mid, Dot(0, 2)],
        '/' => &[Slash],
        '\\' => &[Backslash],
        '|' => &[Center],
        '+' => &[Mid, Center],
        '=' => &[Bar(-1), Bar(1)],
        '(' | '[' | '{' | '<' => &[Center, Dot(1, -2), Dot(1, 2)],
        ')' | ']' | '}' | '>' => &[Center, Dot(-1, -2), Dot(-1, 2)],
        '\'' | '"' | '`' => &[Dot(0, -2)],
        _ => &[Frame],
    }
}

/// Scratch surface for one glyph cell.
struct Pen {
    cell: GlyphCell,
    thickness: u32,
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Pen {
    fn new(ch: char, scale: u32) -> Self {
        let width = BASE_ADVANCE * scale;
        let height = BASE_HEIGHT * scale;
        let pad_x = scale;
        let pad_y = 2 * scale;
        Self {
            cell: GlyphCell::blank(ch, width, height),
            thickness: scale,
            x0: pad_x,
            y0: pad_y,
            x1: width.saturating_sub(pad_x).max(pad_x + 1),
            y1: height.saturating_sub(pad_y).max(pad_y + 1),
        }
    }

    fn fill(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) {
        let (w, h) = (self.cell.width, self.cell.height);
        for y in y0.min(h)..y1.min(h) {
            for x in x0.min(w)..x1.min(w) {
                self.cell.coverage[(y * w + x) as usize] = 255;
            }
        }
    }

    fn hline(&mut self, x0: u32, x1: u32, y: u32) {
        self.fill(x0, y, x1, y + self.thickness);
    }

    fn vline(&mut self, x: u32, y0: u32, y1: u32) {
        self.fill(x, y0, x + self.thickness, y1);
    }

    fn mid(&self) -> (u32, u32) {
        ((self.x0 + self.x1) / 2, (self.y0 + self.y1) / 2)
    }

    fn quarter(&self) -> (i32, i32) {
        (
            ((self.x1 - self.x0) / 4) as i32,
            ((self.y1 - self.y0) / 4) as i32,
        )
    }

    fn stroke(&mut self, stroke: Stroke) {
        let t = self.thickness;
        let (x0, y0, x1, y1) = (self.x0, self.y0, self.x1, self.y1);
        let (mid_x, mid_y) = self.mid();
        let (qx, qy) = self.quarter();
        let right = x1.saturating_sub(t);
        let bottom = y1.saturating_sub(t);

        match stroke {
            Top => self.hline(x0, x1, y0),
            Mid => self.hline(x0, x1, mid_y),
            Bottom => self.hline(x0, x1, bottom),
            Left => self.vline(x0, y0, y1),
            Right => self.vline(right, y0, y1),
            LeftUpper => self.vline(x0, y0, mid_y + t),
            LeftLower => self.vline(x0, mid_y, y1),
            RightUpper => self.vline(right, y0, mid_y + t),
            RightLower => self.vline(right, mid_y, y1),
            Center => self.vline(mid_x, y0, y1),
            CenterUpper => self.vline(mid_x, y0, mid_y + qy as u32),
            CenterLower => self.vline(mid_x, mid_y, y1),
            Bar(dy) => {
                let y = (mid_y as i32 + dy as i32 * qy).max(0) as u32;
                self.hline(x0, x1, y);
            }
            Dot(dx, dy) => {
                let x = (mid_x as i32 + dx as i32 * qx).clamp(x0 as i32, right as i32) as u32;
                let y = (mid_y as i32 + dy as i32 * qy).clamp(y0 as i32, bottom as i32) as u32;
                self.fill(x, y, x + t, y + t);
            }
            Slash | Backslash => {
                let steps = (y1 - y0).max(1);
                let span = right.saturating_sub(x0);
                for i in 0..steps {
                    let dx = i * span / steps;
                    let x = if stroke == Slash { right - dx } else { x0 + dx };
                    self.fill(x, y0 + i, x + t, y0 + i + 1);
                }
            }
            Frame => {
                self.hline(x0, x1, y0);
                self.hline(x0, x1, bottom);
                self.vline(x0, y0, y1);
                self.vline(right, y0, y1);
            }
        }
    }
}

/// Rasterizer backed by the built-in stroke font.
///
/// The font family in [`FontOptions`] is ignored; only the size matters.
#[derive(Copy, Clone, Debug, Default)]
pub struct BitmapRasterizer;

impl BitmapRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Integer cell scale giving roughly `raster_px` tall glyphs.
    pub fn scale_for(options: &FontOptions) -> u32 {
        (options.raster_px() / BASE_HEIGHT as f32).round().max(1.0) as u32
    }

    /// Renders `ch` into a cell, or `None` for characters the font has no glyph for.
    pub fn render_cell(&self, ch: char, scale: u32) -> Option<GlyphCell> {
        if ch.is_control() {
            return None;
        }
        let mut pen = Pen::new(ch, scale.max(1));
        for stroke in strokes(ch) {
            pen.stroke(*stroke);
        }
        Some(pen.cell)
    }
}

impl AtlasRasterizer for BitmapRasterizer {
    fn rasterize(&mut self, options: &FontOptions, chars: &[char]) -> GlyphInfo {
        let scale = Self::scale_for(options);
        let cells = chars
            .iter()
            .filter_map(|ch| self.render_cell(*ch, scale))
            .collect();
        compose(options, cells)
    }
}
