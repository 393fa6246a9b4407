//! Deterministic doubles for the rasterizer and the GPU backend.

use std::collections::HashMap;

use crate::{
    AtlasRasterizer, AtlasSurface, DrawCall, FontOptions, GlyphInfo, GlyphMetrics,
    GraphicsContext, Locations, RenderError, ShaderSource, TextUniforms,
};

pub const CELL_WIDTH: u32 = 10;
pub const CELL_HEIGHT: u32 = 20;

/// Lays every printable character out in a single row of 10x20 cells.
/// Control characters are left out, like a font without those glyphs.
#[derive(Default)]
pub struct FixedRasterizer {
    calls: usize,
    last_chars: Vec<char>,
}

impl FixedRasterizer {
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn last_chars(&self) -> &[char] {
        &self.last_chars
    }
}

impl AtlasRasterizer for FixedRasterizer {
    fn rasterize(&mut self, options: &FontOptions, chars: &[char]) -> GlyphInfo {
        self.calls += 1;
        self.last_chars = chars.to_vec();

        let mut metrics = HashMap::new();
        let mut x = 0;
        for &ch in chars.iter().filter(|c| !c.is_control()) {
            metrics.insert(ch, GlyphMetrics::new(x, 0, CELL_WIDTH, CELL_HEIGHT));
            x += CELL_WIDTH;
        }

        GlyphInfo {
            surface: AtlasSurface::filled(x, CELL_HEIGHT, crate::rgb_bytes(options.background)),
            metrics,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Program(&'static str),
    Buffer { id: usize, len: usize },
    Texture { width: u32, height: u32 },
    Uniforms(TextUniforms),
    Draw { vertex_count: u32 },
}

pub struct RecordedBuffer {
    pub id: usize,
    pub data: Vec<f32>,
}

/// Backend that records every call instead of touching a GPU.
#[derive(Default)]
pub struct RecordingContext {
    pub events: Vec<Event>,
    buffers: usize,
}

impl GraphicsContext for RecordingContext {
    type Program = ShaderSource;
    type Buffer = RecordedBuffer;
    type Texture = (u32, u32);

    fn create_program(&mut self, source: &ShaderSource) -> Result<Self::Program, RenderError> {
        self.events.push(Event::Program(source.label));
        Ok(*source)
    }

    fn get_locations(
        &self,
        program: &Self::Program,
        names: &[&str],
    ) -> Result<Locations, RenderError> {
        Locations::from_source(program, names)
    }

    fn create_buffer(&mut self, _label: &str) -> Self::Buffer {
        self.buffers += 1;
        RecordedBuffer {
            id: self.buffers,
            data: Vec::new(),
        }
    }

    fn upload_buffer(&mut self, buffer: &mut Self::Buffer, data: &[f32]) {
        buffer.data = data.to_vec();
        self.events.push(Event::Buffer {
            id: buffer.id,
            len: data.len(),
        });
    }

    fn upload_texture(&mut self, _program: &Self::Program, surface: &AtlasSurface) -> Self::Texture {
        self.events.push(Event::Texture {
            width: surface.width,
            height: surface.height,
        });
        (surface.width, surface.height)
    }

    fn set_uniforms(&mut self, _program: &Self::Program, uniforms: &TextUniforms) {
        self.events.push(Event::Uniforms(*uniforms));
    }

    fn draw_triangles(&mut self, call: DrawCall<'_, Self>) {
        assert_eq!(call.vertices.data.len(), call.glyph_coords.data.len());
        self.events.push(Event::Draw {
            vertex_count: call.vertex_count,
        });
    }
}
