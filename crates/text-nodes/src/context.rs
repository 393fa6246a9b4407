//! The graphics-context seam: everything the text pipeline needs from a GPU backend.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::{AtlasSurface, RenderError};

/// Shader program description handed to [`GraphicsContext::create_program`].
#[derive(Copy, Clone, Debug)]
pub struct ShaderSource {
    pub label: &'static str,
    pub vertex: &'static str,
    pub fragment: &'static str,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    /// Per-vertex attributes in location order. Each is a `vec2<f32>` fed from its own buffer.
    pub attributes: &'static [&'static str],
    /// Uniform and texture names the program exposes.
    pub uniforms: &'static [&'static str],
}

/// Resolved location of a named shader input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Location {
    Attribute(u32),
    Uniform(u32),
}

/// Name -> location table returned by [`GraphicsContext::get_locations`].
#[derive(Clone, Debug, Default)]
pub struct Locations {
    map: HashMap<String, Location>,
}

impl Locations {
    pub fn insert(&mut self, name: &str, location: Location) {
        self.map.insert(name.to_string(), location);
    }

    pub fn get(&self, name: &str) -> Result<Location, RenderError> {
        self.map
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::UnknownLocation(name.to_string()))
    }

    /// Location of a vertex attribute; errors if `name` is missing or is not an attribute.
    pub fn attribute(&self, name: &str) -> Result<u32, RenderError> {
        match self.get(name)? {
            Location::Attribute(index) => Ok(index),
            Location::Uniform(_) => Err(RenderError::UnknownLocation(name.to_string())),
        }
    }

    /// Resolves `names` against `source`'s declared attributes and uniforms.
    ///
    /// Backends without shader reflection can implement `get_locations` with this.
    pub fn from_source(source: &ShaderSource, names: &[&str]) -> Result<Self, RenderError> {
        let mut out = Self::default();
        for name in names {
            let location = if let Some(i) = source.attributes.iter().position(|a| a == name) {
                Location::Attribute(i as u32)
            } else if let Some(i) = source.uniforms.iter().position(|u| u == name) {
                Location::Uniform(i as u32)
            } else {
                return Err(RenderError::UnknownLocation(name.to_string()));
            };
            out.insert(name, location);
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Uniform block shared by every label quad.
///
/// Layout matches the WGSL `Globals` struct (80 bytes, 16-byte aligned).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TextUniforms {
    pub transform: [[f32; 4]; 4],
    pub screen_size: [f32; 2],
    pub _padding: [f32; 2],
}

impl TextUniforms {
    pub fn new(transform: glam::Mat4, screen_size: glam::Vec2) -> Self {
        Self {
            transform: transform.to_cols_array_2d(),
            screen_size: screen_size.to_array(),
            _padding: [0.0; 2],
        }
    }
}

/// Everything one draw of the label mesh needs.
pub struct DrawCall<'a, C: GraphicsContext + ?Sized> {
    pub program: &'a C::Program,
    pub vertices: &'a C::Buffer,
    pub vertex_location: u32,
    pub glyph_coords: &'a C::Buffer,
    pub glyph_location: u32,
    pub texture: &'a C::Texture,
    /// Number of vertices, drawn as a triangle list.
    pub vertex_count: u32,
}

/// GPU backend used by [`crate::TextNodeProgram`].
///
/// All calls happen on the render-loop thread; implementations are free to hold
/// non-`Send` state.
pub trait GraphicsContext {
    type Program;
    type Buffer;
    type Texture;

    fn create_program(&mut self, source: &ShaderSource) -> Result<Self::Program, RenderError>;

    fn get_locations(
        &self,
        program: &Self::Program,
        names: &[&str],
    ) -> Result<Locations, RenderError>;

    fn create_buffer(&mut self, label: &str) -> Self::Buffer;

    /// Replaces the buffer contents with `data`, growing the GPU allocation if needed.
    fn upload_buffer(&mut self, buffer: &mut Self::Buffer, data: &[f32]);

    /// Creates a texture from the atlas surface. The previous texture is dropped by the caller.
    fn upload_texture(&mut self, program: &Self::Program, surface: &AtlasSurface) -> Self::Texture;

    fn set_uniforms(&mut self, program: &Self::Program, uniforms: &TextUniforms);

    fn draw_triangles(&mut self, call: DrawCall<'_, Self>);
}
