//! Text node program: the host-facing entry point and the only place GPU state is touched.
//!
//! Frame protocol, all on the render-loop thread:
//! 1. structural changes: [`TextNodeProgram::create_node`], [`TextNodeProgram::remove_node`],
//!    [`TextNodeProgram::replace_properties`]
//! 2. [`TextNodeProgram::position`] for every node that moved (refreshes the atlas first)
//! 3. [`TextNodeProgram::render`] once

use std::collections::HashMap;

use glam::{Mat4, Vec2};

use crate::{
    AtlasRasterizer, BufferAllocator, DrawCall, FontOptions, GeometryBuilder, GlyphAtlasManager,
    GraphicsContext, LabelCache, NodeId, RenderError, ShaderSource, TextNode, TextUniforms,
    ATTRIBUTES_PER_CHARACTER, VERTICES_PER_CHARACTER,
};

pub const A_VERTEX_POS: &str = "a_vertexPos";
pub const A_GLYPH_COORD: &str = "a_glyphCoord";
pub const U_SCREEN_SIZE: &str = "u_screenSize";
pub const U_TRANSFORM: &str = "u_transform";
pub const U_GLYPHS: &str = "u_glyphs";

/// WGSL program drawing label quads sampled from the glyph atlas.
pub const TEXT_NODE_SHADER: ShaderSource = ShaderSource {
    label: "Text Node Shader",
    vertex: include_str!("shaders/text_node.wgsl"),
    fragment: include_str!("shaders/text_node.wgsl"),
    vertex_entry: "vs_main",
    fragment_entry: "fs_main",
    attributes: &[A_VERTEX_POS, A_GLYPH_COORD],
    uniforms: &[U_TRANSFORM, U_SCREEN_SIZE, U_GLYPHS],
};

struct GpuResources<C: GraphicsContext> {
    program: C::Program,
    vertex_location: u32,
    glyph_location: u32,
    vertex_buffer: C::Buffer,
    glyph_buffer: C::Buffer,
    texture: Option<C::Texture>,
}

/// Renders text labels for graph nodes.
pub struct TextNodeProgram<C: GraphicsContext, R> {
    atlas: GlyphAtlasManager<R>,
    slots: BufferAllocator,
    // Text each node was registered with; drives histogram updates and glyph refreshes.
    labels: HashMap<NodeId, String>,

    context: Option<C>,
    gpu: Option<GpuResources<C>>,

    transform: Mat4,
    screen_size: Vec2,
    uniforms_dirty: bool,
}

impl<C: GraphicsContext, R: AtlasRasterizer> TextNodeProgram<C, R> {
    pub fn new(options: FontOptions, rasterizer: R) -> Self {
        Self {
            atlas: GlyphAtlasManager::new(options, rasterizer),
            slots: BufferAllocator::new(ATTRIBUTES_PER_CHARACTER),
            labels: HashMap::new(),
            context: None,
            gpu: None,
            transform: Mat4::IDENTITY,
            screen_size: Vec2::ONE,
            uniforms_dirty: true,
        }
    }

    /// Compiles the program, resolves its locations and creates the GPU buffers.
    pub fn load(&mut self, mut context: C) -> Result<(), RenderError> {
        let program = context.create_program(&TEXT_NODE_SHADER)?;
        let locations = context.get_locations(
            &program,
            &[A_VERTEX_POS, A_GLYPH_COORD, U_SCREEN_SIZE, U_TRANSFORM, U_GLYPHS],
        )?;
        let vertex_location = locations.attribute(A_VERTEX_POS)?;
        let glyph_location = locations.attribute(A_GLYPH_COORD)?;

        let vertex_buffer = context.create_buffer("Text Node Vertex Buffer");
        let glyph_buffer = context.create_buffer("Text Node Glyph Buffer");

        // Labels may have been positioned before load.
        let texture = if self.atlas.surface().is_empty() {
            None
        } else {
            Some(context.upload_texture(&program, self.atlas.surface()))
        };

        self.gpu = Some(GpuResources {
            program,
            vertex_location,
            glyph_location,
            vertex_buffer,
            glyph_buffer,
            texture,
        });
        self.context = Some(context);
        self.uniforms_dirty = true;

        log::info!("text node program loaded ({} locations)", locations.len());
        Ok(())
    }

    /// Registers a label: claims a slot range and references its characters.
    pub fn create_node(&mut self, node: &TextNode) {
        self.atlas.register_characters(&node.text);
        self.slots.allocate(node.id, node.char_count());

        if let Some(previous) = self.labels.insert(node.id, node.text.clone()) {
            self.atlas.unregister_characters(&previous);
        }
    }

    /// Frees the node's slot range and releases its characters.
    pub fn remove_node(&mut self, node: &TextNode) {
        let Some(label) = self.labels.remove(&node.id) else {
            log::warn!("remove_node for unknown node {:?}", node.id);
            return;
        };
        self.slots.release(node.id);
        self.atlas.unregister_characters(&label);
    }

    /// Swaps a node's label, resizing its slot range when the length changes.
    ///
    /// `new`'s cache is reset so its geometry is fully rebuilt on the next `position`.
    pub fn replace_properties(&mut self, old: &TextNode, new: &mut TextNode) {
        new.cache = LabelCache::default();

        if old.id != new.id || !self.labels.contains_key(&new.id) {
            if self.labels.contains_key(&old.id) {
                self.remove_node(old);
            }
            self.create_node(new);
            return;
        }

        self.slots.resize(new.id, new.char_count());
        self.atlas.register_characters(&new.text);
        if let Some(previous) = self.labels.insert(new.id, new.text.clone()) {
            self.atlas.unregister_characters(&previous);
        }
    }

    /// Rebuilds `node`'s quads at `position`, refreshing the atlas first if needed.
    pub fn position(&mut self, node: &mut TextNode, position: Vec2) {
        self.refresh_atlas();

        let builder = GeometryBuilder::new(self.atlas.snapshot());
        let version = self.atlas.version();
        let Some(data) = self.slots.slot_data_mut(node.id) else {
            log::warn!("position for unknown node {:?}", node.id);
            return;
        };
        if node.char_count() > data.slot.len {
            log::warn!(
                "node {:?} text changed without replace_properties; truncating to {} chars",
                node.id,
                data.slot.len
            );
        }

        if builder.build(node, position, data) {
            self.slots.mark_glyphs_written(node.id, version);
        }
    }

    pub fn update_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.uniforms_dirty = true;
    }

    pub fn update_size(&mut self, width: f32, height: f32) {
        self.screen_size = Vec2::new(width, height);
        self.uniforms_dirty = true;
    }

    /// Uploads both packed buffers and draws every label in one call.
    pub fn render(&mut self) -> Result<(), RenderError> {
        if self.gpu.is_none() {
            return Err(RenderError::NotLoaded);
        }
        self.refresh_stale_glyphs();

        let (Some(context), Some(gpu)) = (self.context.as_mut(), self.gpu.as_mut()) else {
            return Err(RenderError::NotLoaded);
        };

        context.upload_buffer(&mut gpu.vertex_buffer, self.slots.vertices());
        context.upload_buffer(&mut gpu.glyph_buffer, self.slots.glyph_coords());

        if self.uniforms_dirty {
            let uniforms = TextUniforms::new(self.transform, self.screen_size);
            context.set_uniforms(&gpu.program, &uniforms);
            self.uniforms_dirty = false;
        }

        let characters = self.slots.active_characters();
        if characters == 0 {
            log::trace!("no label characters to draw");
            return Ok(());
        }
        let Some(texture) = gpu.texture.as_ref() else {
            log::trace!("glyph atlas not rasterized yet; skipping label draw");
            return Ok(());
        };

        context.draw_triangles(DrawCall {
            program: &gpu.program,
            vertices: &gpu.vertex_buffer,
            vertex_location: gpu.vertex_location,
            glyph_coords: &gpu.glyph_buffer,
            glyph_location: gpu.glyph_location,
            texture,
            vertex_count: (characters * VERTICES_PER_CHARACTER) as u32,
        });
        Ok(())
    }

    fn refresh_atlas(&mut self) {
        if !self.atlas.ensure_fresh() {
            return;
        }
        if let (Some(context), Some(gpu)) = (self.context.as_mut(), self.gpu.as_mut()) {
            gpu.texture = Some(context.upload_texture(&gpu.program, self.atlas.surface()));
        }
    }

    // Rewrites glyph coordinates for slots built against an older atlas, so quads never
    // sample a texture they were not laid out for.
    fn refresh_stale_glyphs(&mut self) {
        let version = self.atlas.version();
        if version == 0 {
            return;
        }

        let stale: Vec<NodeId> = self.slots.stale_glyphs(version).collect();
        if stale.is_empty() {
            return;
        }

        let builder = GeometryBuilder::new(self.atlas.snapshot());
        for id in stale {
            let (Some(label), Some(data)) = (self.labels.get(&id), self.slots.slot_data_mut(id))
            else {
                continue;
            };
            builder.write_glyph_coords(label, data.glyph_coords);
            self.slots.mark_glyphs_written(id, version);
        }
    }

    pub fn atlas(&self) -> &GlyphAtlasManager<R> {
        &self.atlas
    }

    pub fn slots(&self) -> &BufferAllocator {
        &self.slots
    }

    #[inline]
    pub fn active_characters(&self) -> usize {
        self.slots.active_characters()
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut C> {
        self.context.as_mut()
    }
}
