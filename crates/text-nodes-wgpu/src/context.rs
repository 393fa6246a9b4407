use std::borrow::Cow;

use text_nodes::{
    AtlasSurface, DrawCall, GraphicsContext, Locations, RenderError, ShaderSource, TextUniforms,
};

use crate::{mip_chain, mip_level_count, stream_layouts, GpuBuffer};

/// Compiled label pipeline plus the state bound alongside it.
pub struct TextPipeline {
    source: ShaderSource,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    atlas_bind_group_layout: wgpu::BindGroupLayout,
    atlas_sampler: wgpu::Sampler,
}

/// Glyph atlas texture and its bind group.
pub struct AtlasTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// wgpu implementation of [`GraphicsContext`].
pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    target: Option<wgpu::TextureView>,
}

impl WgpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, surface_format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            queue,
            surface_format,
            target: None,
        }
    }

    /// View the next draws render into. Usually the current swapchain frame.
    pub fn set_target(&mut self, view: wgpu::TextureView) {
        self.target = Some(view);
    }

    /// Drops the current target, e.g. before presenting the frame it belongs to.
    pub fn take_target(&mut self) -> Option<wgpu::TextureView> {
        self.target.take()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn write_level(
        &self,
        texture: &wgpu::Texture,
        level: u32,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn shader_module(&self, label: &str, code: &str) -> wgpu::ShaderModule {
        self.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(code.into()),
            })
    }
}

/// Pixels and size to upload for `surface`. An empty atlas, or one larger than
/// `max_dimension` on either side, becomes one transparent texel.
pub fn texture_source(surface: &AtlasSurface, max_dimension: u32) -> (u32, u32, Cow<'_, [u8]>) {
    if surface.is_empty() {
        return (1, 1, Cow::Owned(vec![0; 4]));
    }
    if surface.width > max_dimension || surface.height > max_dimension {
        log::warn!(
            "glyph atlas {}x{} exceeds the {max_dimension}px texture limit; labels will be blank",
            surface.width,
            surface.height
        );
        return (1, 1, Cow::Owned(vec![0; 4]));
    }
    (surface.width, surface.height, Cow::Borrowed(&surface.pixels))
}

impl GraphicsContext for WgpuContext {
    type Program = TextPipeline;
    type Buffer = GpuBuffer;
    type Texture = AtlasTexture;

    fn create_program(&mut self, source: &ShaderSource) -> Result<Self::Program, RenderError> {
        let layouts = stream_layouts();
        if source.attributes.len() != layouts.len() {
            return Err(RenderError::Shader(format!(
                "{} declares {} vertex attributes, expected {}",
                source.label,
                source.attributes.len(),
                layouts.len()
            )));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = self.shader_module(source.label, source.vertex);
        let fragment_module = if source.fragment == source.vertex {
            None
        } else {
            Some(self.shader_module(source.label, source.fragment))
        };

        let uniform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Text Node Uniform Buffer"),
            size: std::mem::size_of::<TextUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Text Node Globals Bind Group Layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let globals_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Text Node Globals Bind Group"),
            layout: &globals_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let atlas_bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Text Node Atlas Bind Group Layout"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                });

        // Glyphs are oversampled and drawn scaled down: linear within a level, nearest mip.
        let atlas_sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Text Node Atlas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Text Node Pipeline Layout"),
                bind_group_layouts: &[&globals_bind_group_layout, &atlas_bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(source.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some(source.vertex_entry),
                    buffers: &layouts,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment_module.as_ref().unwrap_or(&vertex_module),
                    entry_point: Some(source.fragment_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::Shader(error.to_string()));
        }

        log::info!("✓ {} compiled", source.label);
        Ok(TextPipeline {
            source: *source,
            pipeline,
            uniform_buffer,
            globals_bind_group,
            atlas_bind_group_layout,
            atlas_sampler,
        })
    }

    fn get_locations(
        &self,
        program: &Self::Program,
        names: &[&str],
    ) -> Result<Locations, RenderError> {
        Locations::from_source(&program.source, names)
    }

    fn create_buffer(&mut self, label: &str) -> Self::Buffer {
        GpuBuffer::new(&self.device, label)
    }

    fn upload_buffer(&mut self, buffer: &mut Self::Buffer, data: &[f32]) {
        buffer.write(&self.device, &self.queue, data);
    }

    fn upload_texture(&mut self, program: &Self::Program, surface: &AtlasSurface) -> Self::Texture {
        let max_dimension = self.device.limits().max_texture_dimension_2d;
        let (width, height, pixels) = texture_source(surface, max_dimension);
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let mip_level_count = mip_level_count(width, height);

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Text Node Glyph Atlas"),
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.write_level(&texture, 0, width, height, &pixels);
        for (level, (w, h, data)) in mip_chain(width, height, &pixels).iter().enumerate() {
            self.write_level(&texture, level as u32 + 1, *w, *h, data);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Text Node Atlas Bind Group"),
            layout: &program.atlas_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&program.atlas_sampler),
                },
            ],
        });

        log::debug!("glyph atlas uploaded: {width}x{height}, {mip_level_count} mip levels");
        AtlasTexture {
            _texture: texture,
            bind_group,
        }
    }

    fn set_uniforms(&mut self, program: &Self::Program, uniforms: &TextUniforms) {
        self.queue
            .write_buffer(&program.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    fn draw_triangles(&mut self, call: DrawCall<'_, Self>) {
        let Some(target) = self.target.as_ref() else {
            log::warn!("label draw without a render target; call set_target first");
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Text Node Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Text Node Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&call.program.pipeline);
            render_pass.set_bind_group(0, &call.program.globals_bind_group, &[]);
            render_pass.set_bind_group(1, &call.texture.bind_group, &[]);
            render_pass.set_vertex_buffer(call.vertex_location, call.vertices.slice());
            render_pass.set_vertex_buffer(call.glyph_location, call.glyph_coords.slice());
            render_pass.draw(0..call.vertex_count, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_atlas_uploads_single_texel() {
        let surface = AtlasSurface::default();
        let (w, h, pixels) = texture_source(&surface, 8192);
        assert_eq!((w, h), (1, 1));
        assert_eq!(pixels.len(), 4);
    }

    #[test]
    fn test_oversized_atlas_uploads_single_texel() {
        let surface = AtlasSurface::filled(4, 9, [1, 2, 3]);
        let (w, h, pixels) = texture_source(&surface, 8);
        assert_eq!((w, h), (1, 1));
        assert_eq!(&pixels[..], &[0u8, 0, 0, 0][..]);
    }

    #[test]
    fn test_atlas_pixels_borrowed_as_is() {
        let surface = AtlasSurface::filled(3, 2, [1, 2, 3]);
        let (w, h, pixels) = texture_source(&surface, 8192);
        assert_eq!((w, h), (3, 2));
        assert!(matches!(pixels, Cow::Borrowed(_)));
        assert_eq!(&pixels[..4], &[1, 2, 3, 255]);
    }
}
