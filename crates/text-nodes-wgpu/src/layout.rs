//! Vertex stream layouts for the label program.
//!
//! Positions and glyph coordinates live in separate tightly packed `f32` buffers, so each
//! shader attribute gets its own single-attribute `vec2<f32>` stream.

/// Bytes per vertex in either stream.
pub const VEC2_STRIDE: wgpu::BufferAddress = std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress;

const VERTEX_POS: &[wgpu::VertexAttribute] = &[wgpu::VertexAttribute {
    offset: 0,
    shader_location: 0,
    format: wgpu::VertexFormat::Float32x2,
}];

const GLYPH_COORD: &[wgpu::VertexAttribute] = &[wgpu::VertexAttribute {
    offset: 0,
    shader_location: 1,
    format: wgpu::VertexFormat::Float32x2,
}];

const fn vec2_stream(attributes: &'static [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: VEC2_STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// Stream layouts indexed by shader location: `[vertex_pos, glyph_coord]`.
pub const fn stream_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    [vec2_stream(VERTEX_POS), vec2_stream(GLYPH_COORD)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_match_shader_locations() {
        let layouts = stream_layouts();
        for (location, layout) in layouts.iter().enumerate() {
            assert_eq!(layout.array_stride, 8);
            assert_eq!(layout.attributes.len(), 1);
            assert_eq!(layout.attributes[0].shader_location, location as u32);
            assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x2);
        }
    }
}
