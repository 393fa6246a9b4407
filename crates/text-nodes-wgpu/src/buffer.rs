//! Growable GPU vertex buffer fed from packed `f32` slices.

/// Initial capacity in floats.
pub const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// New capacity for a buffer holding `current` floats that must fit `required`.
#[inline]
pub fn grown_capacity(current: usize, required: usize) -> usize {
    if required <= current {
        current
    } else {
        (required * 2).next_power_of_two()
    }
}

/// Vertex buffer recreated with doubled capacity whenever an upload outgrows it.
pub struct GpuBuffer {
    label: String,
    buffer: wgpu::Buffer,
    capacity: usize,
    len: usize,
}

impl GpuBuffer {
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        Self {
            label: label.to_string(),
            buffer: Self::allocate(device, label, INITIAL_BUFFER_CAPACITY),
            capacity: INITIAL_BUFFER_CAPACITY,
            len: 0,
        }
    }

    fn allocate(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (capacity * std::mem::size_of::<f32>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Replaces the contents with `data`.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[f32]) {
        let capacity = grown_capacity(self.capacity, data.len());
        if capacity != self.capacity {
            log::debug!("{}: growing to {} floats", self.label, capacity);
            self.capacity = capacity;
            self.buffer = Self::allocate(device, &self.label, capacity);
        }

        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
        self.len = data.len();
    }

    /// Slice covering the last upload.
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..(self.len * std::mem::size_of::<f32>()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_kept_while_it_fits() {
        assert_eq!(grown_capacity(1024, 0), 1024);
        assert_eq!(grown_capacity(1024, 1024), 1024);
    }

    #[test]
    fn test_capacity_grows_to_power_of_two() {
        assert_eq!(grown_capacity(1024, 1025), 4096);
        assert_eq!(grown_capacity(16, 100), 256);
    }
}
