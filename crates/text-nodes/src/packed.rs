//! Growable flat `f32` buffers holding per-character attributes back to back.

/// Initial capacity of a packed buffer, in floats.
pub const INITIAL_PACKED_LEN: usize = 64;

/// Grows `buffer` so it holds at least `required_count * stride` floats.
///
/// Growth doubles the current length until it fits, so repeated appends stay amortized O(1).
/// Existing contents are preserved and new space is zeroed. Returns `true` if the buffer grew.
pub fn extend_array(buffer: &mut Vec<f32>, required_count: usize, stride: usize) -> bool {
    let required = required_count * stride;
    if buffer.len() >= required {
        return false;
    }

    let mut new_len = buffer.len().max(INITIAL_PACKED_LEN);
    while new_len < required {
        new_len *= 2;
    }
    buffer.resize(new_len, 0.0);
    true
}

/// Copies `len` floats starting at `from` to `to`. The ranges may overlap.
pub fn copy_array_part(buffer: &mut [f32], from: usize, to: usize, len: usize) {
    if len == 0 || from == to {
        return;
    }
    buffer.copy_within(from..from + len, to);
}

/// A packed buffer addressed in character slots of `stride` floats each.
#[derive(Clone, Debug)]
pub struct PackedBuffer {
    data: Vec<f32>,
    stride: usize,
}

impl PackedBuffer {
    pub fn new(stride: usize) -> Self {
        Self {
            data: vec![0.0; INITIAL_PACKED_LEN],
            stride,
        }
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Capacity in character slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len() / self.stride
    }

    /// Makes room for `slots` character slots. Returns `true` if the backing storage grew.
    pub fn reserve_slots(&mut self, slots: usize) -> bool {
        extend_array(&mut self.data, slots, self.stride)
    }

    /// Moves `len` slots from slot `from` to slot `to`.
    pub fn move_slots(&mut self, from: usize, to: usize, len: usize) {
        copy_array_part(
            &mut self.data,
            from * self.stride,
            to * self.stride,
            len * self.stride,
        );
    }

    /// Zeroes `len` slots starting at `offset`.
    pub fn clear_slots(&mut self, offset: usize, len: usize) {
        let start = offset * self.stride;
        self.data[start..start + len * self.stride].fill(0.0);
    }

    #[inline]
    pub fn slots(&self, offset: usize, len: usize) -> &[f32] {
        &self.data[offset * self.stride..(offset + len) * self.stride]
    }

    #[inline]
    pub fn slots_mut(&mut self, offset: usize, len: usize) -> &mut [f32] {
        &mut self.data[offset * self.stride..(offset + len) * self.stride]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_array_preserves_contents() {
        let mut buffer = vec![1.0, 2.0, 3.0];
        assert!(extend_array(&mut buffer, 100, 12));
        assert!(buffer.len() >= 1200);
        assert_eq!(&buffer[..3], &[1.0, 2.0, 3.0]);
        assert!(buffer[3..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_extend_array_noop_when_large_enough() {
        let mut buffer = vec![0.0; 128];
        assert!(!extend_array(&mut buffer, 10, 12));
        assert_eq!(buffer.len(), 128);
    }

    #[test]
    fn test_copy_array_part_overlapping() {
        let mut buffer = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        copy_array_part(&mut buffer, 2, 0, 4);
        assert_eq!(buffer, [2.0, 3.0, 4.0, 5.0, 4.0, 5.0]);
    }

    #[test]
    fn test_move_slots_uses_stride() {
        let mut packed = PackedBuffer::new(2);
        packed.slots_mut(1, 1).copy_from_slice(&[7.0, 8.0]);
        packed.move_slots(1, 0, 1);
        assert_eq!(packed.slots(0, 1), &[7.0, 8.0]);
    }
}
