//! Slot table: maps node identities to contiguous character ranges in the packed buffers.
//!
//! Invariants kept by every operation:
//! - each live node owns exactly `len(text)` consecutive slots
//! - live ranges never overlap and leave no gaps, so `[0, active_characters)` is fully used
//! - the vertex and glyph-coordinate buffers are index-aligned with the table
//!
//! Removal uses the shift-down policy: everything behind the freed range moves down by its
//! length. That is O(n) in the number of live nodes but keeps allocation order stable.

use std::collections::HashMap;

use crate::packed::PackedBuffer;
use crate::NodeId;

/// One node's range, in character-slot units.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub offset: usize,
    pub len: usize,
    /// Atlas version the glyph coordinates in this range were written for.
    /// `None` after allocation or resize, until the range is rebuilt.
    pub glyph_version: Option<u64>,
    /// Allocation sequence number. Orders empty ranges that share an offset with their
    /// neighbours.
    pub seq: u64,
}

impl Slot {
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Whether this range sits before `other` in the packed buffers.
    #[inline]
    pub fn precedes(&self, other: &Slot) -> bool {
        (self.offset, self.seq) < (other.offset, other.seq)
    }
}

/// Borrowed view of one node's geometry while it is being rebuilt.
pub struct SlotData<'a> {
    pub slot: Slot,
    pub vertices: &'a mut [f32],
    pub glyph_coords: &'a mut [f32],
}

/// Hands out slot ranges and owns the two packed buffers they index into.
pub struct BufferAllocator {
    slots: HashMap<NodeId, Slot>,
    occupied: usize,
    next_seq: u64,
    vertices: PackedBuffer,
    glyph_coords: PackedBuffer,
}

impl BufferAllocator {
    /// `stride` is the number of floats one character occupies in each buffer.
    pub fn new(stride: usize) -> Self {
        Self {
            slots: HashMap::new(),
            occupied: 0,
            next_seq: 0,
            vertices: PackedBuffer::new(stride),
            glyph_coords: PackedBuffer::new(stride),
        }
    }

    /// Appends a range of `len` slots for `id` at the end of the occupied region.
    pub fn allocate(&mut self, id: NodeId, len: usize) -> Slot {
        if self.slots.contains_key(&id) {
            log::warn!("node {id:?} allocated twice; releasing its previous range");
            self.release(id);
        }

        let offset = self.occupied;
        self.occupied += len;
        self.reserve(self.occupied);

        // Space past the occupied end may hold data from released ranges.
        self.vertices.clear_slots(offset, len);
        self.glyph_coords.clear_slots(offset, len);

        let slot = Slot {
            offset,
            len,
            glyph_version: None,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.slots.insert(id, slot);
        slot
    }

    /// Frees `id`'s range and shifts every later range down to close the hole.
    pub fn release(&mut self, id: NodeId) -> Option<Slot> {
        let slot = self.slots.remove(&id)?;

        let tail = self.occupied.saturating_sub(slot.end());
        self.vertices.move_slots(slot.end(), slot.offset, tail);
        self.glyph_coords.move_slots(slot.end(), slot.offset, tail);

        for other in self.slots.values_mut() {
            if slot.precedes(other) {
                other.offset -= slot.len;
            }
        }
        self.occupied = self.occupied.saturating_sub(slot.len);
        Some(slot)
    }

    /// Changes the length of `id`'s range in place.
    ///
    /// Every range lying after it (by position, not by id) shifts by `new_len - old_len`.
    /// The overlapping prefix keeps its data; the resized slot's glyph coordinates are
    /// marked stale.
    pub fn resize(&mut self, id: NodeId, new_len: usize) -> Option<Slot> {
        let slot = *self.slots.get(&id)?;
        if slot.len == new_len {
            return Some(slot);
        }

        let tail = self.occupied.saturating_sub(slot.end());
        let new_end = slot.offset + new_len;
        let new_occupied = self.occupied - slot.len + new_len;

        if new_len > slot.len {
            self.reserve(new_occupied);
        }
        self.vertices.move_slots(slot.end(), new_end, tail);
        self.glyph_coords.move_slots(slot.end(), new_end, tail);
        if new_len > slot.len {
            self.vertices.clear_slots(slot.end(), new_len - slot.len);
            self.glyph_coords.clear_slots(slot.end(), new_len - slot.len);
        }

        for other in self.slots.values_mut() {
            if slot.precedes(other) {
                other.offset = other.offset + new_len - slot.len;
            }
        }

        let resized = Slot {
            len: new_len,
            glyph_version: None,
            ..slot
        };
        self.slots.insert(id, resized);
        self.occupied = new_occupied;
        Some(resized)
    }

    #[inline]
    pub fn slot(&self, id: NodeId) -> Option<Slot> {
        self.slots.get(&id).copied()
    }

    /// Records that `id`'s glyph coordinates match atlas `version`.
    pub fn mark_glyphs_written(&mut self, id: NodeId, version: u64) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.glyph_version = Some(version);
        }
    }

    /// Mutable access to `id`'s range in both buffers.
    pub fn slot_data_mut(&mut self, id: NodeId) -> Option<SlotData<'_>> {
        let slot = *self.slots.get(&id)?;
        Some(SlotData {
            slot,
            vertices: self.vertices.slots_mut(slot.offset, slot.len),
            glyph_coords: self.glyph_coords.slots_mut(slot.offset, slot.len),
        })
    }

    /// Live ranges in buffer order.
    pub fn iter(&self) -> Vec<(NodeId, Slot)> {
        let mut out: Vec<(NodeId, Slot)> = self.slots.iter().map(|(id, s)| (*id, *s)).collect();
        out.sort_by_key(|(_, s)| (s.offset, s.seq));
        out
    }

    /// Nodes whose glyph coordinates were not written for atlas `version`.
    pub fn stale_glyphs(&self, version: u64) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .filter(move |(_, slot)| slot.glyph_version != Some(version))
            .map(|(id, _)| *id)
    }

    /// Total number of characters across all live labels.
    #[inline]
    pub fn active_characters(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    /// Occupied part of the vertex-position buffer.
    #[inline]
    pub fn vertices(&self) -> &[f32] {
        self.vertices.slots(0, self.occupied)
    }

    /// Occupied part of the glyph-coordinate buffer.
    #[inline]
    pub fn glyph_coords(&self) -> &[f32] {
        self.glyph_coords.slots(0, self.occupied)
    }

    /// Capacity of each buffer in character slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.vertices.capacity()
    }

    fn reserve(&mut self, slots: usize) {
        let grew = self.vertices.reserve_slots(slots);
        self.glyph_coords.reserve_slots(slots);
        if grew {
            log::debug!(
                "packed text buffers grown to {} character slots",
                self.vertices.capacity()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ATTRIBUTES_PER_CHARACTER;

    fn allocator() -> BufferAllocator {
        BufferAllocator::new(ATTRIBUTES_PER_CHARACTER)
    }

    fn fill(alloc: &mut BufferAllocator, id: NodeId, value: f32) {
        let data = alloc.slot_data_mut(id).unwrap();
        data.vertices.fill(value);
        data.glyph_coords.fill(-value);
    }

    fn assert_contiguous(alloc: &BufferAllocator) {
        let mut expected = 0;
        for (_, slot) in alloc.iter() {
            assert_eq!(slot.offset, expected, "gap or overlap at {slot:?}");
            expected = slot.end();
        }
        assert_eq!(expected, alloc.active_characters());
    }

    #[test]
    fn test_allocate_appends() {
        let mut alloc = allocator();
        assert_eq!(alloc.allocate(NodeId(1), 2).offset, 0);
        assert_eq!(alloc.allocate(NodeId(2), 1).offset, 2);
        assert_eq!(alloc.active_characters(), 3);
        assert_contiguous(&alloc);
    }

    #[test]
    fn test_release_shifts_later_nodes_and_keeps_data() {
        let mut alloc = allocator();
        alloc.allocate(NodeId(1), 2);
        alloc.allocate(NodeId(2), 1);
        fill(&mut alloc, NodeId(2), 5.0);

        alloc.release(NodeId(1));

        let slot = alloc.slot(NodeId(2)).unwrap();
        assert_eq!(slot.offset, 0);
        assert_eq!(alloc.active_characters(), 1);
        assert!(alloc.vertices().iter().all(|v| *v == 5.0));
        assert!(alloc.glyph_coords().iter().all(|v| *v == -5.0));
    }

    #[test]
    fn test_release_shifts_by_exact_length() {
        let mut alloc = allocator();
        alloc.allocate(NodeId(1), 3);
        alloc.allocate(NodeId(2), 4);
        alloc.allocate(NodeId(3), 2);
        alloc.allocate(NodeId(4), 5);

        let before_3 = alloc.slot(NodeId(3)).unwrap().offset;
        let before_4 = alloc.slot(NodeId(4)).unwrap().offset;
        alloc.release(NodeId(2));

        assert_eq!(alloc.slot(NodeId(1)).unwrap().offset, 0);
        assert_eq!(alloc.slot(NodeId(3)).unwrap().offset, before_3 - 4);
        assert_eq!(alloc.slot(NodeId(4)).unwrap().offset, before_4 - 4);
        assert_contiguous(&alloc);
    }

    #[test]
    fn test_freed_range_is_reused_by_same_length() {
        let mut alloc = allocator();
        alloc.allocate(NodeId(1), 3);
        let a = alloc.allocate(NodeId(2), 4);
        alloc.release(NodeId(2));
        let b = alloc.allocate(NodeId(3), 4);

        assert_eq!((a.offset, a.len), (b.offset, b.len));
        assert_contiguous(&alloc);
    }

    #[test]
    fn test_resize_grows_and_shifts_followers() {
        let mut alloc = allocator();
        alloc.allocate(NodeId(1), 1);
        alloc.allocate(NodeId(3), 2);
        alloc.allocate(NodeId(4), 3);
        alloc.allocate(NodeId(5), 1);
        fill(&mut alloc, NodeId(5), 9.0);

        let resized = alloc.resize(NodeId(3), 5).unwrap();

        assert_eq!(resized.len, 5);
        assert_eq!(resized.glyph_version, None);
        assert_eq!(alloc.slot(NodeId(1)).unwrap().offset, 0);
        assert_eq!(alloc.slot(NodeId(4)).unwrap().offset, 3 + 3);
        assert_eq!(alloc.slot(NodeId(5)).unwrap().offset, 6 + 3);
        assert_eq!(alloc.active_characters(), 10);
        let data = alloc.slot_data_mut(NodeId(5)).unwrap();
        assert!(data.vertices.iter().all(|v| *v == 9.0));
        assert_contiguous(&alloc);
    }

    #[test]
    fn test_resize_follows_offsets_not_ids() {
        let mut alloc = allocator();
        // Ids deliberately out of allocation order.
        alloc.allocate(NodeId(9), 2);
        alloc.allocate(NodeId(2), 2);
        alloc.allocate(NodeId(5), 2);

        alloc.resize(NodeId(9), 1);

        assert_eq!(alloc.slot(NodeId(2)).unwrap().offset, 1);
        assert_eq!(alloc.slot(NodeId(5)).unwrap().offset, 3);
        assert_contiguous(&alloc);
    }

    #[test]
    fn test_growing_empty_slot_shifts_follower_at_same_offset() {
        let mut alloc = allocator();
        alloc.allocate(NodeId(1), 0);
        alloc.allocate(NodeId(2), 3);
        fill(&mut alloc, NodeId(2), 4.0);
        assert_eq!(alloc.slot(NodeId(2)).unwrap().offset, 0);

        alloc.resize(NodeId(1), 2);

        assert_eq!(alloc.slot(NodeId(1)).unwrap().offset, 0);
        assert_eq!(alloc.slot(NodeId(2)).unwrap().offset, 2);
        assert_eq!(alloc.active_characters(), 5);
        let data = alloc.slot_data_mut(NodeId(2)).unwrap();
        assert!(data.vertices.iter().all(|v| *v == 4.0));
        assert_contiguous(&alloc);
    }

    #[test]
    fn test_empty_slots_sharing_an_offset_keep_their_order() {
        let mut alloc = allocator();
        alloc.allocate(NodeId(1), 0);
        alloc.allocate(NodeId(2), 0);
        alloc.allocate(NodeId(3), 0);
        alloc.allocate(NodeId(4), 2);

        // Growing the middle one moves only what was allocated after it.
        alloc.resize(NodeId(2), 1);
        assert_eq!(alloc.slot(NodeId(1)).unwrap().offset, 0);
        assert_eq!(alloc.slot(NodeId(3)).unwrap().offset, 1);
        assert_eq!(alloc.slot(NodeId(4)).unwrap().offset, 1);
        assert_contiguous(&alloc);

        alloc.release(NodeId(2));
        assert_eq!(alloc.slot(NodeId(3)).unwrap().offset, 0);
        assert_eq!(alloc.slot(NodeId(4)).unwrap().offset, 0);
        assert_eq!(alloc.active_characters(), 2);
        assert_contiguous(&alloc);
    }

    #[test]
    fn test_stale_glyphs_lists_unwritten_slots() {
        let mut alloc = allocator();
        alloc.allocate(NodeId(1), 1);
        alloc.allocate(NodeId(2), 1);
        alloc.mark_glyphs_written(NodeId(1), 3);

        let stale: Vec<NodeId> = alloc.stale_glyphs(3).collect();
        assert_eq!(stale, vec![NodeId(2)]);
        assert_eq!(alloc.stale_glyphs(4).count(), 2);
    }

    #[test]
    fn test_growth_preserves_existing_slots() {
        let mut alloc = allocator();
        alloc.allocate(NodeId(1), 2);
        fill(&mut alloc, NodeId(1), 3.0);
        let capacity = alloc.capacity();

        alloc.allocate(NodeId(2), capacity * 4);

        assert!(alloc.capacity() >= capacity * 4 + 2);
        let data = alloc.slot_data_mut(NodeId(1)).unwrap();
        assert!(data.vertices.iter().all(|v| *v == 3.0));
    }

    #[test]
    fn test_release_unknown_node_is_none() {
        let mut alloc = allocator();
        assert!(alloc.release(NodeId(42)).is_none());
        assert_eq!(alloc.active_characters(), 0);
    }

    #[test]
    fn test_double_allocate_replaces_range() {
        let mut alloc = allocator();
        alloc.allocate(NodeId(1), 2);
        alloc.allocate(NodeId(2), 2);
        alloc.allocate(NodeId(1), 3);

        assert_eq!(alloc.node_count(), 2);
        assert_eq!(alloc.slot(NodeId(2)).unwrap().offset, 0);
        assert_eq!(alloc.slot(NodeId(1)).unwrap().offset, 2);
        assert_contiguous(&alloc);
    }
}
