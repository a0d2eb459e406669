//! Binding Slot Tables
//!
//! A [`SlotAllocator`] tracks which descriptor occupies each of a fixed number
//! of hardware binding points for one [`SlotKind`]. Allocation always takes
//! the lowest free index, so the slot layout depends only on the sequence of
//! bind/release calls.

use smallvec::SmallVec;

use crate::descriptors::{
    BindingPoint, SampledTexture, SlotDescriptor, SlotKind, StorageBufferRange, UniformBufferRange,
};
use crate::errors::{BinderyError, Result};

/// Upper bound on any table's capacity; snapshot counts are 16-bit.
pub const MAX_SLOT_CAPACITY: u32 = u16::MAX as u32;

// ─── Reservation Bits ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct ReservationBits {
    words: SmallVec<[u64; 1]>,
}

impl ReservationBits {
    fn with_len(len: usize) -> Self {
        Self {
            words: SmallVec::from_elem(0, len.div_ceil(64)),
        }
    }

    #[inline]
    fn get(&self, index: usize) -> bool {
        self.words[index / 64] & (1 << (index % 64)) != 0
    }

    #[inline]
    fn set(&mut self, index: usize) {
        self.words[index / 64] |= 1 << (index % 64);
    }

    #[inline]
    fn clear(&mut self, index: usize) {
        self.words[index / 64] &= !(1 << (index % 64));
    }

    /// Lowest clear bit below `len`.
    fn first_clear(&self, len: usize) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, word)| **word != u64::MAX)
            .map(|(i, word)| i * 64 + word.trailing_ones() as usize)
            .filter(|&index| index < len)
    }

    /// Set bits in ascending order.
    fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut remaining = word;
            std::iter::from_fn(move || {
                if remaining == 0 {
                    return None;
                }
                let bit = remaining.trailing_zeros() as usize;
                remaining &= remaining - 1;
                Some(i * 64 + bit)
            })
        })
    }

    #[cfg(test)]
    fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    fn reset(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }
}

// ─── Slot Allocator ───────────────────────────────────────────────────────────

/// Fixed-capacity slot table for one descriptor type.
///
/// The number of reserved slots always equals the number of set reservation
/// bits. A reserved slot holds either a descriptor or the sentinel (reserved
/// through [`reserve_without_descriptor`](Self::reserve_without_descriptor)).
#[derive(Debug, Clone)]
pub struct SlotAllocator<D: SlotDescriptor> {
    descriptors: Vec<D>,
    reserved: ReservationBits,
    reserved_count: usize,
}

impl<D: SlotDescriptor> SlotAllocator<D> {
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        assert!(
            capacity <= MAX_SLOT_CAPACITY,
            "{} slot capacity {capacity} exceeds {MAX_SLOT_CAPACITY}",
            D::KIND
        );
        let capacity = capacity as usize;
        Self {
            descriptors: vec![D::sentinel(); capacity],
            reserved: ReservationBits::with_len(capacity),
            reserved_count: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> SlotKind {
        D::KIND
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.descriptors.len() as u32
    }

    #[inline]
    #[must_use]
    pub fn reserved_count(&self) -> usize {
        self.reserved_count
    }

    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.descriptors.len() - self.reserved_count
    }

    #[inline]
    #[must_use]
    pub fn is_reserved(&self, slot: BindingPoint) -> bool {
        slot.index() < self.descriptors.len() && self.reserved.get(slot.index())
    }

    /// Descriptor bound at `slot`; `None` when the slot is free or reserved
    /// without a descriptor.
    #[must_use]
    pub fn get(&self, slot: BindingPoint) -> Option<&D> {
        self.descriptors
            .get(slot.index())
            .filter(|desc| !desc.is_sentinel())
    }

    /// Slot currently holding `desc`.
    #[must_use]
    pub fn find_bound(&self, desc: &D) -> Option<BindingPoint> {
        if desc.is_sentinel() {
            return None;
        }
        self.descriptors
            .iter()
            .position(|bound| bound == desc)
            .map(|index| BindingPoint(index as u32))
    }

    /// Returns the slot holding `desc`, binding it to the lowest free slot
    /// first if needed. `None` means the table is exhausted.
    ///
    /// # Panics
    ///
    /// If `desc` is the sentinel.
    pub fn acquire(&mut self, desc: D) -> Option<BindingPoint> {
        assert!(!desc.is_sentinel(), "cannot bind the null {} descriptor", D::KIND);
        if let Some(slot) = self.find_bound(&desc) {
            return Some(slot);
        }
        let slot = self.reserve_without_descriptor()?;
        self.descriptors[slot.index()] = desc;
        Some(slot)
    }

    /// Reserves the lowest free slot without associating a descriptor.
    pub fn reserve_without_descriptor(&mut self) -> Option<BindingPoint> {
        let index = self.reserved.first_clear(self.descriptors.len())?;
        self.reserved.set(index);
        self.reserved_count += 1;
        Some(BindingPoint(index as u32))
    }

    /// Puts `desc` at `slot` unconditionally and marks it reserved. Used when
    /// replaying a snapshot, where slot positions must be reproduced exactly.
    pub fn force_set(&mut self, slot: BindingPoint, desc: D) -> Result<()> {
        let capacity = self.capacity();
        let entry = self
            .descriptors
            .get_mut(slot.index())
            .ok_or(BinderyError::SlotOutOfRange {
                kind: D::KIND,
                slot: slot.get(),
                capacity,
            })?;
        *entry = desc;
        if !self.reserved.get(slot.index()) {
            self.reserved.set(slot.index());
            self.reserved_count += 1;
        }
        Ok(())
    }

    /// Frees every slot holding `desc` and returns the lowest of them.
    pub fn release(&mut self, desc: &D) -> Result<BindingPoint> {
        let mut released = None;
        if !desc.is_sentinel() {
            for index in 0..self.descriptors.len() {
                if self.descriptors[index] == *desc {
                    self.free(index);
                    released.get_or_insert(BindingPoint(index as u32));
                }
            }
        }
        released.ok_or(BinderyError::ReleaseOfUnboundDescriptor { kind: D::KIND })
    }

    /// Frees `slot` whatever it holds, returning its descriptor if it had one.
    pub fn release_slot(&mut self, slot: BindingPoint) -> Result<Option<D>> {
        if !self.is_reserved(slot) {
            return Err(BinderyError::ReleaseOfUnboundDescriptor { kind: D::KIND });
        }
        let previous = self.get(slot).copied();
        self.free(slot.index());
        Ok(previous)
    }

    /// Visits reserved slots in ascending order. Stops and returns `false` as
    /// soon as `visit` does.
    pub fn for_each_reserved(&self, mut visit: impl FnMut(BindingPoint, &D) -> bool) -> bool {
        self.reserved
            .iter_set()
            .all(|index| visit(BindingPoint(index as u32), &self.descriptors[index]))
    }

    /// Reserved slots in ascending order, sentinel included.
    pub fn iter_reserved(&self) -> impl Iterator<Item = (BindingPoint, &D)> + '_ {
        self.reserved
            .iter_set()
            .map(|index| (BindingPoint(index as u32), &self.descriptors[index]))
    }

    /// Frees every slot.
    pub fn clear(&mut self) {
        self.descriptors.fill(D::sentinel());
        self.reserved.reset();
        self.reserved_count = 0;
    }

    fn free(&mut self, index: usize) {
        self.descriptors[index] = D::sentinel();
        if self.reserved.get(index) {
            self.reserved.clear(index);
            self.reserved_count -= 1;
        }
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        assert_eq!(self.reserved.count(), self.reserved_count);
        for (index, desc) in self.descriptors.iter().enumerate() {
            if !desc.is_sentinel() {
                assert!(self.reserved.get(index), "descriptor in unreserved slot {index}");
            }
        }
        assert!(self.reserved_count <= self.descriptors.len());
    }
}

// ─── Slot Tables ──────────────────────────────────────────────────────────────

/// The three slot tables of one device context.
#[derive(Debug, Clone)]
pub struct SlotTables {
    pub(crate) uniform_buffers: SlotAllocator<UniformBufferRange>,
    pub(crate) storage_buffers: SlotAllocator<StorageBufferRange>,
    pub(crate) textures: SlotAllocator<SampledTexture>,
}

impl SlotTables {
    #[must_use]
    pub fn new(uniform_buffers: u32, storage_buffers: u32, textures: u32) -> Self {
        Self {
            uniform_buffers: SlotAllocator::new(uniform_buffers),
            storage_buffers: SlotAllocator::new(storage_buffers),
            textures: SlotAllocator::new(textures),
        }
    }

    #[inline]
    #[must_use]
    pub fn get<D: SlotDescriptor>(&self) -> &SlotAllocator<D> {
        D::table(self)
    }

    #[inline]
    pub fn get_mut<D: SlotDescriptor>(&mut self) -> &mut SlotAllocator<D> {
        D::table_mut(self)
    }

    #[must_use]
    pub fn uniform_buffers(&self) -> &SlotAllocator<UniformBufferRange> {
        &self.uniform_buffers
    }

    #[must_use]
    pub fn storage_buffers(&self) -> &SlotAllocator<StorageBufferRange> {
        &self.storage_buffers
    }

    #[must_use]
    pub fn textures(&self) -> &SlotAllocator<SampledTexture> {
        &self.textures
    }

    /// Reserves the lowest free slot of `kind` without a descriptor.
    pub fn reserve(&mut self, kind: SlotKind) -> Option<BindingPoint> {
        match kind {
            SlotKind::UniformBuffer => self.uniform_buffers.reserve_without_descriptor(),
            SlotKind::StorageBuffer => self.storage_buffers.reserve_without_descriptor(),
            SlotKind::Texture => self.textures.reserve_without_descriptor(),
        }
    }

    pub fn release_slot(&mut self, kind: SlotKind, slot: BindingPoint) -> Result<()> {
        match kind {
            SlotKind::UniformBuffer => self.uniform_buffers.release_slot(slot).map(drop),
            SlotKind::StorageBuffer => self.storage_buffers.release_slot(slot).map(drop),
            SlotKind::Texture => self.textures.release_slot(slot).map(drop),
        }
    }

    #[must_use]
    pub fn capacity(&self, kind: SlotKind) -> u32 {
        match kind {
            SlotKind::UniformBuffer => self.uniform_buffers.capacity(),
            SlotKind::StorageBuffer => self.storage_buffers.capacity(),
            SlotKind::Texture => self.textures.capacity(),
        }
    }

    #[must_use]
    pub fn reserved_count(&self, kind: SlotKind) -> usize {
        match kind {
            SlotKind::UniformBuffer => self.uniform_buffers.reserved_count(),
            SlotKind::StorageBuffer => self.storage_buffers.reserved_count(),
            SlotKind::Texture => self.textures.reserved_count(),
        }
    }

    pub fn clear(&mut self) {
        self.uniform_buffers.clear();
        self.storage_buffers.clear();
        self.textures.clear();
    }
}
