//! Resource Ids
//!
//! [`ResourceId`] is a small, stable identity for a resource, decoupled from
//! its native handle. Ids are `{index, generation}` pairs: the 16-bit index
//! is recycled through a free list, and the generation is bumped every time
//! an index is released, so a stale copy of a deleted id no longer matches and
//! is rejected instead of silently aliasing the resource that reused its index.

use std::fmt;
use std::num::NonZeroU16;

use smallvec::SmallVec;
use thiserror::Error;

use crate::handle::{GenerationField, PackedHandle};

/// Generations wrap at this mask so they always fit a packed handle.
const GENERATION_MASK: u16 = GenerationField::MAX as u16;

/// Generation-tagged resource identifier. Index 0 is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    index: NonZeroU16,
    generation: u16,
}

impl ResourceId {
    /// Builds an id; the generation is reduced to the packed-handle width.
    #[inline]
    #[must_use]
    pub const fn new(index: NonZeroU16, generation: u16) -> Self {
        Self {
            index,
            generation: generation & GENERATION_MASK,
        }
    }

    /// `None` when `index` is the reserved value 0.
    #[inline]
    #[must_use]
    pub const fn from_parts(index: u16, generation: u16) -> Option<Self> {
        match NonZeroU16::new(index) {
            Some(index) => Some(Self::new(index, generation)),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        self.index.get()
    }

    #[inline]
    #[must_use]
    pub const fn generation(self) -> u16 {
        self.generation
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Failures of [`ResourceTable`] operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceIdError {
    /// Every 16-bit index is live.
    #[error("Resource id space exhausted: {live} ids are live")]
    Exhausted { live: usize },

    /// The index was never handed out by this table.
    #[error("Unknown resource id {0}")]
    Unknown(ResourceId),

    /// The index was released (and possibly reissued) since this id was made.
    #[error("Stale resource id {id}: index is now at generation {current}")]
    Stale { id: ResourceId, current: u16 },

    /// The id is live but no packed handle has been bound to it.
    #[error("Resource id {0} has no packed handle bound")]
    Unbound(ResourceId),
}

#[derive(Debug, Clone, Copy, Default)]
struct TableEntry {
    generation: u16,
    live: bool,
    handle: Option<PackedHandle>,
}

/// Issues and recycles [`ResourceId`]s and maps them to [`PackedHandle`]s.
///
/// Released indices are reused last-in first-out. The table never aliases:
/// a reused index always carries a newer generation than any id previously
/// issued for it (modulo generation wrap-around).
#[derive(Debug)]
pub struct ResourceTable {
    /// Indexed by `ResourceId::index`; entry 0 is a placeholder.
    entries: Vec<TableEntry>,
    free_list: SmallVec<[NonZeroU16; 32]>,
    live: usize,
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTable {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-sizes storage for `expected` simultaneously live ids.
    #[must_use]
    pub fn with_capacity(expected: usize) -> Self {
        let mut entries = Vec::with_capacity(expected + 1);
        entries.push(TableEntry::default());
        Self {
            entries,
            free_list: SmallVec::new(),
            live: 0,
        }
    }

    /// Issues a fresh id, reusing the most recently released index first.
    pub fn new_id(&mut self) -> Result<ResourceId, ResourceIdError> {
        if let Some(index) = self.free_list.pop() {
            let entry = &mut self.entries[usize::from(index.get())];
            debug_assert!(!entry.live, "free list holds a live index");
            entry.live = true;
            self.live += 1;
            return Ok(ResourceId::new(index, entry.generation));
        }

        let index = u16::try_from(self.entries.len())
            .ok()
            .and_then(NonZeroU16::new)
            .ok_or(ResourceIdError::Exhausted { live: self.live })?;
        self.entries.push(TableEntry {
            generation: 0,
            live: true,
            handle: None,
        });
        self.live += 1;
        Ok(ResourceId::new(index, 0))
    }

    /// Releases `id` for reuse and returns the handle that was bound to it.
    ///
    /// The index's generation is bumped, so `id` and every copy of it become
    /// stale; deleting it a second time fails with [`ResourceIdError::Stale`].
    pub fn delete_id(&mut self, id: ResourceId) -> Result<Option<PackedHandle>, ResourceIdError> {
        let entry = self.live_entry_mut(id)?;
        entry.live = false;
        entry.generation = entry.generation.wrapping_add(1) & GENERATION_MASK;
        let handle = entry.handle.take();

        self.free_list.push(id.index);
        self.live -= 1;
        log::trace!("Released resource id {id}");
        Ok(handle)
    }

    /// Associates `handle` with `id`, returning the previous handle.
    pub fn bind_handle(
        &mut self,
        id: ResourceId,
        handle: PackedHandle,
    ) -> Result<Option<PackedHandle>, ResourceIdError> {
        let entry = self.live_entry_mut(id)?;
        Ok(entry.handle.replace(handle))
    }

    /// The handle bound to `id`; `None` when `id` is stale, unknown or unbound.
    #[must_use]
    pub fn handle_of(&self, id: ResourceId) -> Option<PackedHandle> {
        self.resolve(id).ok()
    }

    /// Like [`handle_of`](Self::handle_of) but says why a lookup failed.
    pub fn resolve(&self, id: ResourceId) -> Result<PackedHandle, ResourceIdError> {
        self.live_entry(id)?
            .handle
            .ok_or(ResourceIdError::Unbound(id))
    }

    #[must_use]
    pub fn is_live(&self, id: ResourceId) -> bool {
        self.live_entry(id).is_ok()
    }

    /// Number of live ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Indices waiting for reuse.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Live ids with a bound handle, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, PackedHandle)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, entry)| entry.live)
            .filter_map(|(index, entry)| {
                let id = ResourceId::from_parts(index as u16, entry.generation)?;
                Some((id, entry.handle?))
            })
    }

    fn live_entry(&self, id: ResourceId) -> Result<&TableEntry, ResourceIdError> {
        let entry = self
            .entries
            .get(usize::from(id.index()))
            .ok_or(ResourceIdError::Unknown(id))?;
        if entry.live && entry.generation == id.generation {
            Ok(entry)
        } else {
            Err(ResourceIdError::Stale {
                id,
                current: entry.generation,
            })
        }
    }

    fn live_entry_mut(&mut self, id: ResourceId) -> Result<&mut TableEntry, ResourceIdError> {
        let entry = self
            .entries
            .get_mut(usize::from(id.index()))
            .ok_or(ResourceIdError::Unknown(id))?;
        if entry.live && entry.generation == id.generation {
            Ok(entry)
        } else {
            Err(ResourceIdError::Stale {
                id,
                current: entry.generation,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{NativeHandle, ObjectKind};

    #[test]
    fn test_ids_start_at_one_and_count_up() {
        let mut table = ResourceTable::new();
        let a = table.new_id().unwrap();
        let b = table.new_id().unwrap();
        assert_eq!(a.index(), 1);
        assert_eq!(b.index(), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_deleted_index_is_reused_with_new_generation() {
        let mut table = ResourceTable::new();
        let a = table.new_id().unwrap();
        let _b = table.new_id().unwrap();
        table.delete_id(a).unwrap();

        let c = table.new_id().unwrap();
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
        assert!(!table.is_live(a));
        assert!(table.is_live(c));
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut table = ResourceTable::new();
        let ids: Vec<_> = (0..4).map(|_| table.new_id().unwrap()).collect();
        table.delete_id(ids[1]).unwrap();
        table.delete_id(ids[3]).unwrap();
        assert_eq!(table.new_id().unwrap().index(), ids[3].index());
        assert_eq!(table.new_id().unwrap().index(), ids[1].index());
        assert_eq!(table.new_id().unwrap().index(), 5);
    }

    #[test]
    fn test_double_delete_is_rejected() {
        let mut table = ResourceTable::new();
        let a = table.new_id().unwrap();
        table.delete_id(a).unwrap();
        assert!(matches!(table.delete_id(a), Err(ResourceIdError::Stale { .. })));
        assert_eq!(table.free_count(), 1);
    }

    #[test]
    fn test_stale_id_does_not_resolve_to_new_resource() {
        let mut table = ResourceTable::new();
        let old = table.new_id().unwrap();
        table
            .bind_handle(old, PackedHandle::encode(old, ObjectKind::Texture2D, NativeHandle(10)))
            .unwrap();
        table.delete_id(old).unwrap();

        let new = table.new_id().unwrap();
        let new_handle = PackedHandle::encode(new, ObjectKind::UniformBuffer, NativeHandle(20));
        table.bind_handle(new, new_handle).unwrap();

        assert_eq!(table.handle_of(old), None);
        assert_eq!(table.handle_of(new), Some(new_handle));
        assert!(matches!(
            table.bind_handle(old, new_handle),
            Err(ResourceIdError::Stale { .. })
        ));
    }

    #[test]
    fn test_unbound_and_unknown() {
        let mut table = ResourceTable::new();
        let a = table.new_id().unwrap();
        assert_eq!(table.resolve(a), Err(ResourceIdError::Unbound(a)));

        let never = ResourceId::from_parts(99, 0).unwrap();
        assert_eq!(table.resolve(never), Err(ResourceIdError::Unknown(never)));
    }

    #[test]
    fn test_delete_returns_bound_handle() {
        let mut table = ResourceTable::new();
        let a = table.new_id().unwrap();
        let handle = PackedHandle::encode(a, ObjectKind::Sampler, NativeHandle(3));
        table.bind_handle(a, handle).unwrap();
        assert_eq!(table.delete_id(a), Ok(Some(handle)));
    }

    #[test]
    fn test_generation_wraps_within_handle_width() {
        let mut table = ResourceTable::new();
        let mut id = table.new_id().unwrap();
        for _ in 0..=GENERATION_MASK {
            table.delete_id(id).unwrap();
            id = table.new_id().unwrap();
            assert!(id.generation() <= GENERATION_MASK);
        }
        assert_eq!(id.generation(), 0);
        assert_eq!(id.index(), 1);
    }

    #[test]
    fn test_exhaustion() {
        let mut table = ResourceTable::new();
        for _ in 0..u16::MAX {
            table.new_id().unwrap();
        }
        assert_eq!(
            table.new_id(),
            Err(ResourceIdError::Exhausted {
                live: usize::from(u16::MAX)
            })
        );
    }

    #[test]
    fn test_iter_skips_dead_and_unbound() {
        let mut table = ResourceTable::new();
        let a = table.new_id().unwrap();
        let b = table.new_id().unwrap();
        let c = table.new_id().unwrap();
        let ha = PackedHandle::encode(a, ObjectKind::VertexArray, NativeHandle(1));
        let hc = PackedHandle::encode(c, ObjectKind::VertexArray, NativeHandle(3));
        table.bind_handle(a, ha).unwrap();
        table.bind_handle(c, hc).unwrap();
        table.delete_id(c).unwrap();
        let _ = b;

        let live: Vec<_> = table.iter().collect();
        assert_eq!(live, vec![(a, ha)]);
    }
}
