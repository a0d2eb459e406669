//! Structural Cache
//!
//! "Describe once, create once": a [`StructuralCache`] maps immutable
//! descriptors to the Id of the device object created for them. The create
//! callback runs exactly once per distinct descriptor, and entries are never
//! evicted.
//!
//! Lookup strategy is pluggable through [`CacheStore`]:
//!
//! | Store            | Lookup      | Used for                                   |
//! |------------------|-------------|--------------------------------------------|
//! | [`LinearStore`]  | O(n) scan   | rasterizer, depth/stencil, blend, vertex formats |
//! | [`OrderedStore`] | O(log n)    | samplers                                   |
//! | [`HashedStore`]  | O(1)        | linked programs                            |
//!
//! Expected cardinality is dozens of states per run, so the linear store is the
//! default and also the one that keeps creation order for index-based access.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

/// A descriptor and the Id created for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<D, Id> {
    pub descriptor: D,
    pub id: Id,
}

/// Storage backend of a [`StructuralCache`].
pub trait CacheStore<D, Id>: Default {
    fn find(&self, descriptor: &D) -> Option<Id>;

    fn insert(&mut self, descriptor: D, id: Id);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any entry already maps to `id`.
    fn contains_id(&self, id: &Id) -> bool;
}

// ─── Linear Store ─────────────────────────────────────────────────────────────

/// Entries in creation order; lookup by linear scan.
#[derive(Debug, Clone)]
pub struct LinearStore<D, Id> {
    entries: Vec<CacheEntry<D, Id>>,
}

impl<D, Id> Default for LinearStore<D, Id> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<D, Id> LinearStore<D, Id> {
    #[must_use]
    pub fn entries(&self) -> &[CacheEntry<D, Id>] {
        &self.entries
    }

    /// The `index`-th entry created.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CacheEntry<D, Id>> {
        self.entries.get(index)
    }
}

impl<D: PartialEq, Id: Copy + PartialEq> CacheStore<D, Id> for LinearStore<D, Id> {
    fn find(&self, descriptor: &D) -> Option<Id> {
        self.entries
            .iter()
            .find(|entry| entry.descriptor == *descriptor)
            .map(|entry| entry.id)
    }

    fn insert(&mut self, descriptor: D, id: Id) {
        self.entries.push(CacheEntry { descriptor, id });
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains_id(&self, id: &Id) -> bool {
        self.entries.iter().any(|entry| entry.id == *id)
    }
}

// ─── Ordered Store ────────────────────────────────────────────────────────────

/// Totally ordered descriptors in a `BTreeMap`.
#[derive(Debug, Clone)]
pub struct OrderedStore<D, Id> {
    map: BTreeMap<D, Id>,
}

impl<D, Id> Default for OrderedStore<D, Id> {
    fn default() -> Self {
        Self { map: BTreeMap::new() }
    }
}

impl<D: Ord, Id> OrderedStore<D, Id> {
    /// Entries in descriptor order.
    pub fn iter(&self) -> impl Iterator<Item = (&D, &Id)> + '_ {
        self.map.iter()
    }
}

impl<D: Ord, Id: Copy + PartialEq> CacheStore<D, Id> for OrderedStore<D, Id> {
    fn find(&self, descriptor: &D) -> Option<Id> {
        self.map.get(descriptor).copied()
    }

    fn insert(&mut self, descriptor: D, id: Id) {
        self.map.insert(descriptor, id);
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn contains_id(&self, id: &Id) -> bool {
        self.map.values().any(|existing| existing == id)
    }
}

// ─── Hashed Store ─────────────────────────────────────────────────────────────

/// Hashable descriptors in an `FxHashMap`.
#[derive(Debug, Clone)]
pub struct HashedStore<D, Id> {
    map: FxHashMap<D, Id>,
}

impl<D, Id> Default for HashedStore<D, Id> {
    fn default() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }
}

impl<D: Hash + Eq, Id> HashedStore<D, Id> {
    pub fn iter(&self) -> impl Iterator<Item = (&D, &Id)> + '_ {
        self.map.iter()
    }
}

impl<D: Hash + Eq, Id: Copy + PartialEq> CacheStore<D, Id> for HashedStore<D, Id> {
    fn find(&self, descriptor: &D) -> Option<Id> {
        self.map.get(descriptor).copied()
    }

    fn insert(&mut self, descriptor: D, id: Id) {
        self.map.insert(descriptor, id);
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn contains_id(&self, id: &Id) -> bool {
        self.map.values().any(|existing| existing == id)
    }
}

// ─── Structural Cache ─────────────────────────────────────────────────────────

/// Monotonic descriptor → Id cache.
#[derive(Debug, Clone)]
pub struct StructuralCache<D, Id, S = LinearStore<D, Id>> {
    store: S,
    lookups: u64,
    misses: u64,
    _marker: std::marker::PhantomData<fn(&D) -> Id>,
}

impl<D, Id, S: CacheStore<D, Id>> Default for StructuralCache<D, Id, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, Id, S: CacheStore<D, Id>> StructuralCache<D, Id, S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: S::default(),
            lookups: 0,
            misses: 0,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<D, Id, S> StructuralCache<D, Id, S>
where
    D: Clone,
    Id: Copy + PartialEq + Debug,
    S: CacheStore<D, Id>,
{
    /// Returns the Id cached for `descriptor`, calling `create_fn` to make one
    /// on first sight.
    ///
    /// # Panics
    ///
    /// If `create_fn` returns an Id that another descriptor already maps to.
    pub fn get_or_create(&mut self, descriptor: &D, create_fn: impl FnOnce(&D) -> Id) -> Id {
        match self.try_get_or_create(descriptor, |desc| Ok::<_, Infallible>(create_fn(desc))) {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }

    /// Fallible [`get_or_create`](Self::get_or_create). Nothing is cached when
    /// `create_fn` fails, so the next call retries.
    pub fn try_get_or_create<E>(
        &mut self,
        descriptor: &D,
        create_fn: impl FnOnce(&D) -> Result<Id, E>,
    ) -> Result<Id, E> {
        self.lookups += 1;
        if let Some(id) = self.store.find(descriptor) {
            return Ok(id);
        }

        let id = create_fn(descriptor)?;
        assert!(
            !self.store.contains_id(&id),
            "structural cache created duplicate id {id:?} for a distinct descriptor"
        );
        self.store.insert(descriptor.clone(), id);
        self.misses += 1;
        Ok(id)
    }

    /// Lookup without creation.
    #[must_use]
    pub fn get(&self, descriptor: &D) -> Option<Id> {
        self.store.find(descriptor)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Calls to `get_or_create`, hits and misses alike.
    #[must_use]
    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    /// Times `create_fn` ran and succeeded.
    #[must_use]
    pub fn creations(&self) -> u64 {
        self.misses
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}
