//! Slot descriptors: the resources that occupy hardware binding points.

use std::fmt;

use bytemuck::{Pod, Zeroable};

use bindery_core::NativeHandle;
use crate::slots::{SlotAllocator, SlotTables};

/// The three binding-point namespaces managed by bindery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKind {
    UniformBuffer,
    StorageBuffer,
    Texture,
}

impl SlotKind {
    /// Snapshot order.
    pub const ALL: [SlotKind; 3] = [Self::UniformBuffer, Self::StorageBuffer, Self::Texture];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UniformBuffer => "uniform buffer",
            Self::StorageBuffer => "storage buffer",
            Self::Texture => "texture",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index of a binding slot within one [`SlotKind`]'s table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingPoint(pub(crate) u32);

impl BindingPoint {
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BindingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

/// Byte range of a buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferRange {
    pub offset: u32,
    pub size: u32,
}

/// What the device needs to bind a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotBinding {
    pub handle: NativeHandle,
    pub range: Option<BufferRange>,
}

/// A value that can occupy a binding slot.
///
/// The all-zero bit pattern is the sentinel marking an unbound slot, so the
/// all-zero descriptor itself can never be bound.
pub trait SlotDescriptor: Pod + Eq + fmt::Debug {
    const KIND: SlotKind;

    fn binding(&self) -> SlotBinding;

    /// The table of this descriptor's kind.
    fn table(tables: &SlotTables) -> &SlotAllocator<Self>;

    fn table_mut(tables: &mut SlotTables) -> &mut SlotAllocator<Self>;

    #[inline]
    #[must_use]
    fn sentinel() -> Self {
        Self::zeroed()
    }

    #[inline]
    fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }
}

/// A texture bound for sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[repr(C)]
pub struct SampledTexture {
    pub handle: NativeHandle,
}

impl SampledTexture {
    #[must_use]
    pub const fn new(handle: NativeHandle) -> Self {
        Self { handle }
    }
}

impl SlotDescriptor for SampledTexture {
    const KIND: SlotKind = SlotKind::Texture;

    fn binding(&self) -> SlotBinding {
        SlotBinding {
            handle: self.handle,
            range: None,
        }
    }

    fn table(tables: &SlotTables) -> &SlotAllocator<Self> {
        &tables.textures
    }

    fn table_mut(tables: &mut SlotTables) -> &mut SlotAllocator<Self> {
        &mut tables.textures
    }
}

macro_rules! buffer_range_descriptor {
    ($(#[$meta:meta])* $name:ident, $kind:expr, $field:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
        #[repr(C)]
        pub struct $name {
            pub handle: NativeHandle,
            pub offset: u32,
            pub size: u32,
        }

        impl $name {
            #[must_use]
            pub const fn new(handle: NativeHandle, offset: u32, size: u32) -> Self {
                Self { handle, offset, size }
            }

            #[must_use]
            pub const fn range(&self) -> BufferRange {
                BufferRange {
                    offset: self.offset,
                    size: self.size,
                }
            }
        }

        impl SlotDescriptor for $name {
            const KIND: SlotKind = $kind;

            fn binding(&self) -> SlotBinding {
                SlotBinding {
                    handle: self.handle,
                    range: Some(self.range()),
                }
            }

            fn table(tables: &SlotTables) -> &SlotAllocator<Self> {
                &tables.$field
            }

            fn table_mut(tables: &mut SlotTables) -> &mut SlotAllocator<Self> {
                &mut tables.$field
            }
        }
    };
}

buffer_range_descriptor!(
    /// A byte range of a buffer bound as uniform data.
    UniformBufferRange,
    SlotKind::UniformBuffer,
    uniform_buffers
);

buffer_range_descriptor!(
    /// A byte range of a buffer bound for shader storage access.
    StorageBufferRange,
    SlotKind::StorageBuffer,
    storage_buffers
);
