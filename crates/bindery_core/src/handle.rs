//! Packed Resource Handles
//!
//! A [`PackedHandle`] squeezes everything needed to resolve a resource into one
//! `u64`:
//!
//! ```text
//!  63          53 52            37 36      32 31                    0
//! +--------------+----------------+----------+-----------------------+
//! |  generation  |  resource id   |   kind   |     native handle     |
//! +--------------+----------------+----------+-----------------------+
//! ```
//!
//! The kind field is exactly as wide as the [`ObjectKind`] enumeration needs
//! and the generation takes whatever is left, so adding kinds shrinks the
//! generation rather than breaking the layout. All widths are checked at
//! compile time.

use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::bitfield::{BitField, ceil_log2};
use crate::resource::ResourceId;

// ─── Object Kinds ─────────────────────────────────────────────────────────────

macro_rules! object_kinds {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Every kind of native object a packed handle can describe.
        ///
        /// The discriminant is the kind tag stored in the handle; tag 0 is
        /// reserved for [`ObjectKind::None`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        #[repr(u8)]
        pub enum ObjectKind {
            #[default]
            $($variant,)*
        }

        impl ObjectKind {
            /// All kinds in tag order.
            pub const ALL: &'static [ObjectKind] = &[$(ObjectKind::$variant,)*];

            /// Number of declared kinds.
            pub const COUNT: usize = Self::ALL.len();

            /// Human-readable name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(ObjectKind::$variant => $name,)*
                }
            }
        }
    };
}

object_kinds! {
    None => "none",
    VertexBuffer => "vertex buffer",
    IndexBuffer => "index buffer",
    PixelPackBuffer => "pixel pack buffer",
    PixelUnpackBuffer => "pixel unpack buffer",
    UniformBuffer => "uniform buffer",
    StorageBuffer => "storage buffer",
    AtomicCounterBuffer => "atomic counter buffer",
    Texture1D => "1D texture",
    Texture2D => "2D texture",
    Texture3D => "3D texture",
    TextureCube => "cube texture",
    Texture1DArray => "1D array texture",
    Texture2DArray => "2D array texture",
    TextureCubeArray => "cube array texture",
    Sampler => "sampler",
    VertexShader => "vertex shader",
    TessControlShader => "tessellation control shader",
    TessEvalShader => "tessellation evaluation shader",
    GeometryShader => "geometry shader",
    FragmentShader => "fragment shader",
    ComputeShader => "compute shader",
    GraphicsProgram => "graphics program",
    ComputeProgram => "compute program",
    Framebuffer => "framebuffer",
    VertexArray => "vertex array",
    Query => "query",
    Fence => "fence",
    RasterizerState => "rasterizer state",
    DepthStencilState => "depth/stencil state",
    BlendState => "blend state",
}

impl ObjectKind {
    /// The tag written into packed handles.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Inverse of [`tag`](Self::tag).
    #[inline]
    #[must_use]
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    #[must_use]
    pub const fn is_buffer(self) -> bool {
        matches!(
            self,
            Self::VertexBuffer
                | Self::IndexBuffer
                | Self::PixelPackBuffer
                | Self::PixelUnpackBuffer
                | Self::UniformBuffer
                | Self::StorageBuffer
                | Self::AtomicCounterBuffer
        )
    }

    #[must_use]
    pub const fn is_texture(self) -> bool {
        matches!(
            self,
            Self::Texture1D
                | Self::Texture2D
                | Self::Texture3D
                | Self::TextureCube
                | Self::Texture1DArray
                | Self::Texture2DArray
                | Self::TextureCubeArray
        )
    }

    #[must_use]
    pub const fn is_shader(self) -> bool {
        matches!(
            self,
            Self::VertexShader
                | Self::TessControlShader
                | Self::TessEvalShader
                | Self::GeometryShader
                | Self::FragmentShader
                | Self::ComputeShader
        )
    }

    #[must_use]
    pub const fn is_program(self) -> bool {
        matches!(self, Self::GraphicsProgram | Self::ComputeProgram)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Native Handles ───────────────────────────────────────────────────────────

/// A device-side object name, opaque to bindery. Zero is the null object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct NativeHandle(pub u32);

impl NativeHandle {
    pub const NULL: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native#{}", self.0)
    }
}

// ─── Layout ───────────────────────────────────────────────────────────────────

pub const NATIVE_BITS: u32 = 32;
pub const KIND_BITS: u32 = ceil_log2(ObjectKind::COUNT as u32);
pub const ID_BITS: u32 = 16;
pub const GENERATION_BITS: u32 = 64 - NATIVE_BITS - KIND_BITS - ID_BITS;

pub type NativeField = BitField<0, NATIVE_BITS>;
pub type KindField = BitField<NATIVE_BITS, KIND_BITS>;
pub type IdField = BitField<{ NATIVE_BITS + KIND_BITS }, ID_BITS>;
pub type GenerationField = BitField<{ NATIVE_BITS + KIND_BITS + ID_BITS }, GENERATION_BITS>;

const _: () = {
    assert!(ObjectKind::COUNT <= 1 << KIND_BITS, "kind field too narrow");
    assert!(GENERATION_BITS >= 8, "too many object kinds to leave room for generations");
    assert!(NativeField::END == KindField::SHIFT);
    assert!(KindField::END == IdField::SHIFT);
    assert!(IdField::END == GenerationField::SHIFT);
    assert!(GenerationField::END == 64);
};

// ─── Packed Handle ────────────────────────────────────────────────────────────

/// Resource id, kind tag and native handle in one `u64`.
///
/// The all-zero value is [`PackedHandle::INVALID`]; every handle produced by
/// [`encode`](Self::encode) is non-zero because resource ids are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct PackedHandle(u64);

impl PackedHandle {
    pub const INVALID: Self = Self(0);

    /// Packs the three components. Lossless for every input: the native
    /// handle is 32 bits wide, the index 16 bits, and generations are stored
    /// already reduced to [`GENERATION_BITS`].
    #[must_use]
    pub const fn encode(id: ResourceId, kind: ObjectKind, native: NativeHandle) -> Self {
        let mut word = NativeField::set(0, native.0 as u64);
        word = KindField::set(word, kind.tag() as u64);
        word = IdField::set(word, id.index() as u64);
        word = GenerationField::set(word, id.generation() as u64);
        Self(word)
    }

    /// The resource id, or `None` for [`PackedHandle::INVALID`].
    #[must_use]
    pub fn decode_id(self) -> Option<ResourceId> {
        ResourceId::from_parts(
            IdField::get(self.0) as u16,
            GenerationField::get(self.0) as u16,
        )
    }

    /// The kind tag. Tags outside the enumeration decode as [`ObjectKind::None`].
    #[must_use]
    pub fn decode_kind(self) -> ObjectKind {
        ObjectKind::from_tag(KindField::get(self.0) as u32).unwrap_or(ObjectKind::None)
    }

    #[inline]
    #[must_use]
    pub const fn decode_native(self) -> NativeHandle {
        NativeHandle(NativeField::get(self.0) as u32)
    }

    /// All three components at once.
    #[must_use]
    pub fn decode(self) -> (Option<ResourceId>, ObjectKind, NativeHandle) {
        (self.decode_id(), self.decode_kind(), self.decode_native())
    }

    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Display for PackedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode_id() {
            Some(id) => write!(f, "{} {} ({})", self.decode_kind(), id, self.decode_native()),
            None => f.write_str("invalid handle"),
        }
    }
}
