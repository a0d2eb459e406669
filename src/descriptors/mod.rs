//! Descriptors
//!
//! Immutable values that fully describe a bindable resource or a render-state
//! object. They are the lookup keys of the slot tables and structural caches,
//! so every type here defines equality field by field. Floating-point fields
//! compare by canonical bit pattern: `-0.0` equals `0.0`, and all NaNs are one
//! value, which keeps `Eq`, `Ord` and `Hash` lawful.

pub mod blend;
pub mod depth_stencil;
pub mod program;
pub mod rasterizer;
pub mod sampler;
pub mod slot;
pub mod vertex_format;

pub use blend::{BlendFactor, BlendOp, BlendStateDesc};
pub use depth_stencil::{DepthStencilStateDesc, StencilFaceOps, StencilOp};
pub use program::{ProgramKey, ProgramStageError, ProgramStages, ShaderStage};
pub use rasterizer::{CullMode, FillMode, FrontFace, RasterizerFlags, RasterizerStateDesc};
pub use sampler::{AddressMode, CompareMode, MagFilter, MinFilter, SamplerDesc};
pub use slot::{
    BindingPoint, BufferRange, SampledTexture, SlotBinding, SlotDescriptor, SlotKind,
    StorageBufferRange, UniformBufferRange,
};
pub use vertex_format::{
    ComponentType, MAX_VERTEX_ATTRIBUTES, VertexAttribute, VertexFormatDesc, VertexFormatError,
};

/// Depth, stencil and shadow-sampler comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum CompareFunction {
    Never,
    #[default]
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Bit pattern used for comparing and hashing an `f32` field.
#[inline]
pub(crate) fn canonical_bits(value: f32) -> u32 {
    if value == 0.0 {
        0
    } else if value.is_nan() {
        f32::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

/// Implements `PartialEq`, `Eq`, `Hash`, `PartialOrd` and `Ord` through a
/// `fn key(&self)` returning a tuple of plainly comparable fields.
macro_rules! impl_keyed_traits {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.key() == other.key()
            }
        }

        impl Eq for $ty {}

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.key().hash(state);
            }
        }

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.key().cmp(&other.key())
            }
        }
    };
}

pub(crate) use impl_keyed_traits;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_bits_folds_signed_zero_and_nan() {
        assert_eq!(canonical_bits(0.0), canonical_bits(-0.0));
        assert_eq!(canonical_bits(f32::NAN), canonical_bits(-f32::NAN));
        assert_ne!(canonical_bits(1.0), canonical_bits(-1.0));
    }
}
