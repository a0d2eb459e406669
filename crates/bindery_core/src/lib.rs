//! Core types shared by every bindery layer: typed bitfields, packed resource
//! handles and the generation-tagged resource id table.

pub mod bitfield;
pub mod handle;
pub mod resource;

pub use bitfield::{BitField, ceil_log2};
pub use handle::{NativeHandle, ObjectKind, PackedHandle};
pub use resource::{ResourceId, ResourceIdError, ResourceTable};
