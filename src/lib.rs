#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod cache;
pub mod config;
pub mod descriptors;
pub mod device;
pub mod errors;
pub mod ids;
pub mod manager;
pub mod slots;
pub mod snapshot;

pub use bindery_core::{
    BitField, NativeHandle, ObjectKind, PackedHandle, ResourceId, ResourceIdError, ResourceTable,
    ceil_log2,
};

pub use cache::{CacheEntry, CacheStore, HashedStore, LinearStore, OrderedStore, StructuralCache};
pub use config::BindingStateConfig;
pub use descriptors::{
    BindingPoint, BlendStateDesc, DepthStencilStateDesc, ProgramStages, RasterizerStateDesc,
    SampledTexture, SamplerDesc, ShaderStage, SlotDescriptor, SlotKind, StorageBufferRange,
    UniformBufferRange, VertexAttribute, VertexFormatDesc,
};
pub use device::{DeviceBackend, DeviceLimits, HeadlessDevice};
pub use errors::{BinderyError, Result};
pub use ids::{BlendStateId, DepthStencilStateId, RasterizerStateId};
pub use manager::{BindingStateManager, BindingStats};
pub use slots::{SlotAllocator, SlotTables};
