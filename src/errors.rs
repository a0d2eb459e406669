//! Error Types
//!
//! This module defines the error type returned by fallible bindery operations.
//!
//! # Overview
//!
//! [`BinderyError`] covers recoverable failures:
//! - Slot exhaustion and slot bookkeeping mistakes
//! - Snapshot buffers that are too small or corrupt
//! - Invalid state, vertex-format and program descriptions
//! - Stale or unknown resource ids
//!
//! Programmer errors are not represented here. Mutating a sealed manager, or a
//! structural cache being handed an Id that already belongs to another
//! descriptor, panics.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bindery::errors::{BinderyError, Result};
//!
//! fn bind_material(state: &mut BindingStateManager<impl DeviceBackend>) -> Result<()> {
//!     let slot = state.bind_unique(albedo)?;
//!     Ok(())
//! }
//! ```

use bindery_core::{ResourceId, ResourceIdError};
use thiserror::Error;

use crate::descriptors::{ProgramStageError, SlotKind, VertexFormatError};

/// Which structural state cache an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Rasterizer,
    DepthStencil,
    Blend,
}

impl std::fmt::Display for StateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Rasterizer => "rasterizer",
            Self::DepthStencil => "depth/stencil",
            Self::Blend => "blend",
        })
    }
}

/// The main error type for bindery.
#[derive(Error, Debug)]
pub enum BinderyError {
    // ========================================================================
    // Binding Slots
    // ========================================================================
    /// Every slot of this kind is taken.
    #[error("No free {kind} binding slot (capacity {capacity})")]
    ResourceExhausted { kind: SlotKind, capacity: u32 },

    /// `release` was called for a descriptor (or slot) that is not bound.
    #[error("Released a {kind} descriptor that is not bound")]
    ReleaseOfUnboundDescriptor { kind: SlotKind },

    /// The all-zero descriptor stands for an empty slot and cannot be bound.
    #[error("Cannot bind the null {kind} descriptor")]
    NullDescriptor { kind: SlotKind },

    /// A slot index past the end of its table.
    #[error("{kind} slot {slot} is out of range (capacity {capacity})")]
    SlotOutOfRange {
        kind: SlotKind,
        slot: u32,
        capacity: u32,
    },

    // ========================================================================
    // Snapshots
    // ========================================================================
    /// The caller's buffer cannot hold the snapshot. Nothing was written.
    #[error("Snapshot needs {required} bytes but the buffer holds {available}")]
    InsufficientSnapshotBuffer { required: usize, available: usize },

    /// The snapshot is larger than its 16-bit record offsets can address.
    #[error("Snapshot of {required} bytes exceeds the addressable {max} bytes")]
    SnapshotTooLarge { required: usize, max: usize },

    /// The buffer handed to restore is not a valid snapshot for this manager.
    #[error("Corrupt snapshot: {reason}")]
    CorruptSnapshot { reason: String },

    // ========================================================================
    // State Objects
    // ========================================================================
    /// A state id that its cache never issued.
    #[error("Unknown {kind} state index {index}")]
    UnknownStateId { kind: StateKind, index: u32 },

    /// The vertex format description is invalid.
    #[error("Invalid vertex format: {0}")]
    InvalidVertexFormat(#[from] VertexFormatError),

    /// The shader stage combination cannot be linked.
    #[error("Invalid program stages: {0}")]
    InvalidProgramStages(#[from] ProgramStageError),

    // ========================================================================
    // Resource Ids
    // ========================================================================
    /// Resource id allocation or lookup failed.
    #[error(transparent)]
    ResourceId(#[from] ResourceIdError),

    /// The id belongs to an object a structural cache created and still owns.
    #[error("Resource {id} is owned by a state cache")]
    CacheOwnedResource { id: ResourceId },

    /// The shader is linked into a cached program and cannot be unregistered.
    #[error("Shader {shader} is linked into program {program}")]
    ShaderInUse {
        shader: ResourceId,
        program: ResourceId,
    },
}

/// Alias for `Result<T, BinderyError>`.
pub type Result<T> = std::result::Result<T, BinderyError>;
