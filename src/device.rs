//! Device Backend
//!
//! bindery never talks to a graphics API directly. Everything it needs from
//! the device goes through [`DeviceBackend`]: querying binding limits,
//! creating and destroying the objects its caches own, binding slots, and
//! making state objects current.
//!
//! [`HeadlessDevice`] is a backend with no GPU behind it. It hands out
//! sequential handles and records every call, which is what tests, benches
//! and offline tooling want.

use bindery_core::{NativeHandle, ObjectKind};
use rustc_hash::FxHashSet;

use crate::descriptors::{
    BindingPoint, BlendStateDesc, DepthStencilStateDesc, RasterizerStateDesc, SamplerDesc,
    SlotBinding, SlotKind, VertexFormatDesc,
};

/// Binding-point maxima reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    pub max_texture_units: u32,
    pub max_uniform_buffer_bindings: u32,
    pub max_storage_buffer_bindings: u32,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_texture_units: 32,
            max_uniform_buffer_bindings: 36,
            max_storage_buffer_bindings: 16,
        }
    }
}

impl DeviceLimits {
    #[must_use]
    pub const fn for_kind(&self, kind: SlotKind) -> u32 {
        match kind {
            SlotKind::UniformBuffer => self.max_uniform_buffer_bindings,
            SlotKind::StorageBuffer => self.max_storage_buffer_bindings,
            SlotKind::Texture => self.max_texture_units,
        }
    }
}

/// Description of a native object bindery asks the device to create.
#[derive(Debug, Clone, Copy)]
pub enum NativeObjectDesc<'a> {
    Sampler(&'a SamplerDesc),
    RasterizerState(&'a RasterizerStateDesc),
    DepthStencilState(&'a DepthStencilStateDesc),
    BlendState(&'a BlendStateDesc),
    VertexFormat(&'a VertexFormatDesc),
    /// Link the given shader objects. `kind` is graphics or compute.
    Program {
        kind: ObjectKind,
        stages: &'a [(ObjectKind, NativeHandle)],
    },
}

impl NativeObjectDesc<'_> {
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Sampler(_) => ObjectKind::Sampler,
            Self::RasterizerState(_) => ObjectKind::RasterizerState,
            Self::DepthStencilState(_) => ObjectKind::DepthStencilState,
            Self::BlendState(_) => ObjectKind::BlendState,
            Self::VertexFormat(_) => ObjectKind::VertexArray,
            Self::Program { kind, .. } => *kind,
        }
    }
}

/// A state object to make current.
#[derive(Debug, Clone, Copy)]
pub enum StateRef<'a> {
    Rasterizer {
        native: NativeHandle,
        desc: &'a RasterizerStateDesc,
    },
    DepthStencil {
        native: NativeHandle,
        desc: &'a DepthStencilStateDesc,
    },
    Blend {
        output: u32,
        native: NativeHandle,
        desc: &'a BlendStateDesc,
    },
}

/// Outward calls bindery makes. All calls are synchronous.
///
/// Backends without native state objects (GL, for one) may return
/// [`NativeHandle::NULL`] for rasterizer, depth/stencil and blend states and
/// apply the descriptor directly in [`apply_state`](Self::apply_state).
pub trait DeviceBackend {
    fn limits(&self) -> DeviceLimits;

    fn create_native_object(&mut self, desc: NativeObjectDesc<'_>) -> NativeHandle;

    fn destroy_native_object(&mut self, kind: ObjectKind, handle: NativeHandle);

    fn bind_native_slot(&mut self, kind: SlotKind, slot: BindingPoint, binding: SlotBinding);

    fn apply_state(&mut self, state: StateRef<'_>);
}

// ─── Headless Device ──────────────────────────────────────────────────────────

/// A state application as recorded by [`HeadlessDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedState {
    Rasterizer(NativeHandle),
    DepthStencil(NativeHandle),
    Blend { output: u32, native: NativeHandle },
}

/// One call received by [`HeadlessDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCall {
    Create { kind: ObjectKind, handle: NativeHandle },
    Destroy { kind: ObjectKind, handle: NativeHandle },
    Bind { kind: SlotKind, slot: BindingPoint, binding: SlotBinding },
    Apply(AppliedState),
}

/// GPU-less backend that records calls.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    limits: DeviceLimits,
    last_handle: u32,
    live: FxHashSet<(ObjectKind, NativeHandle)>,
    calls: Vec<DeviceCall>,
}

impl HeadlessDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limits(limits: DeviceLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Every call so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Drains the call log.
    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of `create_native_object` calls for `kind`.
    #[must_use]
    pub fn created(&self, kind: ObjectKind) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DeviceCall::Create { kind: k, .. } if *k == kind))
            .count()
    }

    /// Objects created and not yet destroyed.
    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_live(&self, kind: ObjectKind, handle: NativeHandle) -> bool {
        self.live.contains(&(kind, handle))
    }
}

impl DeviceBackend for HeadlessDevice {
    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn create_native_object(&mut self, desc: NativeObjectDesc<'_>) -> NativeHandle {
        self.last_handle += 1;
        let handle = NativeHandle(self.last_handle);
        let kind = desc.kind();
        self.live.insert((kind, handle));
        self.calls.push(DeviceCall::Create { kind, handle });
        handle
    }

    fn destroy_native_object(&mut self, kind: ObjectKind, handle: NativeHandle) {
        if !self.live.remove(&(kind, handle)) {
            log::warn!("HeadlessDevice: destroying unknown {kind} {handle}");
        }
        self.calls.push(DeviceCall::Destroy { kind, handle });
    }

    fn bind_native_slot(&mut self, kind: SlotKind, slot: BindingPoint, binding: SlotBinding) {
        self.calls.push(DeviceCall::Bind { kind, slot, binding });
    }

    fn apply_state(&mut self, state: StateRef<'_>) {
        let applied = match state {
            StateRef::Rasterizer { native, .. } => AppliedState::Rasterizer(native),
            StateRef::DepthStencil { native, .. } => AppliedState::DepthStencil(native),
            StateRef::Blend { output, native, .. } => AppliedState::Blend { output, native },
        };
        self.calls.push(DeviceCall::Apply(applied));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_handles_are_unique_and_tracked() {
        let mut device = HeadlessDevice::new();
        let sampler = SamplerDesc::default();
        let a = device.create_native_object(NativeObjectDesc::Sampler(&sampler));
        let b = device.create_native_object(NativeObjectDesc::Sampler(&sampler));
        assert_ne!(a, b);
        assert!(!a.is_null());
        assert_eq!(device.created(ObjectKind::Sampler), 2);
        assert_eq!(device.live_objects(), 2);

        device.destroy_native_object(ObjectKind::Sampler, a);
        assert!(!device.is_live(ObjectKind::Sampler, a));
        assert_eq!(device.live_objects(), 1);
        assert_eq!(device.take_calls().len(), 3);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_program_desc_reports_its_kind() {
        let desc = NativeObjectDesc::Program {
            kind: ObjectKind::ComputeProgram,
            stages: &[(ObjectKind::ComputeShader, NativeHandle(4))],
        };
        assert_eq!(desc.kind(), ObjectKind::ComputeProgram);
    }
}
