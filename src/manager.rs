//! Binding State Manager
//!
//! [`BindingStateManager`] is the one object render code talks to. It owns the
//! slot tables, the structural caches, the resource id table and the device
//! backend, and it is the only place where they meet.
//!
//! # Lifecycle
//!
//! 1. [`new`](BindingStateManager::new) sizes the slot tables from the config
//!    clamped to device limits. It creates the default rasterizer,
//!    depth/stencil and blend states (index 0 of each cache) and selects the
//!    first two. It also registers the attribute-less vertex format and,
//!    optionally, a few common ones.
//! 2. Setup code binds resources and creates the state objects it needs.
//! 3. [`seal`](BindingStateManager::seal) ends setup. From then on, binding,
//!    releasing, registering resources or creating a *new* cached state
//!    panics. Cache hits, state selection and snapshots stay legal.
//! 4. [`teardown`](BindingStateManager::teardown) destroys every device
//!    object the caches created and hands the backend back.
//!
//! # Example
//!
//! ```rust
//! use bindery::{BindingStateConfig, BindingStateManager, HeadlessDevice, SampledTexture, SamplerDesc};
//! use bindery::NativeHandle;
//!
//! let mut state = BindingStateManager::new(HeadlessDevice::new(), BindingStateConfig::default())?;
//! let albedo = state.bind_unique(SampledTexture::new(NativeHandle(7)))?;
//! assert_eq!(state.bind_unique(SampledTexture::new(NativeHandle(7)))?, albedo);
//!
//! let linear = state.get_or_create_sampler(&SamplerDesc::default())?;
//! assert_eq!(state.get_or_create_sampler(&SamplerDesc::default())?, linear);
//!
//! state.seal();
//! let _device = state.teardown();
//! # Ok::<(), bindery::BinderyError>(())
//! ```

use bindery_core::{NativeHandle, ObjectKind, PackedHandle, ResourceId, ResourceIdError, ResourceTable};
use smallvec::SmallVec;

use crate::cache::{HashedStore, LinearStore, OrderedStore, StructuralCache};
use crate::config::BindingStateConfig;
use crate::descriptors::{
    BindingPoint, BlendStateDesc, DepthStencilStateDesc, ProgramKey, ProgramStageError,
    ProgramStages, RasterizerStateDesc, SampledTexture, SamplerDesc, SlotDescriptor, SlotKind,
    StorageBufferRange, UniformBufferRange, VertexFormatDesc,
};
use crate::device::{DeviceBackend, NativeObjectDesc, StateRef};
use crate::errors::{BinderyError, Result, StateKind};
use crate::ids::{BlendStateId, DepthStencilStateId, RasterizerStateId, StateObject};
use crate::slots::SlotTables;
use crate::snapshot::{self, SelectedStates};

type StateCache<D, I> = StructuralCache<D, StateObject<I>, LinearStore<D, StateObject<I>>>;
type SamplerCache = StructuralCache<SamplerDesc, ResourceId, OrderedStore<SamplerDesc, ResourceId>>;
type ProgramCache = StructuralCache<ProgramKey, ResourceId, HashedStore<ProgramKey, ResourceId>>;

/// A device object created on behalf of a cache.
#[derive(Debug, Clone, Copy)]
struct OwnedObject {
    kind: ObjectKind,
    native: NativeHandle,
    id: Option<ResourceId>,
}

/// Vertex formats registered when `register_common_vertex_formats` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonVertexFormats {
    pub position: ResourceId,
    pub position_2d: ResourceId,
    pub position_normal_uv: ResourceId,
}

/// Occupancy of one slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotUsage {
    pub kind: SlotKind,
    pub reserved: usize,
    pub capacity: u32,
}

/// Counters reported by [`BindingStateManager::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingStats {
    pub slots: [SlotUsage; 3],
    pub samplers: usize,
    pub rasterizer_states: usize,
    pub depth_stencil_states: usize,
    pub blend_states: usize,
    pub vertex_formats: usize,
    pub programs: usize,
    pub live_resources: usize,
    pub owned_objects: usize,
    pub sealed: bool,
}

#[track_caller]
fn assert_unsealed(sealed: bool, operation: &str) {
    assert!(!sealed, "{operation} called on sealed binding state");
}

fn create_owned<D: DeviceBackend>(
    device: &mut D,
    owned: &mut Vec<OwnedObject>,
    desc: NativeObjectDesc<'_>,
) -> NativeHandle {
    let kind = desc.kind();
    let native = device.create_native_object(desc);
    owned.push(OwnedObject {
        kind,
        native,
        id: None,
    });
    log::debug!("Created {kind} {native}");
    native
}

/// Creates a device object and gives it a resource id. The id is allocated
/// first so id exhaustion never leaks a device object.
fn create_registered<D: DeviceBackend>(
    device: &mut D,
    resources: &mut ResourceTable,
    owned: &mut Vec<OwnedObject>,
    desc: NativeObjectDesc<'_>,
) -> Result<ResourceId> {
    let id = resources.new_id()?;
    let kind = desc.kind();
    let native = device.create_native_object(desc);
    resources.bind_handle(id, PackedHandle::encode(id, kind, native))?;
    owned.push(OwnedObject {
        kind,
        native,
        id: Some(id),
    });
    log::debug!("Created {kind} {native} as {id}");
    Ok(id)
}

fn rebind_table<T: SlotDescriptor, D: DeviceBackend>(device: &mut D, tables: &SlotTables) {
    for (slot, desc) in tables.get::<T>().iter_reserved() {
        if !desc.is_sentinel() {
            device.bind_native_slot(T::KIND, slot, desc.binding());
        }
    }
}

/// Owner of all binding state for one device context.
pub struct BindingStateManager<D: DeviceBackend> {
    device: D,
    config: BindingStateConfig,
    slots: SlotTables,
    resources: ResourceTable,

    samplers: SamplerCache,
    rasterizer_states: StateCache<RasterizerStateDesc, RasterizerStateId>,
    depth_stencil_states: StateCache<DepthStencilStateDesc, DepthStencilStateId>,
    blend_states: StateCache<BlendStateDesc, BlendStateId>,
    vertex_formats: StructuralCache<VertexFormatDesc, ResourceId>,
    programs: ProgramCache,

    /// Oldest first; teardown walks it backwards.
    owned: Vec<OwnedObject>,
    /// Stage ids of every linked program. A listed shader cannot be deleted.
    linked_programs: Vec<(ResourceId, ProgramStages)>,
    selected_rasterizer: Option<RasterizerStateId>,
    selected_depth_stencil: Option<DepthStencilStateId>,
    no_attrib_vertex_format: ResourceId,
    common_vertex_formats: Option<CommonVertexFormats>,
    sealed: bool,
}

impl<D: DeviceBackend> BindingStateManager<D> {
    pub fn new(mut device: D, config: BindingStateConfig) -> Result<Self> {
        let limits = device.limits();
        let slots = SlotTables::new(
            config.resolve_capacity(SlotKind::UniformBuffer, &limits),
            config.resolve_capacity(SlotKind::StorageBuffer, &limits),
            config.resolve_capacity(SlotKind::Texture, &limits),
        );

        let mut resources = ResourceTable::with_capacity(config.expected_resources);
        let mut owned = Vec::new();
        let mut vertex_formats: StructuralCache<VertexFormatDesc, ResourceId> = StructuralCache::new();
        let no_attrib_vertex_format =
            vertex_formats.try_get_or_create(&VertexFormatDesc::empty(), |desc| {
                create_registered(
                    &mut device,
                    &mut resources,
                    &mut owned,
                    NativeObjectDesc::VertexFormat(desc),
                )
            })?;

        let mut manager = Self {
            device,
            config,
            slots,
            resources,
            samplers: StructuralCache::new(),
            rasterizer_states: StructuralCache::new(),
            depth_stencil_states: StructuralCache::new(),
            blend_states: StructuralCache::new(),
            vertex_formats,
            programs: StructuralCache::new(),
            owned,
            linked_programs: Vec::new(),
            selected_rasterizer: None,
            selected_depth_stencil: None,
            no_attrib_vertex_format,
            common_vertex_formats: None,
            sealed: false,
        };

        let rasterizer = manager.get_or_create_rasterizer(&RasterizerStateDesc::default());
        let depth_stencil = manager.get_or_create_depth_stencil(&DepthStencilStateDesc::default());
        manager.get_or_create_blend(&BlendStateDesc::default());
        manager.set_rasterizer_state(rasterizer)?;
        manager.set_depth_stencil_state(depth_stencil)?;

        if manager.config.register_common_vertex_formats {
            manager.common_vertex_formats = Some(CommonVertexFormats {
                position: manager.get_or_create_vertex_format(&VertexFormatDesc::position())?,
                position_2d: manager.get_or_create_vertex_format(&VertexFormatDesc::position_2d())?,
                position_normal_uv: manager
                    .get_or_create_vertex_format(&VertexFormatDesc::position_normal_uv())?,
            });
        }

        log::info!(
            "Binding state ready: {} uniform, {} storage, {} texture slots",
            manager.slots.capacity(SlotKind::UniformBuffer),
            manager.slots.capacity(SlotKind::StorageBuffer),
            manager.slots.capacity(SlotKind::Texture),
        );
        Ok(manager)
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    #[inline]
    pub fn config(&self) -> &BindingStateConfig {
        &self.config
    }

    #[inline]
    pub fn slots(&self) -> &SlotTables {
        &self.slots
    }

    #[inline]
    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    // ========================================================================
    // Binding slots
    // ========================================================================

    /// Binds `desc` to a slot of its kind, reusing the slot it already holds.
    /// The device is only called when a new slot is taken.
    pub fn bind_unique<T: SlotDescriptor>(&mut self, desc: T) -> Result<BindingPoint> {
        assert_unsealed(self.sealed, "bind_unique");
        if desc.is_sentinel() {
            return Err(BinderyError::NullDescriptor { kind: T::KIND });
        }
        let table = self.slots.get_mut::<T>();
        if let Some(slot) = table.find_bound(&desc) {
            return Ok(slot);
        }
        let Some(slot) = table.acquire(desc) else {
            let capacity = table.capacity();
            log::error!("Out of {} binding slots (capacity {capacity})", T::KIND);
            return Err(BinderyError::ResourceExhausted {
                kind: T::KIND,
                capacity,
            });
        };
        self.device.bind_native_slot(T::KIND, slot, desc.binding());
        Ok(slot)
    }

    /// Frees the slot holding `desc`.
    pub fn release<T: SlotDescriptor>(&mut self, desc: &T) -> Result<BindingPoint> {
        assert_unsealed(self.sealed, "release");
        self.slots.get_mut::<T>().release(desc).inspect_err(|_| {
            log::error!("Released {desc:?}, which is not bound");
        })
    }

    /// Claims the lowest free slot of `kind` for use outside descriptor
    /// tracking.
    pub fn reserve_slot(&mut self, kind: SlotKind) -> Result<BindingPoint> {
        assert_unsealed(self.sealed, "reserve_slot");
        self.slots.reserve(kind).ok_or_else(|| {
            let capacity = self.slots.capacity(kind);
            log::error!("Out of {kind} binding slots (capacity {capacity})");
            BinderyError::ResourceExhausted { kind, capacity }
        })
    }

    /// Frees a slot obtained from [`reserve_slot`](Self::reserve_slot) (or any
    /// other reserved slot).
    pub fn release_slot(&mut self, kind: SlotKind, slot: BindingPoint) -> Result<()> {
        assert_unsealed(self.sealed, "release_slot");
        self.slots.release_slot(kind, slot)
    }

    /// Slot currently holding `desc`, without binding it.
    #[must_use]
    pub fn bound_slot<T: SlotDescriptor>(&self, desc: &T) -> Option<BindingPoint> {
        self.slots.get::<T>().find_bound(desc)
    }

    // ========================================================================
    // Cached state objects
    // ========================================================================

    pub fn get_or_create_sampler(&mut self, desc: &SamplerDesc) -> Result<ResourceId> {
        let sealed = self.sealed;
        let (device, resources, owned) = (&mut self.device, &mut self.resources, &mut self.owned);
        self.samplers.try_get_or_create(desc, |desc| {
            assert_unsealed(sealed, "get_or_create_sampler");
            create_registered(device, resources, owned, NativeObjectDesc::Sampler(desc))
        })
    }

    pub fn get_or_create_rasterizer(&mut self, desc: &RasterizerStateDesc) -> RasterizerStateId {
        let sealed = self.sealed;
        let id = RasterizerStateId(self.rasterizer_states.len() as u32);
        let (device, owned) = (&mut self.device, &mut self.owned);
        self.rasterizer_states
            .get_or_create(desc, |desc| {
                assert_unsealed(sealed, "get_or_create_rasterizer");
                let native = create_owned(device, owned, NativeObjectDesc::RasterizerState(desc));
                StateObject { id, native }
            })
            .id
    }

    pub fn get_or_create_depth_stencil(&mut self, desc: &DepthStencilStateDesc) -> DepthStencilStateId {
        let sealed = self.sealed;
        let id = DepthStencilStateId(self.depth_stencil_states.len() as u32);
        let (device, owned) = (&mut self.device, &mut self.owned);
        self.depth_stencil_states
            .get_or_create(desc, |desc| {
                assert_unsealed(sealed, "get_or_create_depth_stencil");
                let native = create_owned(device, owned, NativeObjectDesc::DepthStencilState(desc));
                StateObject { id, native }
            })
            .id
    }

    pub fn get_or_create_blend(&mut self, desc: &BlendStateDesc) -> BlendStateId {
        let sealed = self.sealed;
        let id = BlendStateId(self.blend_states.len() as u32);
        let (device, owned) = (&mut self.device, &mut self.owned);
        self.blend_states
            .get_or_create(desc, |desc| {
                assert_unsealed(sealed, "get_or_create_blend");
                let native = create_owned(device, owned, NativeObjectDesc::BlendState(desc));
                StateObject { id, native }
            })
            .id
    }

    pub fn get_or_create_vertex_format(&mut self, desc: &VertexFormatDesc) -> Result<ResourceId> {
        let sealed = self.sealed;
        let (device, resources, owned) = (&mut self.device, &mut self.resources, &mut self.owned);
        self.vertex_formats.try_get_or_create(desc, |desc| {
            assert_unsealed(sealed, "get_or_create_vertex_format");
            create_registered(device, resources, owned, NativeObjectDesc::VertexFormat(desc))
        })
    }

    /// Returns the program linking `stages`, linking it on first request.
    ///
    /// Every stage must be a live resource registered with the matching shader
    /// kind. The cache keys on stage indices, so linked shaders are pinned:
    /// [`delete_resource`](Self::delete_resource) refuses them with
    /// [`BinderyError::ShaderInUse`].
    pub fn get_or_create_program(&mut self, stages: &ProgramStages) -> Result<ResourceId> {
        let kind = stages.program_kind()?;
        let mut natives: SmallVec<[(ObjectKind, NativeHandle); 6]> = SmallVec::new();
        for (stage, id) in stages.iter() {
            let handle = self.resources.resolve(id)?;
            let found = handle.decode_kind();
            if found != stage.object_kind() {
                return Err(ProgramStageError::WrongObjectKind { stage, found }.into());
            }
            natives.push((found, handle.decode_native()));
        }

        let sealed = self.sealed;
        let (device, resources, owned, linked) = (
            &mut self.device,
            &mut self.resources,
            &mut self.owned,
            &mut self.linked_programs,
        );
        self.programs.try_get_or_create(&stages.key(), |_| {
            assert_unsealed(sealed, "get_or_create_program");
            let program = create_registered(
                device,
                resources,
                owned,
                NativeObjectDesc::Program {
                    kind,
                    stages: &natives,
                },
            )?;
            linked.push((program, *stages));
            Ok(program)
        })
    }

    #[must_use]
    pub fn no_attrib_vertex_format(&self) -> ResourceId {
        self.no_attrib_vertex_format
    }

    #[must_use]
    pub fn common_vertex_formats(&self) -> Option<&CommonVertexFormats> {
        self.common_vertex_formats.as_ref()
    }

    // ========================================================================
    // State selection
    // ========================================================================

    #[must_use]
    pub fn rasterizer_state(&self, id: RasterizerStateId) -> Option<&RasterizerStateDesc> {
        self.rasterizer_states
            .store()
            .get(id.index() as usize)
            .map(|entry| &entry.descriptor)
    }

    #[must_use]
    pub fn depth_stencil_state(&self, id: DepthStencilStateId) -> Option<&DepthStencilStateDesc> {
        self.depth_stencil_states
            .store()
            .get(id.index() as usize)
            .map(|entry| &entry.descriptor)
    }

    #[must_use]
    pub fn blend_state(&self, id: BlendStateId) -> Option<&BlendStateDesc> {
        self.blend_states
            .store()
            .get(id.index() as usize)
            .map(|entry| &entry.descriptor)
    }

    pub fn set_rasterizer_state(&mut self, id: RasterizerStateId) -> Result<()> {
        let entry = self
            .rasterizer_states
            .store()
            .get(id.index() as usize)
            .ok_or(BinderyError::UnknownStateId {
                kind: StateKind::Rasterizer,
                index: id.index(),
            })?;
        self.device.apply_state(StateRef::Rasterizer {
            native: entry.id.native,
            desc: &entry.descriptor,
        });
        self.selected_rasterizer = Some(id);
        Ok(())
    }

    pub fn set_depth_stencil_state(&mut self, id: DepthStencilStateId) -> Result<()> {
        let entry = self
            .depth_stencil_states
            .store()
            .get(id.index() as usize)
            .ok_or(BinderyError::UnknownStateId {
                kind: StateKind::DepthStencil,
                index: id.index(),
            })?;
        self.device.apply_state(StateRef::DepthStencil {
            native: entry.id.native,
            desc: &entry.descriptor,
        });
        self.selected_depth_stencil = Some(id);
        Ok(())
    }

    /// Applies a blend state to color output `output`. Blend selection is not
    /// tracked by snapshots.
    pub fn set_blend_state(&mut self, output: u32, id: BlendStateId) -> Result<()> {
        let entry = self
            .blend_states
            .store()
            .get(id.index() as usize)
            .ok_or(BinderyError::UnknownStateId {
                kind: StateKind::Blend,
                index: id.index(),
            })?;
        self.device.apply_state(StateRef::Blend {
            output,
            native: entry.id.native,
            desc: &entry.descriptor,
        });
        Ok(())
    }

    #[must_use]
    pub fn selected_rasterizer_state(&self) -> Option<RasterizerStateId> {
        self.selected_rasterizer
    }

    #[must_use]
    pub fn selected_depth_stencil_state(&self) -> Option<DepthStencilStateId> {
        self.selected_depth_stencil
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Registers a caller-owned native object and returns its id.
    pub fn create_resource(&mut self, kind: ObjectKind, native: NativeHandle) -> Result<ResourceId> {
        assert_unsealed(self.sealed, "create_resource");
        let id = self.resources.new_id()?;
        self.resources
            .bind_handle(id, PackedHandle::encode(id, kind, native))?;
        log::trace!("Registered {kind} {native} as {id}");
        Ok(id)
    }

    /// Unregisters a resource created with [`create_resource`](Self::create_resource)
    /// and returns its handle. The native object itself is left to the caller.
    ///
    /// Shaders linked into a cached program stay registered for the life of
    /// the manager.
    pub fn delete_resource(&mut self, id: ResourceId) -> Result<PackedHandle> {
        assert_unsealed(self.sealed, "delete_resource");
        if self.owned.iter().any(|object| object.id == Some(id)) {
            return Err(BinderyError::CacheOwnedResource { id });
        }
        if let Some((program, _)) = self
            .linked_programs
            .iter()
            .find(|(_, stages)| stages.iter().any(|(_, shader)| shader == id))
        {
            log::error!("Cannot delete shader {id}: linked into program {program}");
            return Err(BinderyError::ShaderInUse {
                shader: id,
                program: *program,
            });
        }
        self.resources
            .delete_id(id)?
            .ok_or(BinderyError::ResourceId(ResourceIdError::Unbound(id)))
    }

    pub fn handle_of(&self, id: ResourceId) -> Result<PackedHandle> {
        Ok(self.resources.resolve(id)?)
    }

    pub fn kind_of(&self, id: ResourceId) -> Result<ObjectKind> {
        self.handle_of(id).map(PackedHandle::decode_kind)
    }

    pub fn native_of(&self, id: ResourceId) -> Result<NativeHandle> {
        self.handle_of(id).map(PackedHandle::decode_native)
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Bytes needed by [`save_bindings`](Self::save_bindings) right now.
    #[must_use]
    pub fn snapshot_size(&self) -> usize {
        snapshot::snapshot_size(&self.slots)
    }

    /// Saves slot contents and the selected rasterizer and depth/stencil
    /// states into `buf`. Writes nothing if `buf` is too small.
    pub fn save_bindings(&self, buf: &mut [u8]) -> Result<usize> {
        let selected = SelectedStates {
            rasterizer: self.selected_rasterizer.map(RasterizerStateId::index),
            depth_stencil: self.selected_depth_stencil.map(DepthStencilStateId::index),
        };
        snapshot::save(&self.slots, selected, buf)
    }

    /// Replaces all slot contents with the snapshot in `buf`, rebinds them on
    /// the device and re-applies the saved state selection. Nothing changes if
    /// `buf` fails validation.
    pub fn restore_bindings(&mut self, buf: &[u8]) -> Result<()> {
        let decoded = snapshot::decode(&self.slots, buf)?;
        let selected = decoded.selected();

        let rasterizer = match selected.rasterizer {
            Some(index) if index as usize >= self.rasterizer_states.len() => {
                return Err(BinderyError::UnknownStateId {
                    kind: StateKind::Rasterizer,
                    index,
                });
            }
            other => other.map(RasterizerStateId),
        };
        let depth_stencil = match selected.depth_stencil {
            Some(index) if index as usize >= self.depth_stencil_states.len() => {
                return Err(BinderyError::UnknownStateId {
                    kind: StateKind::DepthStencil,
                    index,
                });
            }
            other => other.map(DepthStencilStateId),
        };

        decoded.apply(&mut self.slots)?;
        rebind_table::<UniformBufferRange, _>(&mut self.device, &self.slots);
        rebind_table::<StorageBufferRange, _>(&mut self.device, &self.slots);
        rebind_table::<SampledTexture, _>(&mut self.device, &self.slots);

        match rasterizer {
            Some(id) => self.set_rasterizer_state(id)?,
            None => self.selected_rasterizer = None,
        }
        match depth_stencil {
            Some(id) => self.set_depth_stencil_state(id)?,
            None => self.selected_depth_stencil = None,
        }
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Ends setup. Irreversible.
    pub fn seal(&mut self) {
        if !self.sealed {
            self.sealed = true;
            log::info!("Binding state sealed");
            self.log_summary();
        }
    }

    #[inline]
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    #[must_use]
    pub fn stats(&self) -> BindingStats {
        BindingStats {
            slots: SlotKind::ALL.map(|kind| SlotUsage {
                kind,
                reserved: self.slots.reserved_count(kind),
                capacity: self.slots.capacity(kind),
            }),
            samplers: self.samplers.len(),
            rasterizer_states: self.rasterizer_states.len(),
            depth_stencil_states: self.depth_stencil_states.len(),
            blend_states: self.blend_states.len(),
            vertex_formats: self.vertex_formats.len(),
            programs: self.programs.len(),
            live_resources: self.resources.len(),
            owned_objects: self.owned.len(),
            sealed: self.sealed,
        }
    }

    pub fn log_summary(&self) {
        let stats = self.stats();
        for usage in stats.slots {
            log::info!("  {} slots: {}/{}", usage.kind, usage.reserved, usage.capacity);
        }
        log::info!(
            "  cached: {} samplers, {} rasterizer, {} depth/stencil, {} blend, {} vertex formats, {} programs",
            stats.samplers,
            stats.rasterizer_states,
            stats.depth_stencil_states,
            stats.blend_states,
            stats.vertex_formats,
            stats.programs,
        );
        log::info!("  live resource ids: {}", stats.live_resources);
    }

    /// Destroys every device object the caches created, newest first, and
    /// returns the backend. Resources registered with
    /// [`create_resource`](Self::create_resource) belong to the caller and are
    /// not destroyed.
    pub fn teardown(mut self) -> D {
        let count = self.owned.len();
        for object in self.owned.drain(..).rev() {
            self.device.destroy_native_object(object.kind, object.native);
        }
        log::info!("Binding state torn down: destroyed {count} device objects");
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCall, HeadlessDevice};

    fn manager() -> BindingStateManager<HeadlessDevice> {
        BindingStateManager::new(HeadlessDevice::new(), BindingStateConfig::default()).unwrap()
    }

    #[test]
    fn test_defaults_are_created_and_selected() {
        let state = manager();
        assert_eq!(state.selected_rasterizer_state(), Some(RasterizerStateId(0)));
        assert_eq!(state.selected_depth_stencil_state(), Some(DepthStencilStateId(0)));
        assert_eq!(state.blend_state(BlendStateId(0)), Some(&BlendStateDesc::DISABLED));
        let stats = state.stats();
        assert_eq!(stats.vertex_formats, 4);
        assert_eq!(state.kind_of(state.no_attrib_vertex_format()).unwrap(), ObjectKind::VertexArray);
    }

    #[test]
    fn test_bind_calls_device_only_for_new_slots() {
        let mut state = manager();
        state.device_mut().take_calls();
        let tex = SampledTexture::new(NativeHandle(40));
        state.bind_unique(tex).unwrap();
        state.bind_unique(tex).unwrap();
        let binds = state
            .device()
            .calls()
            .iter()
            .filter(|call| matches!(call, DeviceCall::Bind { .. }))
            .count();
        assert_eq!(binds, 1);
    }

    #[test]
    fn test_cached_objects_are_not_deletable() {
        let mut state = manager();
        let sampler = state.get_or_create_sampler(&SamplerDesc::default()).unwrap();
        assert!(matches!(
            state.delete_resource(sampler),
            Err(BinderyError::CacheOwnedResource { .. })
        ));
    }

    #[test]
    fn test_null_descriptor_is_not_bound() {
        let mut state = manager();
        assert!(matches!(
            state.bind_unique(SampledTexture::new(NativeHandle::NULL)),
            Err(BinderyError::NullDescriptor {
                kind: SlotKind::Texture
            })
        ));
        assert_eq!(state.slots().reserved_count(SlotKind::Texture), 0);
    }

    #[test]
    fn test_unknown_state_id_is_rejected() {
        let mut state = manager();
        assert!(matches!(
            state.set_rasterizer_state(RasterizerStateId(42)),
            Err(BinderyError::UnknownStateId {
                kind: StateKind::Rasterizer,
                index: 42
            })
        ));
        assert_eq!(state.selected_rasterizer_state(), Some(RasterizerStateId(0)));
    }

    #[test]
    #[should_panic(expected = "sealed")]
    fn test_new_state_after_seal_panics() {
        let mut state = manager();
        state.seal();
        state.get_or_create_blend(&BlendStateDesc::ALPHA);
    }

    #[test]
    fn test_cache_hit_after_seal_is_allowed() {
        let mut state = manager();
        let alpha = state.get_or_create_blend(&BlendStateDesc::ALPHA);
        state.seal();
        assert_eq!(state.get_or_create_blend(&BlendStateDesc::ALPHA), alpha);
    }
}
