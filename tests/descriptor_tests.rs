//! Descriptor and Configuration Tests
//!
//! Tests for:
//! - Vertex formats: attribute validation, packing, common layouts
//! - Program stages: stage-combination rules, cache keys
//! - Render-state descriptors: float canonicalization, presets
//! - BindingStateConfig: serde defaults and round trip
//! - Packed handles and resource ids from bindery_core

use bindery::descriptors::{
    ComponentType, CompareFunction, ProgramStageError, RasterizerFlags, StencilFaceOps, StencilOp,
    VertexFormatError,
};
use bindery::{
    BindingStateConfig, DepthStencilStateDesc, NativeHandle, ObjectKind,
    PackedHandle, ProgramStages, RasterizerStateDesc, ResourceId, ResourceIdError, ResourceTable,
    ShaderStage, VertexAttribute, VertexFormatDesc, ceil_log2,
};

fn ids<const N: usize>() -> [ResourceId; N] {
    let mut table = ResourceTable::new();
    std::array::from_fn(|_| table.new_id().unwrap())
}

// ============================================================================
// Vertex Formats
// ============================================================================

#[test]
fn vertex_format_attributes_survive_packing() {
    let color = VertexAttribute::float(4, 16)
        .with_type(ComponentType::U8, true)
        .with_binding(2)
        .per_instance(1);
    let format =
        VertexFormatDesc::from_attributes(&[VertexAttribute::float(3, 0), color]).unwrap();

    assert_eq!(format.attribute_count(), 2);
    assert_eq!(format.attribute(1), Some(color));
    assert_eq!(format.attribute(2), None);
    assert_eq!(color.byte_size(), 4);
}

#[test]
fn vertex_format_rejects_bad_attributes() {
    assert!(matches!(
        VertexFormatDesc::from_attributes(&[VertexAttribute::float(5, 0)]),
        Err(VertexFormatError::ComponentCount { location: 0, count: 5 })
    ));
    assert!(matches!(
        VertexFormatDesc::from_attributes(&[VertexAttribute::float(3, 0).with_binding(16)]),
        Err(VertexFormatError::BufferBinding { binding: 16, .. })
    ));
    let too_many = [VertexAttribute::float(1, 0); 9];
    assert!(matches!(
        VertexFormatDesc::from_attributes(&too_many),
        Err(VertexFormatError::TooManyAttributes { count: 9 })
    ));
}

#[test]
fn common_vertex_formats_match_explicit_ones() {
    let explicit = VertexFormatDesc::from_attributes(&[
        VertexAttribute::float(3, 0),
        VertexAttribute::float(3, 12),
        VertexAttribute::float(2, 24),
    ])
    .unwrap();
    assert_eq!(VertexFormatDesc::position_normal_uv(), explicit);
    assert!(VertexFormatDesc::empty().is_empty());
    assert!(!VertexFormatDesc::position().is_empty());
}

// ============================================================================
// Program Stages
// ============================================================================

#[test]
fn program_stage_combinations() {
    let [vs, fs, gs, tc, te, cs] = ids();

    assert_eq!(
        ProgramStages::graphics(vs, fs).with_geometry(gs).program_kind(),
        Ok(ObjectKind::GraphicsProgram)
    );
    assert_eq!(
        ProgramStages::compute(cs).program_kind(),
        Ok(ObjectKind::ComputeProgram)
    );
    assert_eq!(
        ProgramStages::default().program_kind(),
        Err(ProgramStageError::Empty)
    );

    let mut mixed = ProgramStages::graphics(vs, fs);
    mixed.compute = Some(cs);
    assert_eq!(mixed.program_kind(), Err(ProgramStageError::MixedComputeAndGraphics));

    let mut half_tessellated = ProgramStages::graphics(vs, fs);
    half_tessellated.tess_control = Some(tc);
    assert_eq!(
        half_tessellated.program_kind(),
        Err(ProgramStageError::IncompleteTessellation)
    );
    assert_eq!(
        ProgramStages::graphics(vs, fs)
            .with_tessellation(tc, te)
            .program_kind(),
        Ok(ObjectKind::GraphicsProgram)
    );

    let no_fragment = ProgramStages {
        vertex: Some(vs),
        ..ProgramStages::default()
    };
    assert_eq!(
        no_fragment.program_kind(),
        Err(ProgramStageError::MissingStage(ShaderStage::Fragment))
    );
}

#[test]
fn program_key_packs_stage_indices() {
    let [vs, fs] = ids();
    let key = ProgramStages::graphics(vs, fs).key();
    assert_eq!(key.words()[0], (u32::from(vs.index()) << 16) | u32::from(fs.index()));
    assert_eq!(key.words()[1], 0);
    assert_eq!(key.stage_index(ShaderStage::Fragment), fs.index());
    assert_eq!(key.stage_index(ShaderStage::Compute), 0);
}

// ============================================================================
// Render-State Descriptors
// ============================================================================

#[test]
fn rasterizer_depth_bias_ignores_zero_sign() {
    let a = RasterizerStateDesc::default().with_depth_bias(1, 0.0);
    let b = RasterizerStateDesc::default().with_depth_bias(1, -0.0);
    assert_eq!(a, b);
    assert_ne!(a, RasterizerStateDesc::default().with_depth_bias(2, 0.0));
    assert_eq!(RasterizerStateDesc::default().flags, RasterizerFlags::DEPTH_CLAMP);
}

#[test]
fn depth_stencil_presets() {
    let disabled = DepthStencilStateDesc::disabled();
    assert_ne!(disabled, DepthStencilStateDesc::default());

    let stencilled = DepthStencilStateDesc::default().with_stencil(
        StencilFaceOps {
            pass: StencilOp::Replace,
            ..StencilFaceOps::default()
        },
        0xFF,
    );
    assert_ne!(stencilled, DepthStencilStateDesc::default());
    assert_eq!(
        DepthStencilStateDesc::default().with_depth(true, true, CompareFunction::Less),
        DepthStencilStateDesc::default()
    );
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn config_missing_fields_take_defaults() {
    let config: BindingStateConfig =
        serde_json::from_str(r#"{ "max_texture_units": 24 }"#).unwrap();
    assert_eq!(config.max_texture_units, 24);
    assert_eq!(config.max_uniform_buffers, BindingStateConfig::default().max_uniform_buffers);
    assert!(config.register_common_vertex_formats);
}

#[test]
fn config_round_trips_through_json() -> anyhow::Result<()> {
    let config = BindingStateConfig::default()
        .with_storage_buffers(4)
        .with_common_vertex_formats(false);
    let json = serde_json::to_string(&config)?;
    let back: BindingStateConfig = serde_json::from_str(&json)?;
    assert_eq!(back, config);
    Ok(())
}

// ============================================================================
// Handles & Resource Ids
// ============================================================================

#[test]
fn kind_field_width_covers_every_kind() {
    assert_eq!(ceil_log2(ObjectKind::COUNT as u32), 5);
    for kind in ObjectKind::ALL {
        assert_eq!(ObjectKind::from_tag(kind.tag()), Some(*kind));
    }
}

#[test]
fn packed_handle_keeps_all_fields() {
    let [id] = ids();
    let handle = PackedHandle::encode(id, ObjectKind::BlendState, NativeHandle(u32::MAX));
    assert_eq!(handle.decode_id(), Some(id));
    assert_eq!(handle.decode_kind(), ObjectKind::BlendState);
    assert_eq!(handle.decode_native(), NativeHandle(u32::MAX));
    assert!(!PackedHandle::INVALID.is_valid());
}

#[test]
fn resource_ids_are_recycled_with_new_generation() {
    let mut table = ResourceTable::new();
    let first = table.new_id().unwrap();
    let second = table.new_id().unwrap();
    table.delete_id(first).unwrap();

    let reused = table.new_id().unwrap();
    assert_eq!(reused.index(), first.index());
    assert_eq!(reused.generation(), first.generation() + 1);
    assert!(matches!(
        table.resolve(first),
        Err(ResourceIdError::Stale { .. })
    ));
    assert!(matches!(
        table.resolve(second),
        Err(ResourceIdError::Unbound(_))
    ));
    assert_eq!(table.len(), 2);
}
