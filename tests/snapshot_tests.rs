//! Binding Snapshot Tests
//!
//! Tests for:
//! - save/restore on bare slot tables, including descriptor-less reservations
//! - Validation of corrupt or foreign snapshots before anything is touched
//! - Selected state indices carried through the header

use bindery::snapshot::{self, HEADER_SIZE, SavedBindingsHeader, SelectedStates};
use bindery::{
    BinderyError, BindingPoint, NativeHandle, SampledTexture, SlotKind, SlotTables,
    StorageBufferRange, UniformBufferRange,
};

fn tables_with_bindings() -> SlotTables {
    let mut tables = SlotTables::new(8, 4, 16);
    tables
        .get_mut::<UniformBufferRange>()
        .acquire(UniformBufferRange::new(NativeHandle(1), 0, 64))
        .unwrap();
    tables
        .get_mut::<StorageBufferRange>()
        .force_set(BindingPoint::new(2), StorageBufferRange::new(NativeHandle(2), 128, 512))
        .unwrap();
    for handle in [30, 31, 32] {
        tables
            .get_mut::<SampledTexture>()
            .acquire(SampledTexture::new(NativeHandle(handle)))
            .unwrap();
    }
    tables.reserve(SlotKind::Texture).unwrap();
    tables
}

fn saved(tables: &SlotTables, selected: SelectedStates) -> Vec<u8> {
    let mut buf = vec![0u8; snapshot::snapshot_size(tables)];
    snapshot::save(tables, selected, &mut buf).unwrap();
    buf
}

// ============================================================================
// Round Trip
// ============================================================================

#[test]
fn restore_reproduces_slot_positions() {
    let source = tables_with_bindings();
    let selected = SelectedStates {
        rasterizer: Some(2),
        depth_stencil: None,
    };
    let buf = saved(&source, selected);

    let mut tables = SlotTables::new(8, 4, 16);
    tables
        .get_mut::<SampledTexture>()
        .acquire(SampledTexture::new(NativeHandle(99)))
        .unwrap();
    let restored = snapshot::restore(&mut tables, &buf).unwrap();

    assert_eq!(restored, selected);
    for kind in SlotKind::ALL {
        assert_eq!(tables.reserved_count(kind), source.reserved_count(kind));
    }
    assert_eq!(
        tables.storage_buffers().get(BindingPoint::new(2)),
        Some(&StorageBufferRange::new(NativeHandle(2), 128, 512))
    );
    assert!(tables.textures().is_reserved(BindingPoint::new(3)));
    assert_eq!(tables.textures().get(BindingPoint::new(3)), None);
    assert_eq!(tables.textures().find_bound(&SampledTexture::new(NativeHandle(99))), None);
}

#[test]
fn empty_tables_save_just_the_header() {
    let tables = SlotTables::new(4, 4, 4);
    assert_eq!(snapshot::snapshot_size(&tables), HEADER_SIZE);
    let buf = saved(&tables, SelectedStates::default());
    let mut other = tables_with_bindings();
    snapshot::restore(&mut other, &buf).unwrap();
    for kind in SlotKind::ALL {
        assert_eq!(other.reserved_count(kind), 0);
    }
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn truncated_snapshot_is_rejected_untouched() {
    let buf = saved(&tables_with_bindings(), SelectedStates::default());
    let mut tables = SlotTables::new(8, 4, 16);
    tables.reserve(SlotKind::UniformBuffer).unwrap();

    let err = snapshot::restore(&mut tables, &buf[..buf.len() - 1]).unwrap_err();
    assert!(matches!(err, BinderyError::CorruptSnapshot { .. }));
    assert_eq!(tables.reserved_count(SlotKind::UniformBuffer), 1);

    let err = snapshot::restore(&mut tables, &buf[..HEADER_SIZE - 1]).unwrap_err();
    assert!(matches!(err, BinderyError::CorruptSnapshot { .. }));
}

#[test]
fn snapshot_from_larger_tables_is_rejected() {
    let mut large = SlotTables::new(8, 4, 16);
    large
        .get_mut::<SampledTexture>()
        .force_set(BindingPoint::new(12), SampledTexture::new(NativeHandle(5)))
        .unwrap();
    let buf = saved(&large, SelectedStates::default());

    let mut small = SlotTables::new(8, 4, 8);
    let err = snapshot::restore(&mut small, &buf).unwrap_err();
    assert!(matches!(
        err,
        BinderyError::SlotOutOfRange {
            kind: SlotKind::Texture,
            slot: 12,
            capacity: 8
        }
    ));
}

#[test]
fn header_reports_buffer_usage() {
    let tables = tables_with_bindings();
    let needed = snapshot::snapshot_size(&tables);
    let mut buf = vec![0u8; needed + 100];
    let written = snapshot::save(&tables, SelectedStates::default(), &mut buf).unwrap();
    assert_eq!(written, needed);

    let decoded = snapshot::decode(&tables, &buf).unwrap();
    let header: &SavedBindingsHeader = decoded.header();
    assert_eq!(header.remaining_size, 100);
    assert_eq!(header.texture_count, 4);
    assert_eq!(decoded.selected(), SelectedStates::default());
}

#[test]
fn oversized_snapshot_is_refused() {
    let mut tables = SlotTables::new(0, 0, 9000);
    for _ in 0..8200 {
        tables.reserve(SlotKind::Texture).unwrap();
    }
    let required = snapshot::snapshot_size(&tables);
    assert!(required > snapshot::MAX_SNAPSHOT_SIZE);

    let mut buf = vec![0x11u8; required];
    assert!(matches!(
        snapshot::save(&tables, SelectedStates::default(), &mut buf),
        Err(BinderyError::SnapshotTooLarge { max, .. }) if max == snapshot::MAX_SNAPSHOT_SIZE
    ));
    assert!(buf.iter().all(|byte| *byte == 0x11));
}
