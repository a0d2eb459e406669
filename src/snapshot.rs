//! Binding Snapshots
//!
//! Saves the contents of all three slot tables, plus the selected rasterizer
//! and depth/stencil state indices, into a caller-owned byte buffer, and
//! restores them later. This is a coarse state stack: save before a pass that
//! rebinds freely, restore afterwards.
//!
//! # Layout
//!
//! ```text
//! 0   SavedBindingsHeader (28 bytes)
//! 28  uniform-buffer records  (u32 slot, UniformBufferRange) × ubo_count
//! ..  storage-buffer records  (u32 slot, StorageBufferRange) × ssbo_count
//! ..  texture records         (u32 slot, SampledTexture)     × texture_count
//! ```
//!
//! Offsets in the header are measured from its first byte. Records are packed
//! without padding and read back unaligned. The blob uses host byte order and
//! is only meaningful to the process that wrote it.
//!
//! Saving is atomic: the exact size is computed up front and a too-small
//! buffer is rejected before any byte is written.

use bytemuck::{Pod, Zeroable, bytes_of, pod_read_unaligned};

use crate::descriptors::{
    BindingPoint, SampledTexture, SlotDescriptor, StorageBufferRange, UniformBufferRange,
};
use crate::errors::{BinderyError, Result};
use crate::slots::{SlotAllocator, SlotTables};

/// Fixed header at the start of every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct SavedBindingsHeader {
    /// Buffer bytes available for records (capacity minus header).
    pub data_block_size: u32,
    /// Buffer bytes left unused after the last record.
    pub remaining_size: u32,
    pub rasterizer_state_index: u32,
    pub depth_stencil_state_index: u32,
    pub ubo_offset: u16,
    pub ubo_count: u16,
    pub ssbo_offset: u16,
    pub ssbo_count: u16,
    pub texture_offset: u16,
    pub texture_count: u16,
}

pub const HEADER_SIZE: usize = size_of::<SavedBindingsHeader>();

/// Largest snapshot whose record offsets fit the header's 16-bit fields.
pub const MAX_SNAPSHOT_SIZE: usize = u16::MAX as usize;

/// Stored in place of a state index when no state is selected.
pub const NO_STATE: u32 = u32::MAX;

const _: () = assert!(HEADER_SIZE == 28);

/// State indices carried by a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectedStates {
    pub rasterizer: Option<u32>,
    pub depth_stencil: Option<u32>,
}

/// Progress of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotPhase {
    NotStarted,
    WriteHeader,
    WriteUboRecords,
    WriteSsboRecords,
    WriteTextureRecords,
    Done,
    Failed,
}

#[inline]
const fn record_size<D>() -> usize {
    size_of::<u32>() + size_of::<D>()
}

// ─── Layout ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Section {
    offset: usize,
    count: usize,
}

#[derive(Debug, Clone, Copy)]
struct SnapshotLayout {
    ubo: Section,
    ssbo: Section,
    texture: Section,
    total: usize,
}

impl SnapshotLayout {
    fn of(tables: &SlotTables) -> Self {
        let mut cursor = HEADER_SIZE;
        let mut next_section = |count: usize, record: usize| {
            let section = Section {
                offset: cursor,
                count,
            };
            cursor += count * record;
            section
        };
        let ubo = next_section(
            tables.uniform_buffers.reserved_count(),
            record_size::<UniformBufferRange>(),
        );
        let ssbo = next_section(
            tables.storage_buffers.reserved_count(),
            record_size::<StorageBufferRange>(),
        );
        let texture = next_section(
            tables.textures.reserved_count(),
            record_size::<SampledTexture>(),
        );
        Self {
            ubo,
            ssbo,
            texture,
            total: cursor,
        }
    }
}

/// Exact number of bytes [`save`] will write for `tables`.
#[must_use]
pub fn snapshot_size(tables: &SlotTables) -> usize {
    SnapshotLayout::of(tables).total
}

// ─── Save ─────────────────────────────────────────────────────────────────────

struct SnapshotWriter<'a> {
    buf: &'a mut [u8],
    cursor: usize,
    phase: SnapshotPhase,
}

impl<'a> SnapshotWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            cursor: 0,
            phase: SnapshotPhase::NotStarted,
        }
    }

    fn enter(&mut self, phase: SnapshotPhase) {
        log::trace!("snapshot: {:?} -> {:?} at byte {}", self.phase, phase, self.cursor);
        self.phase = phase;
    }

    fn write(&mut self, bytes: &[u8]) -> bool {
        let end = self.cursor + bytes.len();
        let Some(dst) = self.buf.get_mut(self.cursor..end) else {
            return false;
        };
        dst.copy_from_slice(bytes);
        self.cursor = end;
        true
    }

    fn write_records<D: SlotDescriptor>(&mut self, table: &SlotAllocator<D>) -> bool {
        table.for_each_reserved(|slot, desc| {
            if self.buf.len() - self.cursor < record_size::<D>() {
                return false;
            }
            self.write(bytes_of(&slot.get())) && self.write(bytes_of(desc))
        })
    }
}

/// Writes a snapshot of `tables` and `selected` into `buf`, returning the
/// number of bytes written.
pub fn save(tables: &SlotTables, selected: SelectedStates, buf: &mut [u8]) -> Result<usize> {
    let layout = SnapshotLayout::of(tables);
    if layout.total > MAX_SNAPSHOT_SIZE {
        return Err(BinderyError::SnapshotTooLarge {
            required: layout.total,
            max: MAX_SNAPSHOT_SIZE,
        });
    }
    let available = buf.len();
    if layout.total > available {
        log::error!(
            "Binding snapshot needs {} bytes, buffer holds {available}",
            layout.total
        );
        return Err(BinderyError::InsufficientSnapshotBuffer {
            required: layout.total,
            available,
        });
    }

    let header = SavedBindingsHeader {
        data_block_size: u32::try_from(available - HEADER_SIZE).unwrap_or(u32::MAX),
        remaining_size: u32::try_from(available - layout.total).unwrap_or(u32::MAX),
        rasterizer_state_index: selected.rasterizer.unwrap_or(NO_STATE),
        depth_stencil_state_index: selected.depth_stencil.unwrap_or(NO_STATE),
        ubo_offset: layout.ubo.offset as u16,
        ubo_count: layout.ubo.count as u16,
        ssbo_offset: layout.ssbo.offset as u16,
        ssbo_count: layout.ssbo.count as u16,
        texture_offset: layout.texture.offset as u16,
        texture_count: layout.texture.count as u16,
    };

    let mut writer = SnapshotWriter::new(buf);
    writer.enter(SnapshotPhase::WriteHeader);
    let mut ok = writer.write(bytes_of(&header));
    if ok {
        writer.enter(SnapshotPhase::WriteUboRecords);
        ok = writer.write_records(&tables.uniform_buffers);
    }
    if ok {
        writer.enter(SnapshotPhase::WriteSsboRecords);
        ok = writer.write_records(&tables.storage_buffers);
    }
    if ok {
        writer.enter(SnapshotPhase::WriteTextureRecords);
        ok = writer.write_records(&tables.textures);
    }
    if !ok {
        writer.enter(SnapshotPhase::Failed);
        return Err(BinderyError::InsufficientSnapshotBuffer {
            required: layout.total,
            available,
        });
    }

    writer.enter(SnapshotPhase::Done);
    debug_assert_eq!(writer.cursor, layout.total);
    Ok(writer.cursor)
}

// ─── Restore ──────────────────────────────────────────────────────────────────

/// A snapshot whose header and records have been checked against the tables
/// it will be applied to.
#[derive(Debug, Clone, Copy)]
pub struct DecodedSnapshot<'a> {
    header: SavedBindingsHeader,
    ubo: &'a [u8],
    ssbo: &'a [u8],
    texture: &'a [u8],
}

fn corrupt(reason: impl Into<String>) -> BinderyError {
    BinderyError::CorruptSnapshot {
        reason: reason.into(),
    }
}

fn section<'a, D: SlotDescriptor>(
    buf: &'a [u8],
    offset: u16,
    count: u16,
    table: &SlotAllocator<D>,
) -> Result<&'a [u8]> {
    let start = usize::from(offset);
    let len = usize::from(count) * record_size::<D>();
    if count > 0 && start < HEADER_SIZE {
        return Err(corrupt(format!("{} records overlap the header", D::KIND)));
    }
    let bytes = buf
        .get(start..start + len)
        .ok_or_else(|| corrupt(format!("{} records run past the end of the buffer", D::KIND)))?;

    for (slot, _) in records::<D>(bytes) {
        if slot.get() >= table.capacity() {
            return Err(BinderyError::SlotOutOfRange {
                kind: D::KIND,
                slot: slot.get(),
                capacity: table.capacity(),
            });
        }
    }
    Ok(bytes)
}

fn records<D: SlotDescriptor>(bytes: &[u8]) -> impl Iterator<Item = (BindingPoint, D)> + '_ {
    bytes.chunks_exact(record_size::<D>()).map(|record| {
        let (slot, desc) = record.split_at(size_of::<u32>());
        (
            BindingPoint(pod_read_unaligned::<u32>(slot)),
            pod_read_unaligned::<D>(desc),
        )
    })
}

/// Parses and validates `buf` without touching `tables`.
pub fn decode<'a>(tables: &SlotTables, buf: &'a [u8]) -> Result<DecodedSnapshot<'a>> {
    let header_bytes = buf
        .get(..HEADER_SIZE)
        .ok_or_else(|| corrupt(format!("{} bytes is shorter than the header", buf.len())))?;
    let header: SavedBindingsHeader = pod_read_unaligned(header_bytes);

    Ok(DecodedSnapshot {
        header,
        ubo: section(buf, header.ubo_offset, header.ubo_count, &tables.uniform_buffers)?,
        ssbo: section(buf, header.ssbo_offset, header.ssbo_count, &tables.storage_buffers)?,
        texture: section(buf, header.texture_offset, header.texture_count, &tables.textures)?,
    })
}

impl DecodedSnapshot<'_> {
    #[must_use]
    pub fn header(&self) -> &SavedBindingsHeader {
        &self.header
    }

    #[must_use]
    pub fn selected(&self) -> SelectedStates {
        let index = |raw: u32| (raw != NO_STATE).then_some(raw);
        SelectedStates {
            rasterizer: index(self.header.rasterizer_state_index),
            depth_stencil: index(self.header.depth_stencil_state_index),
        }
    }

    /// Clears `tables` and replays every record at its saved slot.
    pub fn apply(&self, tables: &mut SlotTables) -> Result<()> {
        tables.clear();
        for (slot, desc) in records::<UniformBufferRange>(self.ubo) {
            tables.uniform_buffers.force_set(slot, desc)?;
        }
        for (slot, desc) in records::<StorageBufferRange>(self.ssbo) {
            tables.storage_buffers.force_set(slot, desc)?;
        }
        for (slot, desc) in records::<SampledTexture>(self.texture) {
            tables.textures.force_set(slot, desc)?;
        }
        Ok(())
    }
}

/// Restores `tables` from `buf` and returns the saved state selection.
/// `tables` is left untouched if `buf` fails validation.
pub fn restore(tables: &mut SlotTables, buf: &[u8]) -> Result<SelectedStates> {
    let decoded = decode(tables, buf)?;
    decoded.apply(tables)?;
    Ok(decoded.selected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::NativeHandle;

    fn populated() -> SlotTables {
        let mut tables = SlotTables::new(4, 4, 8);
        tables
            .uniform_buffers
            .acquire(UniformBufferRange::new(NativeHandle(1), 0, 256))
            .unwrap();
        tables
            .uniform_buffers
            .acquire(UniformBufferRange::new(NativeHandle(1), 256, 256))
            .unwrap();
        tables
            .storage_buffers
            .force_set(BindingPoint(3), StorageBufferRange::new(NativeHandle(2), 0, 1024))
            .unwrap();
        for handle in 10..13 {
            tables.textures.acquire(SampledTexture::new(NativeHandle(handle))).unwrap();
        }
        tables.textures.reserve_without_descriptor().unwrap();
        tables
    }

    #[test]
    fn test_header_field_offsets() {
        let header = SavedBindingsHeader {
            ubo_offset: 0x0102,
            texture_count: 0x0304,
            ..Default::default()
        };
        let bytes = bytes_of(&header);
        assert_eq!(&bytes[16..18], &0x0102u16.to_ne_bytes());
        assert_eq!(&bytes[26..28], &0x0304u16.to_ne_bytes());
    }

    #[test]
    fn test_size_matches_bytes_written() {
        let tables = populated();
        let expected = HEADER_SIZE + 2 * 16 + 16 + 4 * 8;
        assert_eq!(snapshot_size(&tables), expected);

        let mut buf = [0u8; 256];
        let written = save(&tables, SelectedStates::default(), &mut buf).unwrap();
        assert_eq!(written, expected);

        let header: SavedBindingsHeader = pod_read_unaligned(&buf[..HEADER_SIZE]);
        assert_eq!(header.ubo_offset as usize, HEADER_SIZE);
        assert_eq!(header.ubo_count, 2);
        assert_eq!(header.ssbo_offset as usize, HEADER_SIZE + 32);
        assert_eq!(header.texture_count, 4);
        assert_eq!(header.data_block_size as usize, 256 - HEADER_SIZE);
        assert_eq!(header.remaining_size as usize, 256 - expected);
        assert_eq!(header.rasterizer_state_index, NO_STATE);
    }

    #[test]
    fn test_short_buffer_is_untouched() {
        let tables = populated();
        let needed = snapshot_size(&tables);
        let mut buf = vec![0xAAu8; needed - 1];
        let err = save(&tables, SelectedStates::default(), &mut buf).unwrap_err();
        assert!(matches!(
            err,
            BinderyError::InsufficientSnapshotBuffer { required, available }
                if required == needed && available == needed - 1
        ));
        assert!(buf.iter().all(|&byte| byte == 0xAA));
    }

    #[test]
    fn test_round_trip_reproduces_slots_and_selection() {
        let tables = populated();
        let selected = SelectedStates {
            rasterizer: Some(2),
            depth_stencil: None,
        };
        let mut buf = vec![0u8; snapshot_size(&tables)];
        save(&tables, selected, &mut buf).unwrap();

        let mut restored = SlotTables::new(4, 4, 8);
        restored
            .textures
            .acquire(SampledTexture::new(NativeHandle(99)))
            .unwrap();
        assert_eq!(restore(&mut restored, &buf).unwrap(), selected);

        let dump = |t: &SlotTables| {
            (
                t.uniform_buffers.iter_reserved().map(|(s, d)| (s, *d)).collect::<Vec<_>>(),
                t.storage_buffers.iter_reserved().map(|(s, d)| (s, *d)).collect::<Vec<_>>(),
                t.textures.iter_reserved().map(|(s, d)| (s, *d)).collect::<Vec<_>>(),
            )
        };
        assert_eq!(dump(&restored), dump(&tables));
        assert_eq!(restored.textures.find_bound(&SampledTexture::new(NativeHandle(99))), None);
    }

    #[test]
    fn test_restore_rejects_out_of_range_slot_without_mutating() {
        let tables = populated();
        let mut buf = vec![0u8; snapshot_size(&tables)];
        save(&tables, SelectedStates::default(), &mut buf).unwrap();

        let mut smaller = SlotTables::new(4, 2, 8);
        smaller
            .uniform_buffers
            .acquire(UniformBufferRange::new(NativeHandle(7), 0, 16))
            .unwrap();
        assert!(matches!(
            restore(&mut smaller, &buf),
            Err(BinderyError::SlotOutOfRange { slot: 3, .. })
        ));
        assert_eq!(smaller.uniform_buffers.reserved_count(), 1);
    }

    #[test]
    fn test_restore_rejects_truncated_buffers() {
        let tables = populated();
        let mut buf = vec![0u8; snapshot_size(&tables)];
        save(&tables, SelectedStates::default(), &mut buf).unwrap();

        let mut target = SlotTables::new(4, 4, 8);
        assert!(matches!(
            restore(&mut target, &buf[..HEADER_SIZE - 1]),
            Err(BinderyError::CorruptSnapshot { .. })
        ));
        assert!(matches!(
            restore(&mut target, &buf[..buf.len() - 1]),
            Err(BinderyError::CorruptSnapshot { .. })
        ));
    }

    #[test]
    fn test_empty_tables_snapshot_is_header_only() {
        let tables = SlotTables::new(4, 4, 4);
        let mut buf = [0u8; HEADER_SIZE];
        assert_eq!(save(&tables, SelectedStates::default(), &mut buf).unwrap(), HEADER_SIZE);
        let mut target = populated();
        restore(&mut target, &buf).unwrap();
        assert_eq!(target.textures.reserved_count(), 0);
    }
}
