use test_case::test_case;

use mirazh_device::{AllocKind, CpuRuntime, DeviceMemory, DeviceRuntime, UsmRegion};

use crate::{AccessMode, BackingKind, Buffer, Error};

#[test]
fn host_device_round_trip_preserves_content() {
    let host = Buffer::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0]);
    let device = host.try_to_device(&CpuRuntime).unwrap();

    assert_eq!(device.kind(), Some(BackingKind::Device));
    assert_ne!(device, host);

    let view = device.to_host(AccessMode::ReadWrite);
    assert_eq!(&view[..], &[1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn device_side_write_is_observed_by_read_write_view() {
    let host = Buffer::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0]);
    let device = host.to_device(&CpuRuntime);

    // A kernel writes element 2 through the raw allocation.
    let (memory, range) = device.device_memory().unwrap();
    memory
        .write_from(range.start + 2 * size_of::<f32>(), bytemuck::bytes_of(&9.0f32))
        .unwrap();

    let view = device.to_host(AccessMode::ReadWrite);
    assert_eq!(&view[..], &[1.0, 2.0, 9.0, 4.0, 5.0]);
}

#[test]
fn to_host_is_idempotent_without_intervening_writes() {
    let device = Buffer::from_vec(vec![4u32, 5, 6]).to_device(&CpuRuntime);

    let first: Vec<u32> = device.to_host(AccessMode::ReadOnly).to_vec();
    let second: Vec<u32> = device.to_host(AccessMode::ReadOnly).to_vec();
    assert_eq!(first, second);
}

#[test]
fn to_device_on_device_buffer_is_identity() {
    let device = Buffer::from_vec(vec![1u8, 2]).to_device(&CpuRuntime);
    let again = device.try_to_device(&CpuRuntime).unwrap();
    assert_eq!(again, device);
}

#[test]
fn to_unified_on_unified_buffer_is_identity() {
    let unified = Buffer::from_vec(vec![1u8, 2]).try_to_unified(&CpuRuntime).unwrap();
    let again = unified.try_to_unified(&CpuRuntime).unwrap();
    assert_eq!(again, unified);
}

#[test]
fn host_unified_round_trip_preserves_content() {
    let host = Buffer::from_vec(vec![7u32, 8, 9]);
    let unified = host.try_to_unified(&CpuRuntime).unwrap();

    assert_eq!(unified.kind(), Some(BackingKind::Unified));
    let (region, _) = unified.unified_region().unwrap();
    assert_eq!(region.kind(), AllocKind::Shared);

    assert_eq!(&unified.to_host(AccessMode::ReadOnly)[..], &[7, 8, 9]);
}

#[test]
fn device_to_unified_stages_through_host() {
    let device = Buffer::from_vec(vec![3u32, 1, 4, 1, 5]).to_device(&CpuRuntime);
    let unified = device.try_to_unified(&CpuRuntime).unwrap();

    assert_eq!(unified.kind(), Some(BackingKind::Unified));
    assert_eq!(&unified.to_host(AccessMode::ReadOnly)[..], &[3, 1, 4, 1, 5]);
    // The source keeps its own representation.
    assert_eq!(device.kind(), Some(BackingKind::Device));
}

#[test_case(AllocKind::Device; "device_resident")]
#[test_case(AllocKind::Shared; "migratable")]
fn device_addressable_unified_to_device_is_identity(kind: AllocKind) {
    let region = UsmRegion::zeroed(8, kind);
    let unified = Buffer::<u32>::from_unified(region);

    let device = unified.try_to_device(&CpuRuntime).unwrap();
    assert_eq!(device, unified);
}

#[test]
fn host_resident_unified_to_device_copies() {
    let region = UsmRegion::zeroed(8, AllocKind::Host);
    let unified = Buffer::<u32>::from_unified(region);
    unified
        .to_host_mut(AccessMode::WriteOnly)
        .copy_from_slice(&[11, 22]);

    let device = unified.try_to_device(&CpuRuntime).unwrap();
    assert_ne!(device, unified);
    assert_eq!(device.kind(), Some(BackingKind::Device));
    assert_eq!(&device.to_host(AccessMode::ReadOnly)[..], &[11, 22]);
}

#[test]
fn sub_buffer_converts_only_its_window() {
    let host = Buffer::from_vec(vec![1u32, 2, 3, 4, 5, 6]);
    let sub = host.sub_buffer(2, 3);

    let device = sub.to_device(&CpuRuntime);
    assert_eq!(device.len(), 3);
    assert_eq!(&device.to_host(AccessMode::ReadOnly)[..], &[3, 4, 5]);
}

#[test_case(AccessMode::ReadOnly, true; "read_only_syncs")]
#[test_case(AccessMode::ReadWrite, true; "read_write_syncs")]
#[test_case(AccessMode::WriteOnly, false; "write_only_skips_sync")]
fn device_view_synchronization_matrix(mode: AccessMode, synced: bool) {
    let device = Buffer::from_vec(vec![5u32, 6, 7]).to_device(&CpuRuntime);

    let view = device.to_host(mode);
    assert_eq!(view.len(), 3);
    if synced {
        assert_eq!(&view[..], &[5, 6, 7]);
    }
}

#[test_case(AccessMode::ReadOnly, 1; "read_only_fences")]
#[test_case(AccessMode::ReadWrite, 1; "read_write_fences")]
#[test_case(AccessMode::WriteOnly, 0; "write_only_skips_fence")]
fn migratable_region_fence_matrix(mode: AccessMode, fences: u64) {
    let unified = Buffer::from_vec(vec![1u32, 2]).try_to_unified(&CpuRuntime).unwrap();
    let (region, _) = unified.unified_region().unwrap();
    let before = region.fence_count();

    let _ = unified.to_host(mode);

    let (region, _) = unified.unified_region().unwrap();
    assert_eq!(region.fence_count() - before, fences);
}

#[test]
fn host_resident_region_never_fences() {
    let region = UsmRegion::zeroed(8, AllocKind::Host);
    let unified = Buffer::<u32>::from_unified(region);

    let _ = unified.to_host(AccessMode::ReadWrite);

    let (region, _) = unified.unified_region().unwrap();
    assert_eq!(region.fence_count(), 0);
}

/// A runtime with dedicated memory but no unified allocations.
#[derive(Debug)]
struct DedicatedOnlyRuntime;

impl DeviceRuntime for DedicatedOnlyRuntime {
    fn alloc(&self, size: usize) -> mirazh_device::Result<DeviceMemory> {
        CpuRuntime.alloc(size)
    }

    fn name(&self) -> &str {
        "DEDICATED"
    }
}

#[test]
fn unified_conversion_without_runtime_support_is_unsupported() {
    let host = Buffer::from_vec(vec![1u32, 2, 3]);

    let err = host.try_to_unified(&DedicatedOnlyRuntime).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedConversion {
            from: BackingKind::Host,
            ..
        }
    ));

    // The source is untouched by the failed conversion.
    assert_eq!(host.kind(), Some(BackingKind::Host));
    assert_eq!(&host.to_host(AccessMode::ReadOnly)[..], &[1, 2, 3]);
}

#[test]
fn dedicated_only_runtime_still_converts_to_device() {
    let host = Buffer::from_vec(vec![8u32, 9]);
    let device = host.try_to_device(&DedicatedOnlyRuntime).unwrap();
    assert_eq!(&device.to_host(AccessMode::ReadOnly)[..], &[8, 9]);
}
