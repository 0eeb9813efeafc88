use strum::VariantArray;
use test_case::test_case;

use crate::usm::{AllocKind, UsmRegion};

#[test_case(AllocKind::Host, false; "host_resident")]
#[test_case(AllocKind::Device, true; "device_resident")]
#[test_case(AllocKind::Shared, true; "migratable")]
fn fence_requirement(kind: AllocKind, needs_fence: bool) {
    assert_eq!(kind.needs_fence(), needs_fence);
}

#[test]
fn every_kind_allocates() {
    for kind in AllocKind::VARIANTS {
        let region = UsmRegion::zeroed(24, *kind);
        assert_eq!(region.len(), 24);
        assert_eq!(region.kind(), *kind);
        assert!(region.host_read().iter().all(|byte| *byte == 0));
    }
}

#[test]
fn host_mapping_round_trip() {
    let region = UsmRegion::zeroed(8, AllocKind::Shared);

    region.host_write().copy_from_slice(&[9, 8, 7, 6, 5, 4, 3, 2]);
    assert_eq!(&region.host_read()[..], &[9, 8, 7, 6, 5, 4, 3, 2]);
}

#[test]
fn mapping_is_cut_to_region_len() {
    // 20 bytes round up to two 16-byte blocks; the mapping must not expose
    // the padding.
    let region = UsmRegion::zeroed(20, AllocKind::Host);
    assert_eq!(region.host_read().len(), 20);
    assert_eq!(region.host_write().len(), 20);
}

#[test]
fn typed_views_stay_aligned() {
    let region = UsmRegion::zeroed(32, AllocKind::Shared);
    let guard = region.host_read();
    assert_eq!(guard.as_ptr().addr() % 16, 0);
}

#[test]
fn fences_are_counted() {
    let region = UsmRegion::zeroed(4, AllocKind::Device);
    assert_eq!(region.fence_count(), 0);

    region.fence().unwrap();
    region.fence().unwrap();
    assert_eq!(region.fence_count(), 2);
}

#[test]
fn raw_region_is_not_freed() {
    let mut storage = vec![1u8, 2, 3, 4];
    {
        let region =
            unsafe { UsmRegion::from_raw_parts(storage.as_mut_ptr(), storage.len(), AllocKind::Host) };
        assert_eq!(&region.host_read()[..], &[1, 2, 3, 4]);
        region.host_write()[0] = 42;
    }
    // The backing vec is still ours after the region is gone.
    assert_eq!(storage, vec![42, 2, 3, 4]);
}

#[test]
fn zero_len_region() {
    let region = UsmRegion::zeroed(0, AllocKind::Shared);
    assert!(region.is_empty());
    assert!(region.host_read().is_empty());
}
