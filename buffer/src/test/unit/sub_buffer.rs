use mirazh_device::CpuRuntime;

use crate::{AccessMode, Buffer};

#[test]
fn sub_buffer_selects_parent_range() {
    let parent = Buffer::from_vec(vec![10u32, 20, 30, 40, 50]);
    let sub = parent.sub_buffer(1, 3);

    assert_eq!(sub.len(), 3);
    assert_eq!(&sub.to_host(AccessMode::ReadOnly)[..], &[20, 30, 40]);
}

#[test]
fn sub_buffer_aliases_parent_storage() {
    let parent = Buffer::from_vec(vec![0u32; 5]);
    let sub = parent.sub_buffer(2, 2);

    sub.to_host_mut(AccessMode::ReadWrite)[0] = 99;

    assert_eq!(&parent.to_host(AccessMode::ReadOnly)[..], &[0, 0, 99, 0, 0]);
}

#[test]
fn full_range_sub_buffer_equals_content_not_identity() {
    let parent = Buffer::from_vec(vec![1u8, 2, 3]);
    let sub = parent.sub_buffer(0, parent.len());

    assert_ne!(sub, parent);
    assert_eq!(
        &sub.to_host(AccessMode::ReadOnly)[..],
        &parent.to_host(AccessMode::ReadOnly)[..],
    );
}

#[test]
fn zero_length_tail_is_valid_but_not_null() {
    let parent = Buffer::from_vec(vec![1u8, 2, 3]);
    let tail = parent.sub_buffer(3, 0);

    assert!(!tail.is_null());
    assert!(tail.is_empty());
    assert_eq!(tail.to_host(AccessMode::ReadOnly).len(), 0);
}

#[test]
#[should_panic(expected = "exceeds buffer")]
fn out_of_range_sub_buffer_panics() {
    let parent = Buffer::from_vec(vec![1u8, 2, 3, 4, 5]);
    let _ = parent.sub_buffer(3, 3);
}

#[test]
#[should_panic(expected = "exceeds buffer")]
fn out_of_range_sub_buffer_panics_in_try_form_too() {
    let parent = Buffer::from_vec(vec![1u8, 2, 3, 4, 5]);
    let _ = parent.try_sub_buffer(6, 0);
}

#[test]
fn sub_buffer_of_sub_buffer_composes_offsets() {
    let parent = Buffer::from_vec((0u32..10).collect::<Vec<_>>());
    let middle = parent.sub_buffer(2, 6);
    let inner = middle.sub_buffer(1, 3);

    assert_eq!(&inner.to_host(AccessMode::ReadOnly)[..], &[3, 4, 5]);
}

#[test]
fn device_sub_buffer_aliases_allocation() {
    let parent = Buffer::from_vec(vec![1u32, 2, 3, 4]).to_device(&CpuRuntime);
    let sub = parent.sub_buffer(1, 2);

    assert_eq!(&sub.to_host(AccessMode::ReadOnly)[..], &[2, 3]);

    // A device-side write through the parent's allocation shows up in the
    // sub-buffer's window.
    let (memory, range) = parent.device_memory().unwrap();
    memory
        .write_from(range.start + 4, bytemuck::bytes_of(&9u32))
        .unwrap();
    assert_eq!(&sub.to_host(AccessMode::ReadOnly)[..], &[9, 3]);
}

#[test]
fn unified_sub_buffer_aliases_region() {
    let parent = Buffer::from_vec(vec![1u32, 2, 3, 4])
        .try_to_unified(&CpuRuntime)
        .unwrap();
    let sub = parent.sub_buffer(2, 2);

    sub.to_host_mut(AccessMode::ReadWrite)[1] = 44;
    assert_eq!(&parent.to_host(AccessMode::ReadOnly)[..], &[1, 2, 3, 44]);
}
