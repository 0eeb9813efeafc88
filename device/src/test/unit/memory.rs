use crate::{CpuRuntime, DeviceRuntime, Error};

#[test]
fn alloc_is_zeroed() {
    let memory = CpuRuntime.alloc(16).unwrap();
    assert_eq!(memory.len(), 16);

    let mut out = vec![0xffu8; 16];
    memory.read_into(0, &mut out).unwrap();
    assert_eq!(out, vec![0u8; 16]);
}

#[test]
fn staging_round_trip_at_offset() {
    let memory = CpuRuntime.alloc(32).unwrap();

    memory.write_from(8, &[1, 2, 3, 4]).unwrap();

    let mut out = [0u8; 4];
    memory.read_into(8, &mut out).unwrap();
    assert_eq!(out, [1, 2, 3, 4]);

    // Bytes around the window stay untouched.
    let mut all = [0u8; 32];
    memory.read_into(0, &mut all).unwrap();
    assert_eq!(&all[..8], &[0; 8]);
    assert_eq!(&all[12..], &[0; 20]);
}

#[test]
fn read_out_of_bounds_is_rejected() {
    let memory = CpuRuntime.alloc(8).unwrap();

    let mut out = [0u8; 4];
    let err = memory.read_into(6, &mut out).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { offset: 6, len: 4, size: 8 }));
}

#[test]
fn write_out_of_bounds_is_rejected() {
    let memory = CpuRuntime.alloc(8).unwrap();

    let err = memory.write_from(usize::MAX, &[1]).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { .. }));
}

#[test]
fn zero_sized_allocation() {
    let memory = CpuRuntime.alloc(0).unwrap();
    assert!(memory.is_empty());
    memory.read_into(0, &mut []).unwrap();
    memory.synchronize().unwrap();
}
