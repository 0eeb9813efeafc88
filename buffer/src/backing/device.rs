use std::marker::PhantomData;
use std::sync::Arc;

use bytemuck::Pod;
use mirazh_device::DeviceMemory;

/// An element window into opaque accelerator memory.
///
/// Host access goes through staging copies; the handle itself never yields a
/// host pointer.
pub(crate) struct DeviceBacking<T> {
    memory: Arc<DeviceMemory>,
    /// Window start, in elements.
    offset: usize,
    /// Window length, in elements.
    len: usize,
    _elem: PhantomData<fn() -> T>,
}

impl<T> DeviceBacking<T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn sub_range(&self, offset: usize, len: usize) -> Self {
        Self {
            memory: Arc::clone(&self.memory),
            offset: self.offset + offset,
            len,
            _elem: PhantomData,
        }
    }

    pub fn memory(&self) -> &Arc<DeviceMemory> {
        &self.memory
    }

    pub fn byte_offset(&self) -> usize {
        self.offset * size_of::<T>()
    }

    pub fn byte_len(&self) -> usize {
        self.len * size_of::<T>()
    }
}

impl<T: Pod> DeviceBacking<T> {
    /// Wrap an existing allocation without copying.
    ///
    /// The allocation must divide exactly into elements of `T`.
    pub fn new(memory: Arc<DeviceMemory>) -> Self {
        let elem = size_of::<T>();
        assert!(elem > 0, "zero-sized element types cannot back a buffer");
        assert!(
            memory.len() % elem == 0,
            "device allocation of {} bytes does not divide into {elem}-byte elements",
            memory.len(),
        );
        let len = memory.len() / elem;
        Self {
            memory,
            offset: 0,
            len,
            _elem: PhantomData,
        }
    }

    /// Stage the window's content to the host. Blocks until the copy has
    /// completed and observes all prior device-side writes.
    pub fn read_to_vec(&self) -> mirazh_device::Result<Vec<T>> {
        let mut staged = vec![T::zeroed(); self.len];
        self.memory
            .read_into(self.byte_offset(), bytemuck::cast_slice_mut(&mut staged[..]))?;
        Ok(staged)
    }
}
