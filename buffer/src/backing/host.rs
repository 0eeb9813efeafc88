use std::sync::Arc;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

/// Host storage: owned by the backing, or externally owned raw parts.
enum HostMem<T> {
    Owned(Box<[T]>),
    /// Externally owned; never freed here. See `Buffer::from_raw_parts`.
    Raw { ptr: *mut T, len: usize },
}

// `Raw` upholds Send/Sync through the `from_raw_parts` contract (valid,
// externally unaliased for the buffer's lifetime); `Owned` is a plain box.
unsafe impl<T: Send> Send for HostMem<T> {}
unsafe impl<T: Sync> Sync for HostMem<T> {}

impl<T> HostMem<T> {
    fn as_slice(&self) -> &[T] {
        match self {
            HostMem::Owned(data) => data,
            HostMem::Raw { ptr, len } => unsafe { std::slice::from_raw_parts(*ptr, *len) },
        }
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            HostMem::Owned(data) => data,
            HostMem::Raw { ptr, len } => unsafe { std::slice::from_raw_parts_mut(*ptr, *len) },
        }
    }
}

/// A window into a shared host array.
///
/// Sub-buffers clone the `Arc` and narrow `{offset, len}`, so writes through
/// any window land in the same array.
pub(crate) struct HostBacking<T> {
    mem: Arc<RwLock<HostMem<T>>>,
    offset: usize,
    len: usize,
}

impl<T> HostBacking<T> {
    pub fn from_vec(data: Vec<T>) -> Self {
        let data = data.into_boxed_slice();
        let len = data.len();
        Self {
            mem: Arc::new(RwLock::new(HostMem::Owned(data))),
            offset: 0,
            len,
        }
    }

    /// See `Buffer::from_raw_parts` for the safety contract.
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize) -> Self {
        Self {
            mem: Arc::new(RwLock::new(HostMem::Raw { ptr, len })),
            offset: 0,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn sub_range(&self, offset: usize, len: usize) -> Self {
        Self {
            mem: Arc::clone(&self.mem),
            offset: self.offset + offset,
            len,
        }
    }

    /// Shared view of the window. Zero-copy.
    pub fn read(&self) -> MappedRwLockReadGuard<'_, [T]> {
        RwLockReadGuard::map(self.mem.read(), |mem| {
            &mem.as_slice()[self.offset..self.offset + self.len]
        })
    }

    /// Exclusive view of the window. Zero-copy; writes land in the shared
    /// array immediately.
    pub fn write(&self) -> MappedRwLockWriteGuard<'_, [T]> {
        RwLockWriteGuard::map(self.mem.write(), |mem| {
            &mut mem.as_mut_slice()[self.offset..self.offset + self.len]
        })
    }
}
