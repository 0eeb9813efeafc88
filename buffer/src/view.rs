//! Host-visible views of buffer contents.
//!
//! Views are guards: host and unified storage is mapped zero-copy under its
//! lock, accelerator storage is staged into a host copy. A [`HostViewMut`]
//! over staged content pushes it back to the source when released; use
//! [`HostViewMut::commit`] to observe a write-back failure instead of having
//! it logged and swallowed on drop.
//!
//! A view borrows its buffer. Release it before requesting a conflicting
//! view of the same storage on the same thread, or the storage lock will
//! block.

use std::ops::{Deref, DerefMut};

use bytemuck::Pod;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};
use snafu::ResultExt;

use mirazh_device::{DeviceMemory, UsmReadGuard, UsmWriteGuard};

use crate::backing::UnifiedBacking;
use crate::error::{Result, TransferSnafu};

/// Shared host view of buffer contents.
pub struct HostView<'a, T: Pod> {
    repr: ViewRepr<'a, T>,
}

enum ViewRepr<'a, T: Pod> {
    /// Zero-copy window into host storage.
    Host(MappedRwLockReadGuard<'a, [T]>),
    /// Zero-copy window into a unified region's mapping.
    Unified {
        guard: UsmReadGuard<'a>,
        byte_offset: usize,
        byte_len: usize,
    },
    /// Staged copy of accelerator-resident content.
    Staged(Vec<T>),
}

impl<'a, T: Pod> HostView<'a, T> {
    pub(crate) fn from_host(guard: MappedRwLockReadGuard<'a, [T]>) -> Self {
        Self {
            repr: ViewRepr::Host(guard),
        }
    }

    pub(crate) fn from_unified(backing: &'a UnifiedBacking<T>) -> Self {
        Self {
            repr: ViewRepr::Unified {
                guard: backing.region().host_read(),
                byte_offset: backing.byte_offset(),
                byte_len: backing.byte_len(),
            },
        }
    }

    pub(crate) fn from_staged(data: Vec<T>) -> Self {
        Self {
            repr: ViewRepr::Staged(data),
        }
    }
}

impl<T: Pod> Deref for HostView<'_, T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        match &self.repr {
            ViewRepr::Host(guard) => guard,
            ViewRepr::Unified {
                guard,
                byte_offset,
                byte_len,
            } => bytemuck::cast_slice(&guard[*byte_offset..*byte_offset + *byte_len]),
            ViewRepr::Staged(data) => data,
        }
    }
}

/// Where staged mutable content goes when the view is released.
pub(crate) struct StagedTarget<'a> {
    memory: &'a DeviceMemory,
    byte_offset: usize,
}

/// Exclusive host view of buffer contents.
///
/// Host and unified views write through to the shared storage immediately.
/// Staged views over accelerator storage push their content back on release
/// (drop or [`commit`](Self::commit)), unless the view was requested
/// [`ReadOnly`](crate::AccessMode::ReadOnly).
pub struct HostViewMut<'a, T: Pod> {
    repr: ViewMutRepr<'a, T>,
}

enum ViewMutRepr<'a, T: Pod> {
    Host(MappedRwLockWriteGuard<'a, [T]>),
    Unified {
        guard: UsmWriteGuard<'a>,
        byte_offset: usize,
        byte_len: usize,
    },
    Staged {
        data: Vec<T>,
        target: Option<StagedTarget<'a>>,
    },
}

impl<'a, T: Pod> HostViewMut<'a, T> {
    pub(crate) fn from_host(guard: MappedRwLockWriteGuard<'a, [T]>) -> Self {
        Self {
            repr: ViewMutRepr::Host(guard),
        }
    }

    pub(crate) fn from_unified(backing: &'a UnifiedBacking<T>) -> Self {
        Self {
            repr: ViewMutRepr::Unified {
                guard: backing.region().host_write(),
                byte_offset: backing.byte_offset(),
                byte_len: backing.byte_len(),
            },
        }
    }

    pub(crate) fn from_staged(
        data: Vec<T>,
        memory: Option<(&'a DeviceMemory, usize)>,
    ) -> Self {
        Self {
            repr: ViewMutRepr::Staged {
                data,
                target: memory.map(|(memory, byte_offset)| StagedTarget {
                    memory,
                    byte_offset,
                }),
            },
        }
    }

    /// Push staged content back to the source now, reporting failure.
    ///
    /// Dropping the view writes back too, but a drop-path failure is only
    /// logged. Views over host or unified storage have nothing to push and
    /// always succeed.
    pub fn commit(mut self) -> Result<()> {
        if let ViewMutRepr::Staged { data, target } = &mut self.repr
            && let Some(target) = target.take()
        {
            target
                .memory
                .write_from(target.byte_offset, bytemuck::cast_slice(data.as_slice()))
                .context(TransferSnafu)?;
        }
        Ok(())
    }
}

impl<T: Pod> Deref for HostViewMut<'_, T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        match &self.repr {
            ViewMutRepr::Host(guard) => guard,
            ViewMutRepr::Unified {
                guard,
                byte_offset,
                byte_len,
            } => bytemuck::cast_slice(&guard[*byte_offset..*byte_offset + *byte_len]),
            ViewMutRepr::Staged { data, .. } => data,
        }
    }
}

impl<T: Pod> DerefMut for HostViewMut<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.repr {
            ViewMutRepr::Host(guard) => guard,
            ViewMutRepr::Unified {
                guard,
                byte_offset,
                byte_len,
            } => bytemuck::cast_slice_mut(&mut guard[*byte_offset..*byte_offset + *byte_len]),
            ViewMutRepr::Staged { data, .. } => data,
        }
    }
}

impl<T: Pod> Drop for HostViewMut<'_, T> {
    fn drop(&mut self) {
        if let ViewMutRepr::Staged { data, target } = &mut self.repr
            && let Some(target) = target.take()
            && let Err(error) = target
                .memory
                .write_from(target.byte_offset, bytemuck::cast_slice(data.as_slice()))
        {
            tracing::error!(%error, "discarding host view content: write-back to device memory failed");
        }
    }
}
