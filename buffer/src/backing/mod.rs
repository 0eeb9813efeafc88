//! The three storage strategies behind a buffer.
//!
//! A backing is `{shared storage, offset, len}`: sub-buffers clone the
//! storage handle and narrow the window, so aliasing is the default and
//! nothing is copied. The variant of a [`BufferBacking`] is fixed at
//! construction; conversions build new backings rather than changing one in
//! place.

mod device;
mod host;
mod unified;

pub(crate) use device::DeviceBacking;
pub(crate) use host::HostBacking;
pub(crate) use unified::UnifiedBacking;

use std::fmt;

/// Which storage strategy backs a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingKind {
    /// A host array.
    Host,
    /// Opaque accelerator-managed memory.
    Device,
    /// A unified-memory region.
    Unified,
}

impl fmt::Display for BackingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackingKind::Host => "host",
            BackingKind::Device => "device",
            BackingKind::Unified => "unified",
        };
        f.write_str(name)
    }
}

/// One storage strategy instance.
pub(crate) enum BufferBacking<T> {
    Host(HostBacking<T>),
    Device(DeviceBacking<T>),
    Unified(UnifiedBacking<T>),
}

impl<T> BufferBacking<T> {
    pub fn len(&self) -> usize {
        match self {
            BufferBacking::Host(backing) => backing.len(),
            BufferBacking::Device(backing) => backing.len(),
            BufferBacking::Unified(backing) => backing.len(),
        }
    }

    pub fn kind(&self) -> BackingKind {
        match self {
            BufferBacking::Host(_) => BackingKind::Host,
            BufferBacking::Device(_) => BackingKind::Device,
            BufferBacking::Unified(_) => BackingKind::Unified,
        }
    }

    /// Narrow to `len` elements starting at `offset`, sharing storage.
    ///
    /// Bounds were checked by the caller.
    pub fn sub_range(&self, offset: usize, len: usize) -> Self {
        match self {
            BufferBacking::Host(backing) => BufferBacking::Host(backing.sub_range(offset, len)),
            BufferBacking::Device(backing) => BufferBacking::Device(backing.sub_range(offset, len)),
            BufferBacking::Unified(backing) => {
                BufferBacking::Unified(backing.sub_range(offset, len))
            }
        }
    }
}
