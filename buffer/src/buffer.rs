use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use bytemuck::Pod;
use snafu::OptionExt;

use mirazh_device::{DeviceMemory, DeviceRuntime, UsmRegion};

use crate::access::AccessMode;
use crate::backing::{BackingKind, BufferBacking, DeviceBacking, HostBacking, UnifiedBacking};
use crate::convert::{self, Converted};
use crate::error::{EmptyBufferSnafu, Result};
use crate::view::{HostView, HostViewMut};

/// A block of typed elements that may live in host memory, in
/// accelerator-managed memory, or in a unified-memory region.
///
/// `Buffer` is a value with reference semantics underneath: clones share the
/// same storage, equality compares storage identity rather than content, and
/// writes through one clone are visible through the others. A
/// default-constructed buffer is *empty*: it has no storage attached at all,
/// which is distinct from a zero-length buffer.
///
/// Conversions (`to_host*`, `to_device`, `to_unified`) never mutate the
/// source; when the source already has the requested representation they
/// return a clone, otherwise they allocate and copy. Each fallible operation
/// comes in two forms: `try_*` returning [`Result`], and an unprefixed form
/// that panics on failure.
pub struct Buffer<T> {
    backing: Option<Arc<BufferBacking<T>>>,
}

impl<T> Default for Buffer<T> {
    /// An empty buffer: no storage, zero length.
    fn default() -> Self {
        Self { backing: None }
    }
}

impl<T> Clone for Buffer<T> {
    /// Shares the backing storage; nothing is copied.
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
        }
    }
}

impl<T> PartialEq for Buffer<T> {
    /// Identity comparison: equal iff both reference the same backing
    /// instance (or both are empty). Content is not compared.
    fn eq(&self, other: &Self) -> bool {
        match (&self.backing, &other.backing) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> Eq for Buffer<T> {}

impl<T> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backing {
            Some(backing) => f
                .debug_struct("Buffer")
                .field("kind", &backing.kind())
                .field("len", &backing.len())
                .finish(),
            None => f.write_str("Buffer(empty)"),
        }
    }
}

impl<T> Buffer<T> {
    /// Number of elements; 0 for an empty buffer. Never fails.
    pub fn len(&self) -> usize {
        self.backing.as_ref().map_or(0, |backing| backing.len())
    }

    /// Whether the buffer holds zero elements. An empty buffer is zero
    /// length; so is a zero-length sub-buffer that still has storage.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether no storage is attached.
    pub fn is_null(&self) -> bool {
        self.backing.is_none()
    }

    /// Which storage strategy backs this buffer; `None` when empty.
    pub fn kind(&self) -> Option<BackingKind> {
        self.backing.as_ref().map(|backing| backing.kind())
    }

    /// Drop this value's reference to the storage; afterwards the buffer is
    /// empty. Clones sharing the backing are unaffected.
    pub fn reset(&mut self) {
        self.backing = None;
    }

    /// The underlying accelerator allocation and this buffer's byte window
    /// within it, when device-backed.
    pub fn device_memory(&self) -> Option<(&Arc<DeviceMemory>, Range<usize>)> {
        match self.backing.as_deref() {
            Some(BufferBacking::Device(device)) => Some((
                device.memory(),
                device.byte_offset()..device.byte_offset() + device.byte_len(),
            )),
            _ => None,
        }
    }

    /// The underlying unified region and this buffer's byte window within
    /// it, when unified-backed.
    pub fn unified_region(&self) -> Option<(&Arc<UsmRegion>, Range<usize>)> {
        match self.backing.as_deref() {
            Some(BufferBacking::Unified(unified)) => Some((
                unified.region(),
                unified.byte_offset()..unified.byte_offset() + unified.byte_len(),
            )),
            _ => None,
        }
    }

    fn from_backing(backing: BufferBacking<T>) -> Self {
        Self {
            backing: Some(Arc::new(backing)),
        }
    }

    fn backing(&self) -> Result<&BufferBacking<T>> {
        self.backing.as_deref().context(EmptyBufferSnafu)
    }
}

impl<T: Pod> Buffer<T> {
    /// Wrap host data, taking ownership. Nothing is copied.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self::from_backing(BufferBacking::Host(HostBacking::from_vec(data)))
    }

    /// Copy host data into a new owned host buffer.
    pub fn from_slice(data: &[T]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Wrap externally owned host memory without copying. The buffer never
    /// frees it.
    ///
    /// # Safety
    ///
    /// `ptr` must point to `len` initialized elements that stay valid for the
    /// lifetime of this buffer and every clone and sub-buffer of it, and the
    /// memory must not be accessed through other pointers while a view
    /// obtained from this buffer is alive.
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize) -> Self {
        Self::from_backing(BufferBacking::Host(unsafe {
            HostBacking::from_raw_parts(ptr, len)
        }))
    }

    /// Wrap an existing accelerator allocation without copying.
    ///
    /// The allocation must divide exactly into elements of `T`.
    pub fn from_device(memory: impl Into<Arc<DeviceMemory>>) -> Self {
        Self::from_backing(BufferBacking::Device(DeviceBacking::new(memory.into())))
    }

    /// Wrap an existing unified-memory region without copying.
    ///
    /// The region must divide exactly into elements of `T`.
    pub fn from_unified(region: impl Into<Arc<UsmRegion>>) -> Self {
        Self::from_backing(BufferBacking::Unified(UnifiedBacking::new(region.into())))
    }

    /// A buffer over `len` elements starting at `offset`, sharing this
    /// buffer's storage. Zero copy for every backing; writes through either
    /// buffer are visible through the other.
    ///
    /// Fails with [`EmptyBuffer`](crate::Error::EmptyBuffer) on an empty
    /// buffer. A range reaching past `len()` is a caller bug and panics.
    pub fn try_sub_buffer(&self, offset: usize, len: usize) -> Result<Self> {
        let backing = self.backing()?;
        let end = offset
            .checked_add(len)
            .expect("sub-buffer range overflows usize");
        assert!(
            end <= backing.len(),
            "sub-buffer range {offset}..{end} exceeds buffer of {} elements",
            backing.len(),
        );
        Ok(Self::from_backing(backing.sub_range(offset, len)))
    }

    /// Like [`try_sub_buffer`](Self::try_sub_buffer), panicking on an empty
    /// buffer as well.
    pub fn sub_buffer(&self, offset: usize, len: usize) -> Self {
        self.try_sub_buffer(offset, len)
            .unwrap_or_else(|error| panic!("sub-buffer failed: {error}"))
    }

    /// A shared host view of the content under `mode`.
    ///
    /// `ReadOnly`/`ReadWrite` observe the latest device-side writes;
    /// `WriteOnly` skips that synchronization and the view's content is
    /// unspecified. Zero-copy for host and unified backings, a staged copy
    /// for device backings.
    pub fn try_to_host(&self, mode: AccessMode) -> Result<HostView<'_, T>> {
        convert::host_view(self.backing()?, mode)
    }

    /// Like [`try_to_host`](Self::try_to_host), panicking on failure.
    pub fn to_host(&self, mode: AccessMode) -> HostView<'_, T> {
        self.try_to_host(mode)
            .unwrap_or_else(|error| panic!("host view failed: {error}"))
    }

    /// An exclusive host view of the content under `mode`.
    ///
    /// Views of host and unified backings write through to the shared
    /// storage immediately. Views of device backings are staged and pushed
    /// back when released, unless `mode` is `ReadOnly`, in which case
    /// writes are discarded.
    pub fn try_to_host_mut(&self, mode: AccessMode) -> Result<HostViewMut<'_, T>> {
        convert::host_view_mut(self.backing()?, mode)
    }

    /// Like [`try_to_host_mut`](Self::try_to_host_mut), panicking on
    /// failure.
    pub fn to_host_mut(&self, mode: AccessMode) -> HostViewMut<'_, T> {
        self.try_to_host_mut(mode)
            .unwrap_or_else(|error| panic!("host view failed: {error}"))
    }

    /// A device-addressable buffer with this buffer's content.
    ///
    /// Device backings and device-addressable unified backings are returned
    /// as-is (the result compares equal to `self`); host content is copied
    /// into a fresh allocation from `runtime`. The source is never mutated.
    pub fn try_to_device(&self, runtime: &dyn DeviceRuntime) -> Result<Self> {
        match convert::to_device(self.backing()?, runtime)? {
            Converted::Identity => Ok(self.clone()),
            Converted::New(backing) => Ok(Self::from_backing(backing)),
        }
    }

    /// Like [`try_to_device`](Self::try_to_device), panicking on failure.
    pub fn to_device(&self, runtime: &dyn DeviceRuntime) -> Self {
        self.try_to_device(runtime)
            .unwrap_or_else(|error| panic!("device conversion failed: {error}"))
    }

    /// A unified-memory buffer with this buffer's content.
    ///
    /// Unified backings are returned as-is; other content is copied into a
    /// fresh migratable region from `runtime`. Fails with
    /// [`UnsupportedConversion`](crate::Error::UnsupportedConversion) when
    /// the runtime offers no unified allocations.
    pub fn try_to_unified(&self, runtime: &dyn DeviceRuntime) -> Result<Self> {
        match convert::to_unified(self.backing()?, runtime)? {
            Converted::Identity => Ok(self.clone()),
            Converted::New(backing) => Ok(Self::from_backing(backing)),
        }
    }

    /// Like [`try_to_unified`](Self::try_to_unified), panicking on failure.
    pub fn to_unified(&self, runtime: &dyn DeviceRuntime) -> Self {
        self.try_to_unified(runtime)
            .unwrap_or_else(|error| panic!("unified conversion failed: {error}"))
    }
}
