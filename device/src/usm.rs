//! Unified-memory regions: one allocation addressable from host and device.
//!
//! A [`UsmRegion`] carries an [`AllocKind`] describing where the allocation
//! resides and how it migrates. Host access is zero-copy through mapping
//! guards; for device-resident and migratable kinds the caller must issue a
//! [`UsmRegion::fence`] before reading host-side, so that device writes are
//! visible.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::error::Result;

/// Residency and migration behaviour of a unified allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::VariantArray)]
pub enum AllocKind {
    /// Host-resident; device reads cross the bus. Host access needs no fence.
    Host,
    /// Device-resident but host-addressable. Host access requires a fence.
    Device,
    /// Migratable between host and device on demand. Host access requires a
    /// fence.
    Shared,
}

impl AllocKind {
    /// Whether host access must be preceded by [`UsmRegion::fence`].
    pub fn needs_fence(self) -> bool {
        !matches!(self, AllocKind::Host)
    }
}

/// Backing block for emulated regions, over-aligned so that zero-copy typed
/// views of any scalar element stay aligned.
#[derive(Debug, Clone, Copy)]
#[repr(C, align(16))]
struct AlignedBlock([u8; 16]);

// Plain bytes; the alignment attribute introduces no padding.
unsafe impl bytemuck::Zeroable for AlignedBlock {}
unsafe impl bytemuck::Pod for AlignedBlock {}

#[derive(Debug)]
enum UsmMem {
    /// Allocated by the emulation runtime; freed on drop.
    Owned(Box<[AlignedBlock]>),
    /// Externally allocated unified memory; never freed here. See
    /// [`UsmRegion::from_raw_parts`].
    Raw { ptr: *mut u8, len: usize },
}

// The `Raw` variant holds externally allocated bytes whose validity and
// exclusivity are guaranteed by the `from_raw_parts` contract; `Owned` is a
// plain box.
unsafe impl Send for UsmMem {}
unsafe impl Sync for UsmMem {}

impl UsmMem {
    fn bytes(&self) -> &[u8] {
        match self {
            UsmMem::Owned(blocks) => bytemuck::cast_slice(&blocks[..]),
            UsmMem::Raw { ptr, len } => unsafe { std::slice::from_raw_parts(*ptr, *len) },
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            UsmMem::Owned(blocks) => bytemuck::cast_slice_mut(&mut blocks[..]),
            UsmMem::Raw { ptr, len } => unsafe { std::slice::from_raw_parts_mut(*ptr, *len) },
        }
    }
}

/// A unified-memory region of `len` bytes with a declared [`AllocKind`].
#[derive(Debug)]
pub struct UsmRegion {
    kind: AllocKind,
    len: usize,
    mem: RwLock<UsmMem>,
    fences: AtomicU64,
}

impl UsmRegion {
    /// Allocate a zero-initialized, host-emulated region.
    pub fn zeroed(len: usize, kind: AllocKind) -> Self {
        let blocks = vec![AlignedBlock([0; 16]); len.div_ceil(16)];
        Self {
            kind,
            len,
            mem: RwLock::new(UsmMem::Owned(blocks.into_boxed_slice())),
            fences: AtomicU64::new(0),
        }
    }

    /// Wrap an externally allocated unified region without copying. The
    /// region never frees the memory.
    ///
    /// # Safety
    ///
    /// `ptr` must point to `len` bytes that are valid in both address spaces,
    /// aligned for every element type later viewed through them, and must
    /// stay valid and free of external aliasing for the region's lifetime.
    pub unsafe fn from_raw_parts(ptr: *mut u8, len: usize, kind: AllocKind) -> Self {
        Self {
            kind,
            len,
            mem: RwLock::new(UsmMem::Raw { ptr, len }),
            fences: AtomicU64::new(0),
        }
    }

    /// Size of the region in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Declared residency/migration behaviour.
    pub fn kind(&self) -> AllocKind {
        self.kind
    }

    /// Block until device-side work touching this region has completed.
    ///
    /// Required before host reads when [`AllocKind::needs_fence`] holds; a
    /// host access that will fully overwrite the region may skip it.
    pub fn fence(&self) -> Result<()> {
        self.fences.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Number of fences issued against this region. Diagnostic only.
    pub fn fence_count(&self) -> u64 {
        self.fences.load(Ordering::Relaxed)
    }

    /// Map the region's bytes for host reading. Zero-copy.
    pub fn host_read(&self) -> UsmReadGuard<'_> {
        UsmReadGuard(RwLockReadGuard::map(self.mem.read(), |m| {
            &m.bytes()[..self.len]
        }))
    }

    /// Map the region's bytes for host writing. Zero-copy; writes land in the
    /// allocation directly.
    pub fn host_write(&self) -> UsmWriteGuard<'_> {
        UsmWriteGuard(RwLockWriteGuard::map(self.mem.write(), |m| {
            &mut m.bytes_mut()[..self.len]
        }))
    }
}

/// Shared host mapping of a [`UsmRegion`].
pub struct UsmReadGuard<'a>(MappedRwLockReadGuard<'a, [u8]>);

impl Deref for UsmReadGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Exclusive host mapping of a [`UsmRegion`].
pub struct UsmWriteGuard<'a>(MappedRwLockWriteGuard<'a, [u8]>);

impl Deref for UsmWriteGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for UsmWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
