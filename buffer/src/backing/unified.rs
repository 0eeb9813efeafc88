use std::marker::PhantomData;
use std::sync::Arc;

use bytemuck::Pod;
use mirazh_device::{AllocKind, UsmRegion};

/// An element window into a unified-memory region.
///
/// The region is addressable from both host and device; host views map it
/// directly, fencing first when the allocation kind requires it.
pub(crate) struct UnifiedBacking<T> {
    region: Arc<UsmRegion>,
    /// Window start, in elements.
    offset: usize,
    /// Window length, in elements.
    len: usize,
    _elem: PhantomData<fn() -> T>,
}

impl<T> UnifiedBacking<T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn kind(&self) -> AllocKind {
        self.region.kind()
    }

    pub fn sub_range(&self, offset: usize, len: usize) -> Self {
        Self {
            region: Arc::clone(&self.region),
            offset: self.offset + offset,
            len,
            _elem: PhantomData,
        }
    }

    pub fn region(&self) -> &Arc<UsmRegion> {
        &self.region
    }

    pub fn byte_offset(&self) -> usize {
        self.offset * size_of::<T>()
    }

    pub fn byte_len(&self) -> usize {
        self.len * size_of::<T>()
    }

    pub fn fence(&self) -> mirazh_device::Result<()> {
        self.region.fence()
    }
}

impl<T: Pod> UnifiedBacking<T> {
    /// Wrap an existing region without copying.
    ///
    /// The region must divide exactly into elements of `T` and be aligned
    /// for them.
    pub fn new(region: Arc<UsmRegion>) -> Self {
        let elem = size_of::<T>();
        assert!(elem > 0, "zero-sized element types cannot back a buffer");
        assert!(
            region.len() % elem == 0,
            "unified region of {} bytes does not divide into {elem}-byte elements",
            region.len(),
        );
        let len = region.len() / elem;
        Self {
            region,
            offset: 0,
            len,
            _elem: PhantomData,
        }
    }
}
