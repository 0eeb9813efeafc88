//! Opaque accelerator-managed memory.
//!
//! A [`DeviceMemory`] is a block of bytes whose placement and coherence are
//! owned by the runtime that allocated it. Host code never sees a raw pointer
//! into it; content moves through bounds-checked staging copies that block
//! until the transfer is complete.

use parking_lot::RwLock;
use snafu::ensure;

#[cfg(feature = "cuda")]
use std::sync::Arc;

#[cfg(feature = "cuda")]
use cudarc::driver::{CudaSlice, CudaStream};
#[cfg(feature = "cuda")]
use parking_lot::Mutex;
#[cfg(feature = "cuda")]
use snafu::ResultExt;

use crate::error::{OutOfBoundsSnafu, Result};

#[cfg(feature = "cuda")]
use crate::error::CudaSnafu;

/// Opaque handle to accelerator-managed memory.
#[derive(Debug)]
pub enum DeviceMemory {
    /// Host-emulated device memory.
    Cpu { data: RwLock<Box<[u8]>> },
    /// Dedicated CUDA device memory, tied to the stream that allocated it.
    #[cfg(feature = "cuda")]
    Cuda {
        data: Mutex<CudaSlice<u8>>,
        stream: Arc<CudaStream>,
    },
}

impl DeviceMemory {
    /// Size of the allocation in bytes.
    pub fn len(&self) -> usize {
        match self {
            DeviceMemory::Cpu { data } => data.read().len(),
            #[cfg(feature = "cuda")]
            DeviceMemory::Cuda { data, .. } => data.lock().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `dst.len()` bytes starting at `offset` out to the host.
    ///
    /// Outstanding device-side work is synchronized first, so the copy
    /// observes the latest writes. Returns only after the data is on the
    /// host.
    pub fn read_into(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        self.check_range(offset, dst.len())?;
        match self {
            DeviceMemory::Cpu { data } => {
                let guard = data.read();
                dst.copy_from_slice(&guard[offset..offset + dst.len()]);
                Ok(())
            }
            #[cfg(feature = "cuda")]
            DeviceMemory::Cuda { data, stream } => {
                stream.synchronize().context(CudaSnafu)?;
                let guard = data.lock();
                let view = guard.slice(offset..offset + dst.len());
                stream.memcpy_dtoh(&view, dst).context(CudaSnafu)
            }
        }
    }

    /// Copy `src` into the allocation starting at `offset`.
    ///
    /// Returns only after the transfer is complete.
    pub fn write_from(&self, offset: usize, src: &[u8]) -> Result<()> {
        self.check_range(offset, src.len())?;
        match self {
            DeviceMemory::Cpu { data } => {
                let mut guard = data.write();
                guard[offset..offset + src.len()].copy_from_slice(src);
                Ok(())
            }
            #[cfg(feature = "cuda")]
            DeviceMemory::Cuda { data, stream } => {
                let mut guard = data.lock();
                let mut view = guard.slice_mut(offset..offset + src.len());
                stream.memcpy_htod(src, &mut view).context(CudaSnafu)?;
                stream.synchronize().context(CudaSnafu)
            }
        }
    }

    /// Block until all outstanding work touching this allocation completes.
    pub fn synchronize(&self) -> Result<()> {
        match self {
            DeviceMemory::Cpu { .. } => Ok(()),
            #[cfg(feature = "cuda")]
            DeviceMemory::Cuda { stream, .. } => stream.synchronize().context(CudaSnafu),
        }
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<()> {
        let size = self.len();
        ensure!(
            offset.checked_add(len).is_some_and(|end| end <= size),
            OutOfBoundsSnafu { offset, len, size }
        );
        Ok(())
    }
}
