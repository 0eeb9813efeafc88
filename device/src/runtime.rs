//! Allocation and synchronization contract of an accelerator runtime.
//!
//! A [`DeviceRuntime`] hands out [`DeviceMemory`] allocations and, where the
//! platform supports it, unified [`UsmRegion`]s. The [`CpuRuntime`] emulates
//! the whole contract in host memory so the stack runs without hardware; the
//! CUDA runtime (feature `cuda`) allocates through `cudarc` streams.

use parking_lot::RwLock;

use crate::error::{Result, UnsupportedSnafu};
use crate::memory::DeviceMemory;
use crate::usm::{AllocKind, UsmRegion};

/// An accelerator runtime: allocates storage and orders its completion.
pub trait DeviceRuntime: Send + Sync + std::fmt::Debug {
    /// Allocate `size` bytes of dedicated, zero-initialized device memory.
    fn alloc(&self, size: usize) -> Result<DeviceMemory>;

    /// Allocate `size` bytes of unified memory with the given kind.
    ///
    /// Runtimes without unified-memory support report
    /// [`Error::Unsupported`](crate::Error::Unsupported).
    fn alloc_unified(&self, size: usize, kind: AllocKind) -> Result<UsmRegion> {
        let _ = (size, kind);
        UnsupportedSnafu {
            operation: "unified-memory allocation",
            device: self.name(),
        }
        .fail()
    }

    /// Block until all outstanding work submitted through this runtime
    /// completes.
    fn synchronize(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Host-emulation runtime: accelerator semantics backed by host memory.
///
/// Supports every [`AllocKind`]; allocation is infallible and fences are
/// immediate.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuRuntime;

impl DeviceRuntime for CpuRuntime {
    fn alloc(&self, size: usize) -> Result<DeviceMemory> {
        let data = vec![0u8; size].into_boxed_slice();
        Ok(DeviceMemory::Cpu {
            data: RwLock::new(data),
        })
    }

    fn alloc_unified(&self, size: usize, kind: AllocKind) -> Result<UsmRegion> {
        Ok(UsmRegion::zeroed(size, kind))
    }

    fn name(&self) -> &str {
        "CPU"
    }
}

#[cfg(feature = "cuda")]
pub mod cuda {
    //! CUDA runtime backed by cudarc contexts and streams.

    use std::sync::Arc;

    use cudarc::driver::CudaContext;
    use parking_lot::Mutex;
    use snafu::ResultExt;

    use super::DeviceRuntime;
    use crate::error::{CudaSnafu, Result};
    use crate::memory::DeviceMemory;

    #[derive(Debug, Clone)]
    pub struct CudaRuntime {
        context: Arc<CudaContext>,
        device_id: usize,
    }

    impl CudaRuntime {
        pub fn new(device_id: usize) -> Result<Self> {
            let context = CudaContext::new(device_id).context(CudaSnafu)?;
            Ok(Self { context, device_id })
        }

        pub fn device_id(&self) -> usize {
            self.device_id
        }
    }

    impl DeviceRuntime for CudaRuntime {
        fn alloc(&self, size: usize) -> Result<DeviceMemory> {
            let stream = self.context.default_stream();
            let data = stream.alloc_zeros::<u8>(size).context(CudaSnafu)?;
            Ok(DeviceMemory::Cuda {
                data: Mutex::new(data),
                stream,
            })
        }

        // alloc_unified: inherited as unsupported.
        // TODO: managed allocations via cuMemAllocManaged once cudarc exposes
        // a safe wrapper for them.

        fn synchronize(&self) -> Result<()> {
            self.context.default_stream().synchronize().context(CudaSnafu)
        }

        fn name(&self) -> &str {
            "CUDA"
        }
    }
}
