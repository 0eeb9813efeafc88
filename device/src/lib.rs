//! Accelerator-runtime boundary for the mirazh buffer library.
//!
//! This crate owns everything below the buffer abstraction:
//!
//! - [`DeviceMemory`]: opaque, runtime-managed byte allocations reached only
//!   through staging copies
//! - [`UsmRegion`] + [`AllocKind`]: unified allocations addressable from both
//!   host and device, with explicit fencing
//! - [`DeviceRuntime`]: the allocation/synchronization contract, implemented
//!   by the host-emulation [`CpuRuntime`] and, behind the `cuda` feature, a
//!   cudarc-backed runtime
//! - [`registry`]: a global map from device strings ("CPU", "CUDA:0") to
//!   shared runtime instances

pub mod error;
pub mod memory;
pub mod registry;
pub mod runtime;
pub mod usm;

pub use error::{Error, Result};
pub use memory::DeviceMemory;
pub use registry::{DeviceSpec, cpu, runtime_for};
pub use runtime::{CpuRuntime, DeviceRuntime};
pub use usm::{AllocKind, UsmReadGuard, UsmRegion, UsmWriteGuard};

#[cfg(feature = "cuda")]
pub use registry::cuda;
#[cfg(feature = "cuda")]
pub use runtime::cuda::CudaRuntime;

#[cfg(test)]
mod test;
