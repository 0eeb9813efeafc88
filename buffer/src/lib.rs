//! Heterogeneous buffers over host, accelerator, and unified memory.
//!
//! A [`Buffer<T>`] transparently represents a block of typed elements that
//! may live in host memory, in an accelerator-managed allocation, or in a
//! unified-memory region, and converts between those representations on
//! demand.
//!
//! # Design
//!
//! 1. **Value outside, reference inside** - buffers clone cheaply and share
//!    storage; equality is storage identity; mutation through one clone is
//!    visible through the others.
//! 2. **Closed backing set** - the three storage strategies form a sum type
//!    with exhaustive matching; the runtime side of the boundary
//!    ([`mirazh_device::DeviceRuntime`]) stays open for new platforms.
//! 3. **One conversion facade** - every source × target policy (identity,
//!    staged copy, fence-before-map) lives in a single module; backings hold
//!    no pairwise logic.
//! 4. **Explicit failure** - `try_*` methods return [`Error`]; the
//!    unprefixed forms panic. Range violations in sub-buffering are caller
//!    bugs and always panic.
//!
//! # Example
//!
//! ```ignore
//! use mirazh_buffer::{AccessMode, Buffer};
//! use mirazh_device::CpuRuntime;
//!
//! let host = Buffer::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0]);
//! let device = host.try_to_device(&CpuRuntime)?;
//!
//! // Kernels write through `device.device_memory()`; a ReadWrite view
//! // observes those writes.
//! let view = device.try_to_host(AccessMode::ReadWrite)?;
//! assert_eq!(view.len(), 5);
//! ```

mod access;
mod backing;
mod buffer;
mod convert;
mod error;
mod view;

pub use access::AccessMode;
pub use backing::BackingKind;
pub use buffer::Buffer;
pub use error::{Error, Result};
pub use view::{HostView, HostViewMut};

#[cfg(test)]
mod test;
