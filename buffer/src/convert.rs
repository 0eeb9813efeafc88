//! The conversion facade.
//!
//! Every {host, device, unified} source × {host view, device buffer, unified
//! region} policy lives here, so the backings carry no pairwise conversion
//! logic. Conversions are pure functions of the source's current state:
//! nothing is memoized, and a repeated host view after device-side writes
//! re-synchronizes.

use std::sync::Arc;

use bytemuck::Pod;
use snafu::ResultExt;
use tracing::debug;

use mirazh_device::{AllocKind, DeviceRuntime, Error as DeviceError};

use crate::access::AccessMode;
use crate::backing::{BufferBacking, DeviceBacking, UnifiedBacking};
use crate::error::{AllocationSnafu, Error, Result, TransferSnafu};
use crate::view::{HostView, HostViewMut};

const TARGET_DEVICE: &str = "device memory";
const TARGET_UNIFIED: &str = "unified memory";

/// Outcome of a representation change.
pub(crate) enum Converted<T> {
    /// The source already satisfies the target representation.
    Identity,
    /// Freshly allocated backing holding a copy of the source content.
    New(BufferBacking<T>),
}

/// Produce a shared host view of `backing` under `mode`.
pub(crate) fn host_view<T: Pod>(
    backing: &BufferBacking<T>,
    mode: AccessMode,
) -> Result<HostView<'_, T>> {
    match backing {
        BufferBacking::Host(host) => Ok(HostView::from_host(host.read())),
        BufferBacking::Device(device) => {
            let staged = if mode.syncs_source() {
                device.read_to_vec().context(TransferSnafu)?
            } else {
                // WriteOnly: skip the device->host sync; content before a
                // full overwrite is unspecified.
                vec![T::zeroed(); device.len()]
            };
            Ok(HostView::from_staged(staged))
        }
        BufferBacking::Unified(unified) => {
            fence_for_host_access(unified, mode)?;
            Ok(HostView::from_unified(unified))
        }
    }
}

/// Produce an exclusive host view of `backing` under `mode`.
pub(crate) fn host_view_mut<T: Pod>(
    backing: &BufferBacking<T>,
    mode: AccessMode,
) -> Result<HostViewMut<'_, T>> {
    match backing {
        BufferBacking::Host(host) => Ok(HostViewMut::from_host(host.write())),
        BufferBacking::Device(device) => {
            let staged = if mode.syncs_source() {
                device.read_to_vec().context(TransferSnafu)?
            } else {
                vec![T::zeroed(); device.len()]
            };
            let target = mode
                .writes_back()
                .then(|| (device.memory().as_ref(), device.byte_offset()));
            Ok(HostViewMut::from_staged(staged, target))
        }
        BufferBacking::Unified(unified) => {
            fence_for_host_access(unified, mode)?;
            Ok(HostViewMut::from_unified(unified))
        }
    }
}

/// Convert `backing` into a device-addressable representation.
pub(crate) fn to_device<T: Pod>(
    backing: &BufferBacking<T>,
    runtime: &dyn DeviceRuntime,
) -> Result<Converted<T>> {
    match backing {
        BufferBacking::Device(_) => Ok(Converted::Identity),
        // Device-resident and migratable unified regions are already
        // device-addressable.
        BufferBacking::Unified(unified) if unified.kind() != AllocKind::Host => {
            Ok(Converted::Identity)
        }
        BufferBacking::Host(host) => {
            let src = host.read();
            let bytes = size_of_val(&*src);
            let memory = alloc_device(runtime, backing, bytes)?;
            debug!(bytes, runtime = runtime.name(), "copying host buffer to device memory");
            memory
                .write_from(0, bytemuck::cast_slice(&src[..]))
                .context(TransferSnafu)?;
            Ok(Converted::New(BufferBacking::Device(DeviceBacking::new(
                Arc::new(memory),
            ))))
        }
        BufferBacking::Unified(unified) => {
            // Host-resident region: copy into a dedicated allocation.
            let guard = unified.region().host_read();
            let src = &guard[unified.byte_offset()..unified.byte_offset() + unified.byte_len()];
            let memory = alloc_device(runtime, backing, src.len())?;
            debug!(bytes = src.len(), runtime = runtime.name(), "copying unified region to device memory");
            memory.write_from(0, src).context(TransferSnafu)?;
            Ok(Converted::New(BufferBacking::Device(DeviceBacking::new(
                Arc::new(memory),
            ))))
        }
    }
}

/// Convert `backing` into a unified-memory representation.
pub(crate) fn to_unified<T: Pod>(
    backing: &BufferBacking<T>,
    runtime: &dyn DeviceRuntime,
) -> Result<Converted<T>> {
    match backing {
        BufferBacking::Unified(_) => Ok(Converted::Identity),
        BufferBacking::Host(host) => {
            let src = host.read();
            let bytes = size_of_val(&*src);
            let region = alloc_unified(runtime, backing, bytes)?;
            debug!(bytes, runtime = runtime.name(), "copying host buffer to unified memory");
            region
                .host_write()
                .copy_from_slice(bytemuck::cast_slice(&src[..]));
            Ok(Converted::New(BufferBacking::Unified(UnifiedBacking::new(
                Arc::new(region),
            ))))
        }
        BufferBacking::Device(device) => {
            // No direct mapping at this boundary: stage through the host.
            let staged = device.read_to_vec().context(TransferSnafu)?;
            let region = alloc_unified(runtime, backing, device.byte_len())?;
            debug!(
                bytes = device.byte_len(),
                runtime = runtime.name(),
                "staging device memory into unified memory",
            );
            region
                .host_write()
                .copy_from_slice(bytemuck::cast_slice(&staged[..]));
            Ok(Converted::New(BufferBacking::Unified(UnifiedBacking::new(
                Arc::new(region),
            ))))
        }
    }
}

fn fence_for_host_access<T>(unified: &UnifiedBacking<T>, mode: AccessMode) -> Result<()> {
    if mode.syncs_source() && unified.kind().needs_fence() {
        unified.fence().context(TransferSnafu)?;
    }
    Ok(())
}

fn alloc_device<T>(
    runtime: &dyn DeviceRuntime,
    backing: &BufferBacking<T>,
    bytes: usize,
) -> Result<mirazh_device::DeviceMemory> {
    runtime.alloc(bytes).context(AllocationSnafu {
        from: backing.kind(),
        to: TARGET_DEVICE,
    })
}

fn alloc_unified<T>(
    runtime: &dyn DeviceRuntime,
    backing: &BufferBacking<T>,
    bytes: usize,
) -> Result<mirazh_device::UsmRegion> {
    // All conversions target a migratable region; wrapping existing memory of
    // another kind goes through the constructors instead.
    runtime
        .alloc_unified(bytes, AllocKind::Shared)
        .map_err(|source| match source {
            DeviceError::Unsupported { .. } => Error::UnsupportedConversion {
                from: backing.kind(),
                to: TARGET_UNIFIED,
            },
            source => Error::Allocation {
                from: backing.kind(),
                to: TARGET_UNIFIED,
                source,
            },
        })
}
