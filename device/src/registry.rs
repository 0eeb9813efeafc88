//! Global runtime registry keyed by device strings.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::{Result, UnknownDeviceSnafu};
use crate::runtime::{CpuRuntime, DeviceRuntime};

#[cfg(not(feature = "cuda"))]
use crate::error::UnsupportedSnafu;

/// Identifier of a runtime this library can talk to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceSpec {
    Cpu,
    Cuda { device_id: usize },
}

impl DeviceSpec {
    /// Parse a device string into a spec.
    ///
    /// Examples:
    /// - "CPU" -> DeviceSpec::Cpu
    /// - "CUDA:1" -> DeviceSpec::Cuda { device_id: 1 }
    /// - "gpu" -> DeviceSpec::Cuda { device_id: 0 }
    pub fn parse(s: &str) -> Result<Self> {
        let upper = s.to_uppercase();
        let mut parts = upper.split(':');
        match parts.next() {
            Some("CPU") => Ok(DeviceSpec::Cpu),
            Some("CUDA" | "GPU") => {
                let device_id = match parts.next() {
                    Some(id) => id
                        .parse()
                        .ok()
                        .ok_or_else(|| UnknownDeviceSnafu { spec: s }.build())?,
                    None => 0,
                };
                Ok(DeviceSpec::Cuda { device_id })
            }
            _ => UnknownDeviceSnafu { spec: s }.fail(),
        }
    }
}

pub struct RuntimeRegistry {
    runtimes: RwLock<HashMap<DeviceSpec, Arc<dyn DeviceRuntime>>>,
}

impl RuntimeRegistry {
    fn new() -> Self {
        Self {
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the runtime for a spec.
    pub fn get(&self, spec: &DeviceSpec) -> Result<Arc<dyn DeviceRuntime>> {
        // Fast path: read lock
        {
            let runtimes = self.runtimes.read();
            if let Some(runtime) = runtimes.get(spec) {
                return Ok(Arc::clone(runtime));
            }
        }

        // Slow path: write lock to create
        let mut runtimes = self.runtimes.write();

        // Double-check after acquiring write lock
        if let Some(runtime) = runtimes.get(spec) {
            return Ok(Arc::clone(runtime));
        }

        let runtime = Self::create_runtime(spec)?;
        runtimes.insert(spec.clone(), Arc::clone(&runtime));
        Ok(runtime)
    }

    /// Get a runtime by parsing a device string.
    pub fn get_by_name(&self, device: &str) -> Result<Arc<dyn DeviceRuntime>> {
        let spec = DeviceSpec::parse(device)?;
        self.get(&spec)
    }

    fn create_runtime(spec: &DeviceSpec) -> Result<Arc<dyn DeviceRuntime>> {
        match spec {
            DeviceSpec::Cpu => Ok(Arc::new(CpuRuntime)),
            #[cfg(feature = "cuda")]
            DeviceSpec::Cuda { device_id } => {
                Ok(Arc::new(crate::runtime::cuda::CudaRuntime::new(*device_id)?))
            }
            #[cfg(not(feature = "cuda"))]
            DeviceSpec::Cuda { device_id } => UnsupportedSnafu {
                operation: "CUDA runtime (crate built without the `cuda` feature)",
                device: format!("CUDA:{device_id}"),
            }
            .fail(),
        }
    }
}

/// Global runtime registry instance.
static REGISTRY: Lazy<RuntimeRegistry> = Lazy::new(RuntimeRegistry::new);

/// Get the global runtime registry.
pub fn registry() -> &'static RuntimeRegistry {
    &REGISTRY
}

/// Convenience function to get a runtime by device string.
pub fn runtime_for(device: &str) -> Result<Arc<dyn DeviceRuntime>> {
    registry().get_by_name(device)
}

/// Convenience function to get the host-emulation runtime.
pub fn cpu() -> Result<Arc<dyn DeviceRuntime>> {
    registry().get(&DeviceSpec::Cpu)
}

/// Convenience function to get a CUDA runtime.
#[cfg(feature = "cuda")]
pub fn cuda(device_id: usize) -> Result<Arc<dyn DeviceRuntime>> {
    registry().get(&DeviceSpec::Cuda { device_id })
}
