use snafu::Snafu;

/// Result type for runtime-boundary operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced at the accelerator-runtime boundary.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Storage could not be allocated.
    #[snafu(display("allocation of {size} bytes failed on {device}"))]
    AllocationFailed { device: String, size: usize },

    /// A staging copy addressed bytes outside the allocation.
    #[snafu(display("staging copy out of bounds: offset {offset} + len {len} exceeds allocation of {size} bytes"))]
    OutOfBounds { offset: usize, len: usize, size: usize },

    /// The runtime does not implement the requested operation.
    #[snafu(display("{operation} is not supported on {device}"))]
    Unsupported { operation: String, device: String },

    /// A device string did not parse to a known runtime.
    #[snafu(display("unknown device spec: {spec}"))]
    UnknownDevice { spec: String },

    /// CUDA driver error.
    #[cfg(feature = "cuda")]
    #[snafu(display("CUDA driver error: {source}"))]
    Cuda { source: cudarc::driver::DriverError },
}
