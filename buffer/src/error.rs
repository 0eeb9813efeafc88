use snafu::Snafu;

use crate::backing::BackingKind;

/// Result type for buffer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Recoverable failures of buffer conversions and queries.
///
/// Range violations in sub-buffering are a caller bug, not an operational
/// failure; they panic at the call site instead of appearing here.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The operation needs a buffer with storage attached.
    #[snafu(display("buffer is empty: no storage attached"))]
    EmptyBuffer,

    /// Target storage could not be allocated during a copying conversion.
    #[snafu(display("failed to allocate {to} for a {from}-backed buffer"))]
    Allocation {
        from: BackingKind,
        to: &'static str,
        source: mirazh_device::Error,
    },

    /// A staging copy or fence failed during a conversion.
    #[snafu(display("data transfer failed during buffer conversion"))]
    Transfer { source: mirazh_device::Error },

    /// The runtime offers no bridge between this backing and the requested
    /// representation.
    #[snafu(display("cannot convert a {from}-backed buffer to {to}: not supported by the runtime"))]
    UnsupportedConversion { from: BackingKind, to: &'static str },
}
