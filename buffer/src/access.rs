/// How a host view of buffer contents will be used.
///
/// The mode is a contract between the caller and the conversion machinery:
///
/// - [`ReadOnly`](AccessMode::ReadOnly) and
///   [`ReadWrite`](AccessMode::ReadWrite) views observe the latest
///   device-side writes; producing one synchronizes the source first.
/// - [`WriteOnly`](AccessMode::WriteOnly) promises that the caller overwrites
///   every element, so the synchronization is skipped and the view's content
///   before being overwritten is unspecified.
/// - Writes through a mutable [`ReadOnly`](AccessMode::ReadOnly) view are not
///   pushed back to the source; whether they become visible elsewhere is
///   unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::VariantArray)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    /// Whether the view must observe the source's latest device-side writes.
    pub fn syncs_source(self) -> bool {
        !matches!(self, AccessMode::WriteOnly)
    }

    /// Whether a mutable view's content is pushed back to the source when
    /// the view is released.
    pub fn writes_back(self) -> bool {
        !matches!(self, AccessMode::ReadOnly)
    }
}
