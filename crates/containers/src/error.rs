//! Error type shared by the container structures.

/// Errors reported by container operations.
///
/// Every failure here is caller-recoverable; upper layers translate these
/// into their boundary outcome protocol rather than aborting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    /// An index was outside `[0, len)` (or `[0, len]` for inserts).
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// A removal was attempted on an empty container.
    #[error("container is empty")]
    Empty,
}
