use std::{io, path::PathBuf};

use volatile::{AccessWidth, UnsupportedWidth};

/// Errors from window computation, device mapping and transfers.
#[derive(Debug, thiserror::Error)]
pub enum PhysMemError {
    #[error("invalid range: {length:#x} bytes at {base:#x}")]
    InvalidRange { base: usize, length: usize },

    #[error("unsupported access width of {0} bytes")]
    UnsupportedWidth(usize),

    #[error("{}: {source}", path.display())]
    DeviceUnavailable { path: PathBuf, source: io::Error },

    #[error("mmap: {source}")]
    MappingFailed { source: io::Error },

    #[error("address {addr:#x} is not aligned for a {width} access")]
    Misaligned { addr: usize, width: AccessWidth },

    #[error("{length:#x} bytes at offset {offset:#x} exceed the {size:#x} byte mapping")]
    OutOfBounds { offset: usize, length: usize, size: usize },

    #[error("cannot write through a read-only mapping")]
    ReadOnlyMapping,
}

impl From<UnsupportedWidth> for PhysMemError {
    fn from(err: UnsupportedWidth) -> Self {
        Self::UnsupportedWidth(err.0)
    }
}

pub type Result<T, E = PhysMemError> = core::result::Result<T, E>;
