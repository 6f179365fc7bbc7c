use std::process::ExitCode;

use physmem::PhysMemError;

use crate::error::ToolError;

/// Process exit statuses, following `sysexits.h`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    /// `EX_USAGE`: the command was used incorrectly.
    Usage = 64,
    /// `EX_OSERR`: an operating system error, such as a failed `mmap`.
    OsError = 71,
    /// `EX_OSFILE`: a system file is missing or cannot be opened.
    OsFile = 72,
    /// `EX_IOERR`: an error while writing output.
    IoError = 74,
    /// `EX_CONFIG`: the configuration file is unreadable or invalid.
    Config = 78,
}

impl ExitStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

impl From<&PhysMemError> for ExitStatus {
    fn from(err: &PhysMemError) -> Self {
        match err {
            PhysMemError::DeviceUnavailable { .. } => Self::OsFile,
            PhysMemError::MappingFailed { .. } => Self::OsError,
            PhysMemError::InvalidRange { .. }
            | PhysMemError::UnsupportedWidth(_)
            | PhysMemError::Misaligned { .. }
            | PhysMemError::OutOfBounds { .. }
            | PhysMemError::ReadOnlyMapping => Self::Usage,
        }
    }
}

impl From<&ToolError> for ExitStatus {
    fn from(err: &ToolError) -> Self {
        match err {
            ToolError::Usage(_) | ToolError::Number(_) | ToolError::ValueTooWide { .. } => Self::Usage,
            ToolError::Config(_) => Self::Config,
            ToolError::Output(_) => Self::IoError,
            ToolError::PhysMem(err) => err.into(),
        }
    }
}
