use std::io;

use physmem::{AccessWidth, PhysMemError};

use crate::{config::ConfigError, number::ParseNumberError};

/// Everything that can stop a tool after its arguments were parsed.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Number(#[from] ParseNumberError),

    #[error("value {value:#x} does not fit in a {width}")]
    ValueTooWide { value: u64, width: AccessWidth },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    PhysMem(#[from] PhysMemError),

    #[error("write: {0}")]
    Output(io::Error),
}
