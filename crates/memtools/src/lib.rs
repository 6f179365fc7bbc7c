//! The `getmem` and `setmem` command line tools.
//!
//! Both are thin wrappers around [`physmem::PhysicalMemory`]. Diagnostics go to stderr and the
//! exit status follows `sysexits.h`, see [`exit::ExitStatus`].

pub mod cli;
pub mod config;
pub mod error;
pub mod exit;
pub mod getmem;
pub mod logger;
pub mod number;
pub mod setmem;

pub use config::Config;
pub use error::ToolError;
pub use exit::ExitStatus;
