//! Aligned, width adaptive transfers between physical memory and process buffers.
//!
//! A transfer runs in a fixed order: [`compute_window`] rounds the requested range out to whole
//! pages, [`map_physical`] opens the memory device and maps that window, [`transfer`] copies
//! between the mapping and a buffer, and dropping the [`MappedRegion`] unmaps and closes.
//! [`PhysicalMemory`] wraps the whole sequence.
//!
//! Fixed width transfers issue one volatile access per step in increasing address order, so they
//! are safe to point at memory mapped registers. Block transfers are a single bulk copy.

pub mod device;
pub mod error;
pub mod request;
pub mod transfer;
pub mod window;

pub use device::{AccessMode, DEFAULT_DEVICE, MappedRegion, map_device, map_physical, system_page_size, unmap};
pub use error::{PhysMemError, Result};
pub use request::{PhysicalMemory, TransferRequest};
pub use transfer::{
    Direction, MemoryAccess, Step, TransferBuffer, TransferCursor, TransferWidth, step_width, transfer,
};
pub use volatile::AccessWidth;
pub use window::{MappingWindow, compute_window};
