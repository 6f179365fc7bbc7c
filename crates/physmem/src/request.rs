use std::path::{Path, PathBuf};

use crate::{
    device::{AccessMode, DEFAULT_DEVICE, map_device, system_page_size},
    error::Result,
    transfer::{Direction, TransferBuffer, TransferWidth, transfer},
    window::{MappingWindow, compute_window},
};

/// One read or write of a physical range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub base_address: usize,
    pub length: usize,
    pub preferred_width: TransferWidth,
    pub direction: Direction,
}

impl TransferRequest {
    pub fn read(base_address: usize, length: usize, preferred_width: TransferWidth) -> Self {
        Self {
            base_address,
            length,
            preferred_width,
            direction: Direction::Read,
        }
    }

    pub fn write(base_address: usize, length: usize, preferred_width: TransferWidth) -> Self {
        Self {
            base_address,
            length,
            preferred_width,
            direction: Direction::Write,
        }
    }

    pub fn window(&self, page_size: usize) -> Result<MappingWindow> {
        compute_window(self.base_address, self.length, page_size)
    }

    pub fn access_mode(&self) -> AccessMode {
        match self.direction {
            Direction::Read => AccessMode::ReadOnly,
            Direction::Write => AccessMode::ReadWrite,
        }
    }
}

/// Physical memory reachable through a memory device.
///
/// Each call is one complete open, map, transfer, unmap, close sequence.
#[derive(Debug, Clone)]
pub struct PhysicalMemory {
    device: PathBuf,
    page_size: usize,
}

impl Default for PhysicalMemory {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE, system_page_size())
    }
}

impl PhysicalMemory {
    pub fn new(device: impl Into<PathBuf>, page_size: usize) -> Self {
        Self {
            device: device.into(),
            page_size,
        }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fills `buf` from physical memory starting at `base_address`.
    pub fn read(&self, base_address: usize, buf: &mut [u8], width: TransferWidth) -> Result<usize> {
        let request = TransferRequest::read(base_address, buf.len(), width);
        self.execute(&request, TransferBuffer::Read(buf))
    }

    /// Stores `data` into physical memory starting at `base_address`.
    pub fn write(&self, base_address: usize, data: &[u8], width: TransferWidth) -> Result<usize> {
        let request = TransferRequest::write(base_address, data.len(), width);
        self.execute(&request, TransferBuffer::Write(data))
    }

    fn execute(&self, request: &TransferRequest, buffer: TransferBuffer<'_>) -> Result<usize> {
        debug_assert_eq!(request.direction, buffer.direction());
        let window = request.window(self.page_size)?;
        log::debug!(
            "{:?} {:#x} bytes at {:#x} ({} access), window {:#x}+{:#x}",
            request.direction,
            request.length,
            request.base_address,
            request.preferred_width,
            window.map_start(),
            window.map_length()
        );
        let mut region = map_device(&self.device, &window, request.access_mode())?;
        let transferred = transfer(&mut region, window.offset(), buffer, request.preferred_width)?;
        region.unmap();
        Ok(transferred)
    }
}
