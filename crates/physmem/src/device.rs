//! Mapping the physical memory device.
//!
//! This module owns the only `mmap` in the workspace. A [`MappedRegion`] holds both the mapping
//! and the open device, and releases them in that order when dropped, so every exit path after a
//! successful [`map_physical`] unmaps and closes.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use memmap2::{Mmap, MmapMut, MmapOptions};
use volatile::{AccessWidth, ReadOnly, ReadWrite, VolatileRegion};

use crate::{
    error::{PhysMemError, Result},
    transfer::MemoryAccess,
    window::MappingWindow,
};

/// The physical memory device on Linux.
pub const DEFAULT_DEVICE: &str = "/dev/mem";

/// Fallback when the page size cannot be queried.
const FALLBACK_PAGE_SIZE: usize = 4096;

/// Returns the system page size.
pub fn system_page_size() -> usize {
    // SAFETY: sysconf has no preconditions
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(size)
        .ok()
        .filter(|size| size.is_power_of_two())
        .unwrap_or(FALLBACK_PAGE_SIZE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `PROT_READ`, for reading memory.
    ReadOnly,
    /// `PROT_READ | PROT_WRITE`, for writing memory.
    ReadWrite,
}

#[derive(Debug)]
enum Mapping {
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
}

/// A shared mapping of a [`MappingWindow`] of the memory device.
#[derive(Debug)]
pub struct MappedRegion {
    // Fields drop in declaration order: the mapping goes before the device is closed
    mapping: Mapping,
    device: File,
    path: PathBuf,
    window: MappingWindow,
}

/// Maps `window` of [`DEFAULT_DEVICE`].
pub fn map_physical(window: &MappingWindow, mode: AccessMode) -> Result<MappedRegion> {
    map_device(DEFAULT_DEVICE, window, mode)
}

/// Maps `window` of the device (or file) at `path`.
///
/// Fails with [`PhysMemError::DeviceUnavailable`] if the device cannot be opened and with
/// [`PhysMemError::MappingFailed`] if the mapping cannot be established.
pub fn map_device(path: impl AsRef<Path>, window: &MappingWindow, mode: AccessMode) -> Result<MappedRegion> {
    let path = path.as_ref();
    let device = OpenOptions::new()
        .read(true)
        .write(mode == AccessMode::ReadWrite)
        .open(path)
        .map_err(|source| PhysMemError::DeviceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

    let mut options = MmapOptions::new();
    options.offset(window.map_start() as u64).len(window.map_length());
    // SAFETY: The device handle lives as long as the mapping, and the mapping is only accessed
    // through `VolatileRegion`
    let mapping = unsafe {
        match mode {
            AccessMode::ReadOnly => options.map(&device).map(Mapping::ReadOnly),
            AccessMode::ReadWrite => options.map_mut(&device).map(Mapping::ReadWrite),
        }
    }
    .map_err(|source| PhysMemError::MappingFailed { source })?;

    log::debug!(
        "mapped {}: {:#x}..{:#x} ({:?})",
        path.display(),
        window.map_start(),
        window.map_end(),
        mode
    );

    Ok(MappedRegion {
        mapping,
        device,
        path: path.to_path_buf(),
        window: *window,
    })
}

/// Releases the mapping, then closes the device.
pub fn unmap(region: MappedRegion) {
    region.unmap()
}

impl MappedRegion {
    pub fn window(&self) -> &MappingWindow {
        &self.window
    }

    pub fn mode(&self) -> AccessMode {
        match self.mapping {
            Mapping::ReadOnly(_) => AccessMode::ReadOnly,
            Mapping::ReadWrite(_) => AccessMode::ReadWrite,
        }
    }

    /// The open device backing the mapping.
    pub fn device(&self) -> &File {
        &self.device
    }

    /// A read-only volatile view of the whole mapping.
    pub fn view(&self) -> VolatileRegion<'_, ReadOnly> {
        match &self.mapping {
            Mapping::ReadOnly(map) => VolatileRegion::from_slice(map),
            Mapping::ReadWrite(map) => VolatileRegion::from_slice(map),
        }
    }

    /// A writable volatile view of the whole mapping, if it was mapped [`AccessMode::ReadWrite`].
    pub fn view_mut(&mut self) -> Option<VolatileRegion<'_, ReadWrite>> {
        match &mut self.mapping {
            Mapping::ReadOnly(_) => None,
            Mapping::ReadWrite(map) => Some(VolatileRegion::from_slice_mut(map)),
        }
    }

    /// Releases the mapping, then closes the device.
    pub fn unmap(self) {
        drop(self)
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        log::trace!(
            "unmapping {}: {:#x}..{:#x}",
            self.path.display(),
            self.window.map_start(),
            self.window.map_end()
        );
    }
}

impl MemoryAccess for MappedRegion {
    fn len(&self) -> usize {
        self.window.map_length()
    }

    fn addr(&self, offset: usize) -> usize {
        self.view().addr(offset)
    }

    fn read_at(&mut self, offset: usize, width: AccessWidth) -> u64 {
        self.view().read_at(offset, width)
    }

    fn write_at(&mut self, offset: usize, width: AccessWidth, value: u64) -> Result<()> {
        let mut view = self.view_mut().ok_or(PhysMemError::ReadOnlyMapping)?;
        view.write_at(offset, width, value);
        Ok(())
    }

    fn copy_to_slice(&mut self, offset: usize, dst: &mut [u8]) {
        self.view().copy_to_slice(offset, dst)
    }

    fn copy_from_slice(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        let mut view = self.view_mut().ok_or(PhysMemError::ReadOnlyMapping)?;
        view.copy_from_slice(offset, src);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom, Write};

    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use tempfile::NamedTempFile;

    use super::*;
    use crate::{
        transfer::{TransferBuffer, TransferWidth, transfer},
        window::compute_window,
    };

    /// A regular file standing in for `/dev/mem`.
    fn fake_device(pages: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let contents: Vec<u8> = (0..pages * system_page_size()).map(|i| (i % 251) as u8).collect();
        file.write_all(&contents).unwrap();
        file.flush().unwrap();
        file
    }

    assert_impl_all!(MappedRegion: Send, MemoryAccess);
    assert_not_impl_any!(MappedRegion: Clone, Copy);

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(system_page_size().is_power_of_two());
    }

    #[test]
    fn test_missing_device() {
        let window = compute_window(0x1000, 4, system_page_size()).unwrap();
        let err = map_device("/nonexistent/memtools-device", &window, AccessMode::ReadOnly).unwrap_err();
        match err {
            PhysMemError::DeviceUnavailable { path, source } => {
                assert_eq!(path, Path::new("/nonexistent/memtools-device"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_unaligned_range() {
        let page = system_page_size();
        let device = fake_device(3);
        let base = 2 * page - 6;
        let window = compute_window(base, 0x10, page).unwrap();
        let mut region = map_device(device.path(), &window, AccessMode::ReadOnly).unwrap();
        assert_eq!(region.mode(), AccessMode::ReadOnly);
        assert_eq!(MemoryAccess::len(&region), 2 * page);

        let mut buf = [0u8; 0x10];
        let n = transfer(&mut region, window.offset(), TransferBuffer::Read(&mut buf), TransferWidth::Block).unwrap();
        assert_eq!(n, 0x10);
        let expected: Vec<u8> = (base..base + 0x10).map(|i| (i % 251) as u8).collect();
        assert_eq!(buf[..], expected[..]);
        region.unmap();
    }

    #[test]
    fn test_reads_are_idempotent() {
        let device = fake_device(1);
        let window = compute_window(0x100, 0x40, system_page_size()).unwrap();
        let read = || {
            let mut region = map_device(device.path(), &window, AccessMode::ReadOnly).unwrap();
            let mut buf = vec![0u8; 0x40];
            transfer(&mut region, window.offset(), TransferBuffer::Read(&mut buf), TransferWidth::Block).unwrap();
            buf
        };
        assert_eq!(read(), read());
    }

    #[test]
    fn test_write_then_read_back() {
        let page = system_page_size();
        let device = fake_device(2);
        let data: Vec<u8> = (0..22u8).map(|i| 0xF0 ^ i).collect();
        let window = compute_window(page + 4, data.len(), page).unwrap();

        let mut region = map_device(device.path(), &window, AccessMode::ReadWrite).unwrap();
        let n = transfer(&mut region, window.offset(), TransferBuffer::Write(&data), AccessWidth::Dword.into()).unwrap();
        assert_eq!(n, data.len());
        unmap(region);

        let mut region = map_device(device.path(), &window, AccessMode::ReadOnly).unwrap();
        let mut out = vec![0u8; data.len()];
        transfer(&mut region, window.offset(), TransferBuffer::Read(&mut out), TransferWidth::Block).unwrap();
        assert_eq!(out, data);
        drop(region);

        // The shared mapping wrote through to the file itself
        let mut file = device.reopen().unwrap();
        file.seek(SeekFrom::Start((page + 4) as u64)).unwrap();
        let mut on_disk = vec![0u8; data.len()];
        file.read_exact(&mut on_disk).unwrap();
        assert_eq!(on_disk, data);
    }

    #[test]
    fn test_read_only_mapping_rejects_writes() {
        let device = fake_device(1);
        let window = compute_window(0x10, 4, system_page_size()).unwrap();
        let mut region = map_device(device.path(), &window, AccessMode::ReadOnly).unwrap();
        assert!(region.view_mut().is_none());
        let err = transfer(&mut region, window.offset(), TransferBuffer::Write(&[1, 2, 3, 4]), AccessWidth::Dword.into())
            .unwrap_err();
        assert!(matches!(err, PhysMemError::ReadOnlyMapping));
    }
}
