use crate::error::{PhysMemError, Result};

/// The page aligned range that has to be mapped to reach a (possibly unaligned) physical range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingWindow {
    base_address: usize,
    map_start: usize,
    map_length: usize,
}

impl MappingWindow {
    /// The first byte of the requested range.
    pub const fn base_address(&self) -> usize {
        self.base_address
    }

    /// The page aligned start of the mapping.
    pub const fn map_start(&self) -> usize {
        self.map_start
    }

    /// The mapping length, a whole number of pages.
    pub const fn map_length(&self) -> usize {
        self.map_length
    }

    /// Offset of the requested range inside the mapping.
    pub const fn offset(&self) -> usize {
        self.base_address - self.map_start
    }

    pub const fn map_end(&self) -> usize {
        self.map_start + self.map_length
    }
}

/// Computes the smallest page aligned window covering `[base_address, base_address + length)`.
///
/// Fails with [`PhysMemError::InvalidRange`] if `length` is zero, if the range or the rounded up
/// window end overflows the address space, or if `page_size` is not a power of two.
pub fn compute_window(base_address: usize, length: usize, page_size: usize) -> Result<MappingWindow> {
    if length == 0 || !page_size.is_power_of_two() {
        return Err(invalid_range(base_address, length));
    }
    let page_mask = !(page_size - 1);
    let map_end = base_address
        .checked_add(length)
        .and_then(|end| end.checked_add(page_size - 1))
        .ok_or_else(|| invalid_range(base_address, length))?
        & page_mask;
    let map_start = base_address & page_mask;

    Ok(MappingWindow {
        base_address,
        map_start,
        map_length: map_end - map_start,
    })
}

fn invalid_range(base: usize, length: usize) -> PhysMemError {
    PhysMemError::InvalidRange { base, length }
}
