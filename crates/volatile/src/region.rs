use core::{marker::PhantomData, ptr::NonNull};

use crate::{ptr::VolatilePtr, width::AccessWidth};

mod sealed {
    pub trait Sealed {}
}

/// The access capability of a [`VolatileRegion`].
///
/// This is sealed, the only capabilities are [`ReadOnly`] and [`ReadWrite`].
pub trait Access: sealed::Sealed {
    const WRITABLE: bool;
}

/// Loads only.
#[derive(Debug)]
pub enum ReadOnly {}

/// Loads and stores.
#[derive(Debug)]
pub enum ReadWrite {}

impl sealed::Sealed for ReadOnly {}
impl sealed::Sealed for ReadWrite {}

impl Access for ReadOnly {
    const WRITABLE: bool = false;
}

impl Access for ReadWrite {
    const WRITABLE: bool = true;
}

/// A bounded view over memory where every sized access is a single volatile load or store.
///
/// Stores are only available when the region was created with the [`ReadWrite`] capability.
/// Sized accesses must be naturally aligned, an unaligned access panics instead of being split.
#[derive(Debug)]
pub struct VolatileRegion<'a, A: Access> {
    base: NonNull<u8>,
    len: usize,
    _marker: PhantomData<(&'a mut [u8], A)>,
}

impl<'a> VolatileRegion<'a, ReadOnly> {
    /// Creates a read-only region over `slice`.
    pub fn from_slice(slice: &'a [u8]) -> Self {
        Self {
            // A slice pointer is never null, and the region never writes through it
            base: NonNull::from(slice).cast(),
            len: slice.len(),
            _marker: PhantomData,
        }
    }
}

impl<'a> VolatileRegion<'a, ReadWrite> {
    /// Creates a writable region over `slice`.
    pub fn from_slice_mut(slice: &'a mut [u8]) -> Self {
        let len = slice.len();
        Self {
            base: NonNull::from(slice).cast(),
            len,
            _marker: PhantomData,
        }
    }
}

impl<A: Access> VolatileRegion<'_, A> {
    /// Creates a region over `len` bytes starting at `base`.
    ///
    /// # Safety
    /// `base..base + len` must stay mapped and valid for reads for the lifetime of the region,
    /// and valid for writes too if `A` is [`ReadWrite`].
    pub const unsafe fn from_raw_parts(base: NonNull<u8>, len: usize) -> Self {
        Self {
            base,
            len,
            _marker: PhantomData,
        }
    }

    /// Returns the length of the region in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the region is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if stores are allowed on this region.
    pub fn is_writable(&self) -> bool {
        A::WRITABLE
    }

    /// Returns a raw pointer to the start of the region.
    pub fn as_ptr(&self) -> *const u8 {
        self.base.as_ptr()
    }

    /// Returns the address of the byte at `offset`.
    pub fn addr(&self, offset: usize) -> usize {
        self.base.as_ptr() as usize + offset
    }

    fn checked_ptr(&self, offset: usize, len: usize) -> *mut u8 {
        assert!(
            offset.checked_add(len).is_some_and(|end| end <= self.len),
            "region access out of bounds"
        );
        // SAFETY: offset + len is within the region, so the pointer stays in bounds
        unsafe { self.base.as_ptr().add(offset) }
    }

    fn sized_ptr(&self, offset: usize, width: AccessWidth) -> *mut u8 {
        let ptr = self.checked_ptr(offset, width.bytes());
        assert!(width.is_aligned(ptr as usize), "unaligned {width} access");
        ptr
    }

    /// Performs a single volatile load of `width` bytes at `offset`, zero extended to `u64`.
    ///
    /// # Panics
    ///
    /// Panics if the access is out of bounds or not aligned to `width`.
    pub fn read_at(&self, offset: usize, width: AccessWidth) -> u64 {
        let ptr = self.sized_ptr(offset, width);
        // SAFETY: The pointer is in bounds, aligned and readable as promised at construction
        unsafe {
            match width {
                AccessWidth::Byte => u64::from(VolatilePtr::new_unchecked(ptr).get()),
                AccessWidth::Word => u64::from(VolatilePtr::new_unchecked(ptr.cast::<u16>()).get()),
                AccessWidth::Dword => u64::from(VolatilePtr::new_unchecked(ptr.cast::<u32>()).get()),
                AccessWidth::Qword => VolatilePtr::new_unchecked(ptr.cast::<u64>()).get(),
            }
        }
    }

    /// Copies `dst.len()` bytes starting at `offset` into `dst`.
    ///
    /// This is a plain bulk copy, the order and width of the individual loads is unspecified.
    ///
    /// # Panics
    ///
    /// Panics if the copy is out of bounds.
    pub fn copy_to_slice(&self, offset: usize, dst: &mut [u8]) {
        let src = self.checked_ptr(offset, dst.len());
        // SAFETY: The source range is in bounds, and `dst` cannot alias a region we hold
        unsafe { core::ptr::copy_nonoverlapping(src, dst.as_mut_ptr(), dst.len()) }
    }
}

impl VolatileRegion<'_, ReadWrite> {
    /// Performs a single volatile store of the low `width` bytes of `value` at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the access is out of bounds or not aligned to `width`.
    pub fn write_at(&mut self, offset: usize, width: AccessWidth, value: u64) {
        let ptr = self.sized_ptr(offset, width);
        // SAFETY: The pointer is in bounds, aligned and writable as promised at construction
        unsafe {
            match width {
                AccessWidth::Byte => VolatilePtr::new_unchecked(ptr).set(value as u8),
                AccessWidth::Word => VolatilePtr::new_unchecked(ptr.cast::<u16>()).set(value as u16),
                AccessWidth::Dword => VolatilePtr::new_unchecked(ptr.cast::<u32>()).set(value as u32),
                AccessWidth::Qword => VolatilePtr::new_unchecked(ptr.cast::<u64>()).set(value),
            }
        }
    }

    /// Copies `src` into the region starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the copy is out of bounds.
    pub fn copy_from_slice(&mut self, offset: usize, src: &[u8]) {
        let dst = self.checked_ptr(offset, src.len());
        // SAFETY: The destination range is in bounds and writable
        unsafe { core::ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len()) }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[repr(C, align(8))]
    struct Aligned([u8; 16]);

    #[test]
    fn test_read_at_each_width() {
        let mut mem = Aligned([0; 16]);
        mem.0[..8].copy_from_slice(&0x8877_6655_4433_2211u64.to_ne_bytes());
        let region = VolatileRegion::from_slice(&mem.0);
        let expected = u64::from_ne_bytes(mem.0[..8].try_into().unwrap());
        assert_eq!(region.read_at(0, AccessWidth::Qword), expected);
        assert_eq!(region.read_at(0, AccessWidth::Byte), u64::from(mem.0[0]));
        assert_eq!(
            region.read_at(2, AccessWidth::Word),
            u64::from(u16::from_ne_bytes([mem.0[2], mem.0[3]]))
        );
        assert_eq!(
            region.read_at(4, AccessWidth::Dword),
            u64::from(u32::from_ne_bytes([mem.0[4], mem.0[5], mem.0[6], mem.0[7]]))
        );
    }

    #[test]
    fn test_write_at_only_touches_width() {
        let mut mem = Aligned([0xAA; 16]);
        let mut region = VolatileRegion::from_slice_mut(&mut mem.0);
        region.write_at(4, AccessWidth::Word, 0xFFFF_1234);
        assert!(region.is_writable());
        assert_eq!(&mem.0[4..6], &0x1234u16.to_ne_bytes());
        assert_eq!(mem.0[3], 0xAA);
        assert_eq!(mem.0[6], 0xAA);
    }

    #[test]
    fn test_copy_roundtrip() {
        let mut mem = Aligned([0; 16]);
        let mut region = VolatileRegion::from_slice_mut(&mut mem.0);
        region.copy_from_slice(3, &[1, 2, 3, 4, 5]);
        let mut out = [0u8; 5];
        region.copy_to_slice(3, &mut out);
        assert_eq!(out, [1, 2, 3, 4, 5]);
        assert_eq!(mem.0[2], 0);
        assert_eq!(mem.0[8], 0);
    }

    #[test]
    fn test_read_only_is_not_writable() {
        let mem = Aligned([0; 16]);
        let region = VolatileRegion::from_slice(&mem.0);
        assert!(!region.is_writable());
        assert_eq!(region.len(), 16);
    }

    #[test]
    #[should_panic]
    fn test_read_at_out_of_bounds() {
        let mem = Aligned([0; 16]);
        let region = VolatileRegion::from_slice(&mem.0);
        region.read_at(12, AccessWidth::Qword);
    }

    #[test]
    #[should_panic]
    fn test_read_at_unaligned() {
        let mem = Aligned([0; 16]);
        let region = VolatileRegion::from_slice(&mem.0);
        region.read_at(1, AccessWidth::Word);
    }

    #[test]
    #[should_panic]
    fn test_copy_to_slice_out_of_bounds() {
        let mem = Aligned([0; 16]);
        let region = VolatileRegion::from_slice(&mem.0);
        region.copy_to_slice(10, &mut [0u8; 7]);
    }
}
