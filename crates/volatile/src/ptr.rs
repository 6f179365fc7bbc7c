use core::ptr::NonNull;

/// A volatile non-null pointer to a value of type `T`.
///
/// This type is used to read and write values to memory without causing the compiler to optimize
/// away, merge or reorder the reads and writes.
#[repr(transparent)]
#[derive(Debug, Copy, Clone)]
pub struct VolatilePtr<T> {
    ptr: NonNull<T>,
}

impl<T: Copy> VolatilePtr<T> {
    /// Creates a new `VolatilePtr` from a raw pointer, returning `None` if it is null.
    ///
    /// # Examples
    /// ```
    /// use volatile::ptr::VolatilePtr;
    ///
    /// let mut x = 0u32;
    /// let ptr = unsafe { VolatilePtr::new(&mut x) }.unwrap();
    /// assert_eq!(ptr.get(), 0);
    /// ptr.set(1);
    /// assert_eq!(ptr.get(), 1);
    /// assert_eq!(x, 1);
    /// ```
    ///
    /// # Safety
    /// For as long as the returned pointer is used, `ptr` must be aligned and valid for reads of
    /// `T`, and also valid for writes of `T` if [`VolatilePtr::set`] is called.
    pub unsafe fn new(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Creates a new `VolatilePtr` from a raw pointer without checking for null.
    ///
    /// # Safety
    /// Same as [`VolatilePtr::new`], and `ptr` must be non-null.
    pub const unsafe fn new_unchecked(ptr: *mut T) -> Self {
        Self {
            ptr: unsafe { NonNull::new_unchecked(ptr) },
        }
    }

    /// Returns a raw pointer to the value.
    /// This pointer shouldnt be used directly, but rather through the `VolatilePtr` API,
    /// or using the `core::ptr::read_volatile` and `core::ptr::write_volatile` functions.
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Volatile reads the value from the pointer.
    pub fn get(&self) -> T {
        // SAFETY: Validity and alignment were promised at construction
        unsafe { self.ptr.read_volatile() }
    }

    /// Volatile writes the value to the pointer.
    pub fn set(&self, value: T) {
        // SAFETY: Validity and alignment were promised at construction
        unsafe { self.ptr.write_volatile(value) }
    }
}
