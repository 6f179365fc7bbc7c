use core::fmt;

/// A width that is not one of 1, 2, 4 or 8 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unsupported access width of {0} bytes")]
pub struct UnsupportedWidth(pub usize);

/// The size of a single hardware load or store.
///
/// Accesses are never wider than [`AccessWidth::Qword`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessWidth {
    Byte = 1,
    Word = 2,
    Dword = 4,
    Qword = 8,
}

impl AccessWidth {
    pub const ALL: [AccessWidth; 4] = [Self::Byte, Self::Word, Self::Dword, Self::Qword];

    /// The widest access any region supports.
    pub const MAX: AccessWidth = Self::Qword;

    /// Returns the width in bytes.
    pub const fn bytes(self) -> usize {
        self as usize
    }

    /// Returns `true` if `addr` is a multiple of this width.
    pub const fn is_aligned(self, addr: usize) -> bool {
        addr & (self.bytes() - 1) == 0
    }

    /// Returns `true` if `value` can be stored in this width without losing bits.
    pub const fn fits(self, value: u64) -> bool {
        match self {
            Self::Qword => true,
            _ => value >> (self.bytes() * 8) == 0,
        }
    }

    /// Writes the low `self.bytes()` bytes of `value` into `out` in native byte order.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` is not equal to `self.bytes()`.
    pub fn encode(self, value: u64, out: &mut [u8]) {
        match self {
            Self::Byte => out.copy_from_slice(&(value as u8).to_ne_bytes()),
            Self::Word => out.copy_from_slice(&(value as u16).to_ne_bytes()),
            Self::Dword => out.copy_from_slice(&(value as u32).to_ne_bytes()),
            Self::Qword => out.copy_from_slice(&value.to_ne_bytes()),
        }
    }

    /// Reads a native byte order value of this width from `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes.len()` is not equal to `self.bytes()`.
    pub fn decode(self, bytes: &[u8]) -> u64 {
        assert_eq!(bytes.len(), self.bytes(), "decode: byte count does not match width");
        let mut raw = [0u8; 8];
        raw[..bytes.len()].copy_from_slice(bytes);
        match self {
            Self::Byte => u64::from(raw[0]),
            Self::Word => u64::from(u16::from_ne_bytes([raw[0], raw[1]])),
            Self::Dword => u64::from(u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]])),
            Self::Qword => u64::from_ne_bytes(raw),
        }
    }
}

impl TryFrom<usize> for AccessWidth {
    type Error = UnsupportedWidth;

    fn try_from(bytes: usize) -> Result<Self, Self::Error> {
        match bytes {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Word),
            4 => Ok(Self::Dword),
            8 => Ok(Self::Qword),
            _ => Err(UnsupportedWidth(bytes)),
        }
    }
}

impl TryFrom<u8> for AccessWidth {
    type Error = UnsupportedWidth;

    fn try_from(bytes: u8) -> Result<Self, Self::Error> {
        Self::try_from(usize::from(bytes))
    }
}

impl fmt::Display for AccessWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte => write!(f, "byte"),
            Self::Word => write!(f, "word"),
            Self::Dword => write!(f, "dword"),
            Self::Qword => write!(f, "qword"),
        }
    }
}
