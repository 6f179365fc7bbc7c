//! The width adaptive copy between a mapping and a caller buffer.

use core::fmt;

use volatile::{AccessWidth, ReadOnly, ReadWrite, VolatileRegion};

use crate::error::{PhysMemError, Result};

/// Memory the transfer engine can step through.
///
/// Implementations must turn every `read_at`/`write_at` call into exactly one access of the given
/// width, in call order.
pub trait MemoryAccess {
    /// Size of the accessible memory in bytes.
    fn len(&self) -> usize;

    /// The address of the byte at `offset`, used for alignment checks.
    fn addr(&self, offset: usize) -> usize;

    fn read_at(&mut self, offset: usize, width: AccessWidth) -> u64;

    fn write_at(&mut self, offset: usize, width: AccessWidth, value: u64) -> Result<()>;

    fn copy_to_slice(&mut self, offset: usize, dst: &mut [u8]);

    fn copy_from_slice(&mut self, offset: usize, src: &[u8]) -> Result<()>;
}

impl MemoryAccess for VolatileRegion<'_, ReadOnly> {
    fn len(&self) -> usize {
        VolatileRegion::len(self)
    }

    fn addr(&self, offset: usize) -> usize {
        VolatileRegion::addr(self, offset)
    }

    fn read_at(&mut self, offset: usize, width: AccessWidth) -> u64 {
        VolatileRegion::read_at(self, offset, width)
    }

    fn write_at(&mut self, _offset: usize, _width: AccessWidth, _value: u64) -> Result<()> {
        Err(PhysMemError::ReadOnlyMapping)
    }

    fn copy_to_slice(&mut self, offset: usize, dst: &mut [u8]) {
        VolatileRegion::copy_to_slice(self, offset, dst)
    }

    fn copy_from_slice(&mut self, _offset: usize, _src: &[u8]) -> Result<()> {
        Err(PhysMemError::ReadOnlyMapping)
    }
}

impl MemoryAccess for VolatileRegion<'_, ReadWrite> {
    fn len(&self) -> usize {
        VolatileRegion::len(self)
    }

    fn addr(&self, offset: usize) -> usize {
        VolatileRegion::addr(self, offset)
    }

    fn read_at(&mut self, offset: usize, width: AccessWidth) -> u64 {
        VolatileRegion::read_at(self, offset, width)
    }

    fn write_at(&mut self, offset: usize, width: AccessWidth, value: u64) -> Result<()> {
        VolatileRegion::write_at(self, offset, width, value);
        Ok(())
    }

    fn copy_to_slice(&mut self, offset: usize, dst: &mut [u8]) {
        VolatileRegion::copy_to_slice(self, offset, dst)
    }

    fn copy_from_slice(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        VolatileRegion::copy_from_slice(self, offset, src);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// The caller side of a transfer. The direction is carried by the buffer's mutability.
#[derive(Debug)]
pub enum TransferBuffer<'a> {
    /// Fill the buffer from memory.
    Read(&'a mut [u8]),
    /// Store the buffer into memory.
    Write(&'a [u8]),
}

impl TransferBuffer<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Read(buf) => buf.len(),
            Self::Write(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::Read(_) => Direction::Read,
            Self::Write(_) => Direction::Write,
        }
    }
}

/// How the transfer touches memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferWidth {
    /// One unordered bulk copy. Only valid for memory without access side effects.
    Block,
    /// Discrete volatile accesses of at most this width.
    Fixed(AccessWidth),
}

impl From<AccessWidth> for TransferWidth {
    fn from(width: AccessWidth) -> Self {
        Self::Fixed(width)
    }
}

impl TryFrom<usize> for TransferWidth {
    type Error = PhysMemError;

    fn try_from(bytes: usize) -> Result<Self> {
        Ok(Self::Fixed(AccessWidth::try_from(bytes)?))
    }
}

impl fmt::Display for TransferWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => f.write_str("block"),
            Self::Fixed(width) => width.fmt(f),
        }
    }
}

/// Returns the width of the next access when `remaining` bytes are left.
///
/// This is the requested width, unless fewer bytes remain, in which case it is the widest
/// supported width that does not run past the end of the range.
pub const fn step_width(remaining: usize, requested: AccessWidth) -> AccessWidth {
    if remaining >= requested.bytes() {
        return requested;
    }
    match remaining {
        0 | 1 => AccessWidth::Byte,
        2 | 3 => AccessWidth::Word,
        4..=7 => AccessWidth::Dword,
        _ => AccessWidth::Qword,
    }
}

/// A single access planned by a [`TransferCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Offset into the mapping.
    pub offset: usize,
    /// Offset into the caller buffer.
    pub position: usize,
    pub width: AccessWidth,
}

/// Walks a range in increasing address order, one access per step.
#[derive(Debug, Clone)]
pub struct TransferCursor {
    current_offset: usize,
    position: usize,
    remaining: usize,
    requested: AccessWidth,
    current_width: Option<AccessWidth>,
}

impl TransferCursor {
    pub fn new(offset: usize, length: usize, requested: AccessWidth) -> Self {
        Self {
            current_offset: offset,
            position: 0,
            remaining: length,
            requested,
            current_width: None,
        }
    }

    pub fn current_offset(&self) -> usize {
        self.current_offset
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Width of the most recent step.
    pub fn current_width(&self) -> Option<AccessWidth> {
        self.current_width
    }

    /// Bytes covered by the steps taken so far.
    pub fn transferred(&self) -> usize {
        self.position
    }
}

impl Iterator for TransferCursor {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.remaining == 0 {
            return None;
        }
        let width = step_width(self.remaining, self.requested);
        let step = Step {
            offset: self.current_offset,
            position: self.position,
            width,
        };
        self.current_width = Some(width);
        self.current_offset += width.bytes();
        self.position += width.bytes();
        self.remaining -= width.bytes();
        Some(step)
    }
}

/// Moves `buffer.len()` bytes between `memory` at `offset` and `buffer`.
///
/// With [`TransferWidth::Block`] this is a single bulk copy. With a fixed width every step is
/// exactly one volatile access, in increasing address order, narrowed by [`step_width`] at the
/// end of the range. Returns the number of bytes transferred.
pub fn transfer<M>(memory: &mut M, offset: usize, buffer: TransferBuffer<'_>, width: TransferWidth) -> Result<usize>
where
    M: MemoryAccess + ?Sized,
{
    let length = buffer.len();
    let size = memory.len();
    if offset.checked_add(length).is_none_or(|end| end > size) {
        return Err(PhysMemError::OutOfBounds { offset, length, size });
    }

    let width = match width {
        TransferWidth::Block => {
            log::trace!("block {:?} of {length:#x} bytes at offset {offset:#x}", buffer.direction());
            match buffer {
                TransferBuffer::Read(dst) => memory.copy_to_slice(offset, dst),
                TransferBuffer::Write(src) => memory.copy_from_slice(offset, src)?,
            }
            return Ok(length);
        }
        TransferWidth::Fixed(width) => width,
    };

    let start = memory.addr(offset);
    if !width.is_aligned(start) {
        return Err(PhysMemError::Misaligned { addr: start, width });
    }

    let mut cursor = TransferCursor::new(offset, length, width);
    match buffer {
        TransferBuffer::Read(dst) => {
            for step in cursor.by_ref() {
                let value = memory.read_at(step.offset, step.width);
                log::trace!("read {} at offset {:#x}: {value:#x}", step.width, step.offset);
                step.width.encode(value, &mut dst[step.position..step.position + step.width.bytes()]);
            }
        }
        TransferBuffer::Write(src) => {
            for step in cursor.by_ref() {
                let value = step.width.decode(&src[step.position..step.position + step.width.bytes()]);
                log::trace!("write {} at offset {:#x}: {value:#x}", step.width, step.offset);
                memory.write_at(step.offset, step.width, value)?;
            }
        }
    }
    Ok(cursor.transferred())
}
