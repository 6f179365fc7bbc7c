//! Volatile access primitives for memory that may be backed by device registers.
//!
//! Every load and store made through this crate is emitted exactly once and in program order,
//! which is what memory mapped I/O needs: a register read can have side effects, and two
//! neighbouring stores must not be merged into one wider store.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod ptr;
pub mod region;
pub mod width;

pub use ptr::VolatilePtr;
pub use region::{Access, ReadOnly, ReadWrite, VolatileRegion};
pub use width::{AccessWidth, UnsupportedWidth};
