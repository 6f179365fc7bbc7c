//! `setmem`: stores a sequence of values into physical memory.

use clap::Parser;
use physmem::{AccessWidth, PhysicalMemory, TransferWidth};

use crate::{
    cli::{CommonArgs, Tool, WidthArgs},
    config::Config,
    error::ToolError,
    number::{parse_u64, parse_usize},
};

#[derive(Parser, Debug)]
#[command(name = "setmem", version, about = "Write values to consecutive physical addresses")]
pub struct SetMem {
    #[command(flatten)]
    pub width: WidthArgs,
    #[command(flatten)]
    pub common: CommonArgs,
    /// Physical address of the first value
    #[arg(value_parser = parse_usize)]
    pub address: usize,
    /// Values to store, one access of the selected width each
    #[arg(value_parser = parse_u64, required = true)]
    pub values: Vec<u64>,
}

impl SetMem {
    /// The width of each store, bytes unless a flag says otherwise.
    pub fn access_width(&self) -> AccessWidth {
        self.width.width().unwrap_or(AccessWidth::Byte)
    }

    /// Packs the values into one buffer in native byte order.
    pub fn encode(&self) -> Result<Vec<u8>, ToolError> {
        let width = self.access_width();
        let mut buf = vec![0u8; self.values.len() * width.bytes()];
        for (&value, chunk) in self.values.iter().zip(buf.chunks_exact_mut(width.bytes())) {
            if !width.fits(value) {
                return Err(ToolError::ValueTooWide { value, width });
            }
            width.encode(value, chunk);
        }
        Ok(buf)
    }

    /// Stores the values into `memory`, returning the number of bytes written.
    pub fn write(&self, memory: &PhysicalMemory) -> Result<usize, ToolError> {
        let data = self.encode()?;
        let written = memory.write(self.address, &data, TransferWidth::Fixed(self.access_width()))?;
        log::info!("wrote {} values to {:#x}", self.values.len(), self.address);
        Ok(written)
    }
}

impl Tool for SetMem {
    const NAME: &'static str = "setmem";

    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn run(self, config: &Config) -> Result<(), ToolError> {
        self.write(&self.common.memory(config)).map(drop)
    }
}
