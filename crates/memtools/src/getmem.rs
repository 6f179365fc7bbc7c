//! `getmem`: copies a physical address range to stdout as raw bytes.

use std::io::{self, Write};

use clap::Parser;
use physmem::{PhysicalMemory, TransferWidth};

use crate::{
    cli::{CommonArgs, Tool, WidthArgs},
    config::Config,
    error::ToolError,
    number::parse_usize,
};

#[derive(Parser, Debug)]
#[command(name = "getmem", version, about = "Read physical memory and write the raw bytes to stdout")]
pub struct GetMem {
    #[command(flatten)]
    pub width: WidthArgs,
    #[command(flatten)]
    pub common: CommonArgs,
    /// Physical start address
    #[arg(value_parser = parse_usize)]
    pub address: usize,
    /// Number of bytes to read, defaults to one access of the given width
    #[arg(value_parser = parse_usize)]
    pub length: Option<usize>,
}

impl GetMem {
    pub fn transfer_width(&self) -> TransferWidth {
        self.width.width().map_or(TransferWidth::Block, TransferWidth::Fixed)
    }

    pub fn length(&self) -> Result<usize, ToolError> {
        match (self.length, self.width.width()) {
            (Some(length), _) => Ok(length),
            (None, Some(width)) => Ok(width.bytes()),
            (None, None) => Err(ToolError::Usage(
                "a length is required unless an access width is given".into(),
            )),
        }
    }

    /// Reads the requested range from `memory`.
    pub fn read(&self, memory: &PhysicalMemory) -> Result<Vec<u8>, ToolError> {
        let length = self.length()?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(length)
            .map_err(|_| ToolError::Usage(format!("cannot buffer {length:#x} bytes")))?;
        buf.resize(length, 0);
        memory.read(self.address, &mut buf, self.transfer_width())?;
        Ok(buf)
    }

    pub fn run_to(self, config: &Config, out: &mut impl Write) -> Result<(), ToolError> {
        let data = self.read(&self.common.memory(config))?;
        out.write_all(&data)
            .and_then(|()| out.flush())
            .map_err(ToolError::Output)
    }
}

impl Tool for GetMem {
    const NAME: &'static str = "getmem";

    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn run(self, config: &Config) -> Result<(), ToolError> {
        self.run_to(config, &mut io::stdout().lock())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use physmem::{AccessWidth, PhysMemError, system_page_size};
    use tempfile::NamedTempFile;

    use super::*;
    use crate::exit::ExitStatus;

    fn fake_device(page: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let contents: Vec<u8> = (0..2 * page).map(|i| i as u8).collect();
        file.write_all(&contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn config_for(device: &NamedTempFile) -> Config {
        Config {
            device: device.path().to_path_buf(),
            page_size: Some(system_page_size()),
            ..Config::default()
        }
    }

    fn parse(args: &[&str]) -> GetMem {
        GetMem::try_parse_from(std::iter::once("getmem").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_arguments() {
        let args = parse(&["-w", "0x1000", "3"]);
        assert_eq!(args.address, 0x1000);
        assert_eq!(args.length().unwrap(), 3);
        assert_eq!(args.transfer_width(), TransferWidth::Fixed(AccessWidth::Word));

        let args = parse(&["-q", "0x1000"]);
        assert_eq!(args.length().unwrap(), 8);

        let args = parse(&["0x1000", "16"]);
        assert_eq!(args.transfer_width(), TransferWidth::Block);
    }

    #[test]
    fn test_length_required_without_width() {
        let err = parse(&["0x1000"]).length().unwrap_err();
        assert_eq!(ExitStatus::from(&err), ExitStatus::Usage);
        assert!(GetMem::try_parse_from(["getmem"]).is_err());
        assert!(GetMem::try_parse_from(["getmem", "0x1000", "zz"]).is_err());
    }

    #[test]
    fn test_reads_to_output() {
        let page = system_page_size();
        let device = fake_device(page);
        let config = config_for(&device);

        let address = format!("{:#x}", page - 2);
        let mut out = Vec::new();
        parse(&["-b", &address, "4"]).run_to(&config, &mut out).unwrap();
        assert_eq!(out, [(page - 2) as u8, (page - 1) as u8, 0, 1]);

        let mut out = Vec::new();
        parse(&["-l", "8"]).run_to(&config, &mut out).unwrap();
        assert_eq!(out, [8, 9, 10, 11]);

        let mut out = Vec::new();
        parse(&["16", "5"]).run_to(&config, &mut out).unwrap();
        assert_eq!(out, [16, 17, 18, 19, 20]);
    }

    #[test]
    fn test_device_flag_overrides_config() {
        let page = system_page_size();
        let device = fake_device(page);
        let config = Config {
            device: "/nonexistent/memtools-device".into(),
            page_size: Some(page),
            ..Config::default()
        };

        let path = device.path().to_str().unwrap();
        let mut out = Vec::new();
        parse(&["--device", path, "-w", "2"]).run_to(&config, &mut out).unwrap();
        assert_eq!(out, [2, 3]);

        let err = parse(&["-w", "2"]).run_to(&config, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ToolError::PhysMem(PhysMemError::DeviceUnavailable { .. })));
        assert_eq!(ExitStatus::from(&err), ExitStatus::OsFile);
    }

    #[test]
    fn test_misaligned_width() {
        let page = system_page_size();
        let device = fake_device(page);
        let err = parse(&["-l", "2"]).run_to(&config_for(&device), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ToolError::PhysMem(PhysMemError::Misaligned { .. })));
        assert_eq!(ExitStatus::from(&err), ExitStatus::Usage);
    }
}
