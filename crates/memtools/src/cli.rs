use std::{ffi::OsString, path::PathBuf, process::ExitCode};

use clap::{ArgAction, Args, Parser};
use physmem::{AccessWidth, PhysicalMemory};

use crate::{config::Config, error::ToolError, exit::ExitStatus, logger};

/// Access width flags. When several are given the last one wins.
#[derive(Args, Debug, Clone, Default)]
pub struct WidthArgs {
    /// Quadword (8 byte) accesses
    #[arg(short = 'q', long, overrides_with_all = ["long", "dword", "short", "word", "byte"])]
    pub quad: bool,
    /// Longword (4 byte) accesses
    #[arg(short = 'l', long, overrides_with_all = ["quad", "dword", "short", "word", "byte"])]
    pub long: bool,
    /// Doubleword (4 byte) accesses
    #[arg(short = 'd', long, overrides_with_all = ["quad", "long", "short", "word", "byte"])]
    pub dword: bool,
    /// Shortword (2 byte) accesses
    #[arg(short = 's', long, overrides_with_all = ["quad", "long", "dword", "word", "byte"])]
    pub short: bool,
    /// Word (2 byte) accesses
    #[arg(short = 'w', long, overrides_with_all = ["quad", "long", "dword", "short", "byte"])]
    pub word: bool,
    /// Byte accesses
    #[arg(short = 'b', long, overrides_with_all = ["quad", "long", "dword", "short", "word"])]
    pub byte: bool,
}

impl WidthArgs {
    /// The selected width, if any flag was given.
    pub fn width(&self) -> Option<AccessWidth> {
        if self.quad {
            Some(AccessWidth::Qword)
        } else if self.long || self.dword {
            Some(AccessWidth::Dword)
        } else if self.short || self.word {
            Some(AccessWidth::Word)
        } else if self.byte {
            Some(AccessWidth::Byte)
        } else {
            None
        }
    }
}

/// Flags every tool accepts.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Memory device to map instead of the configured one
    #[arg(long, value_name = "PATH")]
    pub device: Option<PathBuf>,
    /// Log more, repeat for even more
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CommonArgs {
    /// The memory to operate on, with command line overrides applied to `config`.
    pub fn memory(&self, config: &Config) -> PhysicalMemory {
        let device = self.device.as_ref().unwrap_or(&config.device);
        PhysicalMemory::new(device, config.page_size())
    }
}

/// A command line tool.
pub trait Tool: Parser {
    /// Program name used in diagnostics.
    const NAME: &'static str;

    fn common(&self) -> &CommonArgs;

    fn run(self, config: &Config) -> Result<(), ToolError>;
}

/// Parses `args`, loads the configuration and runs `T`, returning the process exit status.
pub fn main<T: Tool>(args: impl IntoIterator<Item = OsString>) -> ExitCode {
    let tool = match T::try_parse_from(args) {
        Ok(tool) => tool,
        Err(err) => {
            // Help and version requests come through here too, on stdout
            let status = if err.use_stderr() {
                ExitStatus::Usage
            } else {
                ExitStatus::Success
            };
            let _ = err.print();
            return status.into();
        }
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => return report(T::NAME, &err.into()),
    };
    logger::init(T::NAME, logger::verbosity(config.log_level, tool.common().verbose));

    match tool.run(&config) {
        Ok(()) => ExitStatus::Success.into(),
        Err(err) => report(T::NAME, &err),
    }
}

/// Prints the diagnostic for `err` and returns its exit status.
pub fn report(program: &str, err: &ToolError) -> ExitCode {
    eprintln!("{program}: {err}");
    ExitStatus::from(err).into()
}
