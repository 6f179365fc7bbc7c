use std::process::ExitCode;

use memtools::{cli, getmem::GetMem};

fn main() -> ExitCode {
    cli::main::<GetMem>(std::env::args_os())
}
