use std::process::ExitCode;

use memtools::{cli, setmem::SetMem};

fn main() -> ExitCode {
    cli::main::<SetMem>(std::env::args_os())
}
