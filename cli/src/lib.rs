pub mod args;
pub mod commands;
pub mod engine;

use std::io::Write;

use anyhow::Result;

use args::Cli;
use commands::{compile, disassemble, run};
pub use engine::{VmEngine, VmFunction};

/// Carry out one invocation. Program output goes to `out`.
pub fn execute(cli: &Cli, engine: &mut VmEngine, out: &mut dyn Write) -> Result<()> {
    if let Some(output) = &cli.emit {
        return compile::compile_file(&cli.source, output);
    }
    if cli.disassemble {
        return disassemble::disassemble_file(engine, &cli.source, cli.function.as_deref(), out);
    }
    run::run_file(engine, &cli.source, cli.mode(), &cli.config(), out)
}
