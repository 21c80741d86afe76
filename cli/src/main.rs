use std::io;
use std::process::ExitCode;

use clap::Parser;

use cli::args::Cli;
use cli::VmEngine;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("JSVM_LOG", "warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let mut engine = VmEngine::new();
    let mut stdout = io::stdout().lock();

    match cli::execute(&cli, &mut engine, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("jsvm: error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
