use std::path::PathBuf;

use clap::Parser;
use container::{RunConfig, RunMode};

#[derive(Parser, Debug)]
#[command(name = "jsvm")]
#[command(about = "Run, print or disassemble a script or container image", long_about = None)]
pub struct Cli {
    /// Print the script's completion value after running it
    #[arg(short, long, conflicts_with = "disassemble")]
    pub print: bool,

    /// Disassemble the script, or FUNCTION, instead of running it
    #[arg(short, long)]
    pub disassemble: bool,

    /// Trace every executed instruction to stderr
    #[arg(short, long)]
    pub trace: bool,

    /// Compile a .js source into a .jsc image at OUT instead of running it
    #[arg(
        short = 'o',
        long = "emit",
        value_name = "OUT",
        conflicts_with_all = ["print", "disassemble", "trace"]
    )]
    pub emit: Option<PathBuf>,

    /// Source (.js) or container image (.jsc)
    pub source: PathBuf,

    /// Global function to disassemble
    #[arg(requires = "disassemble")]
    pub function: Option<String>,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.disassemble {
            RunMode::Disassemble
        } else if self.print {
            RunMode::ExecuteAndPrint
        } else {
            RunMode::Execute
        }
    }

    pub fn config(&self) -> RunConfig {
        RunConfig { trace: self.trace }
    }
}
