use std::io::Write;
use std::path::Path;

use anyhow::Result;
use container::{load, RunConfig, RunMode};

use crate::engine::VmEngine;

/// Load `path` and execute it, printing the completion value in
/// [`RunMode::ExecuteAndPrint`].
pub fn run_file(
    engine: &mut VmEngine,
    path: &Path,
    mode: RunMode,
    config: &RunConfig,
    out: &mut dyn Write,
) -> Result<()> {
    let program = load(engine, path)?;
    program.run(engine, mode, None, config, out)?;
    out.flush()?;
    Ok(())
}
