use std::io::Write;
use std::path::Path;

use anyhow::Result;
use container::load;

use crate::engine::VmEngine;

/// Disassemble the script in `path`, or the global function `function`
/// once the image has been linked.
pub fn disassemble_file(
    engine: &mut VmEngine,
    path: &Path,
    function: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let program = load(engine, path)?;
    program.disassemble(engine, function, out)?;
    out.flush()?;
    Ok(())
}
