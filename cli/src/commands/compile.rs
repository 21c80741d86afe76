use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use container::{read_all, ImageBuilder, SourceKind};
use vm::xdr::{encode_unit, UnitKind};

/// Compile a `.js` source into a `.jsc` image. Top-level function
/// declarations become function units; the rest becomes the script unit.
pub fn compile_file(source: &Path, output: &Path) -> Result<()> {
    if SourceKind::from_path(source) != Some(SourceKind::Text) {
        bail!("{}: only .js sources can be compiled", source.display());
    }
    let text = String::from_utf8(read_all(source)?.into_inner())
        .with_context(|| format!("{}: source is not valid UTF-8", source.display()))?;
    let image = compiler::compile_image(&text)
        .with_context(|| format!("{}: compile failed", source.display()))?;

    let mut builder = ImageBuilder::new(vm::CONTAINER_MAGIC);
    for function in &image.functions {
        builder.function(encode_unit(UnitKind::Function, function)?);
    }
    builder.script(encode_unit(UnitKind::Script, &image.script)?);
    let bytes = builder.finish();

    fs::write(output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    log::info!(
        "wrote {} ({} function unit(s), {} byte(s))",
        output.display(),
        image.functions.len(),
        bytes.len()
    );
    Ok(())
}
