//! Execution driver: load a program, then run or disassemble it once.

use std::fmt;
use std::io::Write;
use std::path::Path;

use crate::decode::decode;
use crate::engine::{Engine, EngineError, Unit};
use crate::error::Error;
use crate::link::link;
use crate::source::read_all;

/// What to do with a loaded program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    Execute,
    ExecuteAndPrint,
    Disassemble,
}

/// Per-run engine settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Write every executed instruction to the engine's trace sink.
    pub trace: bool,
}

/// Input format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.js`: source text
    Text,
    /// `.jsc`: container image
    Image,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "js" => Some(SourceKind::Text),
            "jsc" => Some(SourceKind::Image),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Text => write!(f, "source text"),
            SourceKind::Image => write!(f, "container image"),
        }
    }
}

/// A script ready to run against its global scope. Running or
/// disassembling consumes it.
pub struct LoadedProgram<E: Engine> {
    global: E::Scope,
    script: E::Script,
}

/// Read `path` and turn it into a runnable program.
///
/// Source text is compiled into a single script. A container image is
/// decoded in full and its functions are linked into the new global scope
/// before the script is handed back.
pub fn load<E: Engine>(engine: &mut E, path: &Path) -> Result<LoadedProgram<E>, Error> {
    let kind = SourceKind::from_path(path).ok_or_else(|| Error::UnknownFileType {
        path: path.to_path_buf(),
    })?;
    let buffer = read_all(path)?;
    log::debug!("loading {} as {kind}", path.display());

    match kind {
        SourceKind::Text => {
            let source = String::from_utf8(buffer.into_inner()).map_err(|e| {
                Error::Compile(EngineError::new(format!(
                    "{}: source is not valid UTF-8 (byte {})",
                    path.display(),
                    e.utf8_error().valid_up_to()
                )))
            })?;
            let filename = path.to_string_lossy();
            let script = engine
                .compile_text(&source, &filename)
                .map_err(Error::Compile)?;
            let global = engine.new_global();
            Ok(LoadedProgram { global, script })
        }
        SourceKind::Image => {
            let image = decode(buffer, engine)?;
            let global = engine.new_global();
            link(engine, &global, image.functions).map_err(Error::Runtime)?;
            Ok(LoadedProgram {
                global,
                script: image.script,
            })
        }
    }
}

impl<E: Engine> LoadedProgram<E> {
    /// Run in `mode`. `function` only applies to disassembly.
    pub fn run(
        self,
        engine: &mut E,
        mode: RunMode,
        function: Option<&str>,
        config: &RunConfig,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        match mode {
            RunMode::Execute => self.execute(engine, false, config, out),
            RunMode::ExecuteAndPrint => self.execute(engine, true, config, out),
            RunMode::Disassemble => self.disassemble(engine, function, out),
        }
    }

    /// Run the script. With `print_result`, its completion value is written
    /// to `out` followed by a newline; nothing is written if the run fails.
    pub fn execute(
        self,
        engine: &mut E,
        print_result: bool,
        config: &RunConfig,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        let value = engine
            .run_script(&self.global, &self.script, config)
            .map_err(Error::Runtime)?;
        if print_result {
            let text = engine
                .value_to_display_string(&value)
                .map_err(Error::Runtime)?;
            writeln!(out, "{text}")?;
        }
        Ok(())
    }

    /// Disassemble the script, or the global function called `function`.
    pub fn disassemble(
        self,
        engine: &mut E,
        function: Option<&str>,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        match function {
            None => engine
                .disassemble(Unit::Script(&self.script), out)
                .map_err(Error::Runtime),
            Some(name) => {
                let value = engine.lookup_global(&self.global, name).ok_or_else(|| {
                    Error::UndefinedName {
                        name: name.to_string(),
                    }
                })?;
                let function = engine
                    .as_function(&value)
                    .ok_or_else(|| Error::NotAFunction {
                        name: name.to_string(),
                    })?;
                engine
                    .disassemble(Unit::Function(&function), out)
                    .map_err(Error::Runtime)
            }
        }
    }
}
