use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cursor::CursorError;
use crate::engine::EngineError;
use crate::source::SourceError;

/// Which kind of record a unit index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Function,
    Script,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Function => write!(f, "function"),
            UnitKind::Script => write!(f, "script"),
        }
    }
}

/// A malformed container image. No unit of a failed image is ever linked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("bad magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },
    #[error("truncated image: needed {needed} byte(s), {available} available")]
    Truncated { needed: usize, available: usize },
    #[error("corrupt {kind} unit #{index}: {message}")]
    Corrupt {
        index: u32,
        kind: UnitKind,
        message: String,
    },
    #[error("{remaining} trailing byte(s) after the last unit")]
    TrailingData { remaining: usize },
}

impl From<CursorError> for ImageError {
    fn from(e: CursorError) -> Self {
        match e {
            CursorError::UnexpectedEnd { needed, available } => {
                ImageError::Truncated { needed, available }
            }
        }
    }
}

/// Everything that can stop a load, run or disassembly.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("invalid image: {0}")]
    Image(#[from] ImageError),
    #[error("{0}")]
    Compile(EngineError),
    #[error("{0}")]
    Runtime(EngineError),
    #[error("{name} is not defined")]
    UndefinedName { name: String },
    #[error("{name} is not a function")]
    NotAFunction { name: String },
    #[error("{}: unknown file type (expected .js or .jsc)", path.display())]
    UnknownFileType { path: PathBuf },
    #[error("output error: {0}")]
    Output(#[from] io::Error),
}
