//! Container images and the load/link/run pipeline.
//!
//! A container image packs zero or more function units and exactly one
//! script unit into a single byte stream:
//!
//! ```text
//! offset  field       type
//! 0       magic       u32 LE   engine-specific tag
//! 4       unit_count  u32 LE   functions + 1 script
//! 8..     units       engine-defined records, functions first, script last
//! ```
//!
//! Nothing may follow the script record. The unit records themselves are
//! opaque here; an [`Engine`] decodes them from a [`Cursor`].

pub mod cursor;
pub mod decode;
pub mod driver;
pub mod encode;
pub mod engine;
pub mod error;
pub mod link;
pub mod source;

pub use cursor::{Cursor, CursorError};
pub use decode::{decode, DecodedImage};
pub use driver::{load, LoadedProgram, RunConfig, RunMode, SourceKind};
pub use encode::ImageBuilder;
pub use engine::{Engine, EngineError, Unit};
pub use error::{Error, ImageError, UnitKind};
pub use link::link;
pub use source::{read_all, ByteBuffer, SourceError};

/// Size of the fixed image header (`magic` + `unit_count`).
pub const HEADER_LEN: usize = 8;
