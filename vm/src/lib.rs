pub mod disasm;
pub mod error;
pub mod machine;
pub mod native;
pub mod opcode;
pub mod stdlib;
pub mod xdr;

pub use error::RuntimeError;
pub use machine::{CallFrame, VM};
pub use native::{NativeFn, NativeObj};
pub use opcode::OpCode;
pub use xdr::{UnitKind, XdrError};

/// First four bytes of every container image (`"JSC\x01"`, little endian).
pub const CONTAINER_MAGIC: u32 = u32::from_le_bytes(*b"JSC\x01");
