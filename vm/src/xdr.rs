//! Unit record codec.
//!
//! A container image stores each function or script as one self-delimiting
//! record (all integers little endian):
//!
//! ```text
//! kind        u8        b'F' function | b'S' script
//! name        u32 len + UTF-8 bytes
//! arity       u8
//! max_slots   u16
//! constants   u32 count, then per constant: tag u8 + payload
//! protos      u32 count, then nested bodies (name .. code, no kind byte)
//! code        u32 count, then u32 instructions
//! ```
//!
//! Constant tags: 0 undefined, 1 null, 2 false, 3 true, 4 number (f64),
//! 5 string (u32 len + UTF-8).
//!
//! # Security
//! Reading checks every count against a fixed limit before allocating, and
//! decoded bodies are verified before they can reach the interpreter.

use std::fmt;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memory::value::{TAG_FALSE, TAG_NULL, TAG_NUMBER, TAG_STRING, TAG_TRUE, TAG_UNDEFINED};
use memory::{Constant, Prototype};
use thiserror::Error;

use crate::opcode::{instruction::*, Format, OpCode};

pub const MAX_NAME_LEN: u32 = 1024;
pub const MAX_STRING_LEN: u32 = 1 << 20;
pub const MAX_CONSTANTS: u32 = 1 << 16;
pub const MAX_PROTOS: u32 = 1 << 16;
pub const MAX_CODE_LEN: u32 = 1_000_000;
pub const MAX_DEPTH: usize = 64;

// Upper bound on speculative preallocation for attacker-controlled counts
const PREALLOC_LIMIT: usize = 1024;

/// Which record a unit holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Function,
    Script,
}

impl UnitKind {
    pub fn tag(self) -> u8 {
        match self {
            UnitKind::Function => b'F',
            UnitKind::Script => b'S',
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'F' => Some(UnitKind::Function),
            b'S' => Some(UnitKind::Script),
            _ => None,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Function => write!(f, "function"),
            UnitKind::Script => write!(f, "script"),
        }
    }
}

#[derive(Debug, Error)]
pub enum XdrError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("expected a {expected} record, found kind byte {found:#04x}")]
    UnexpectedKind { expected: UnitKind, found: u8 },
    #[error("unknown constant tag {0}")]
    UnknownConstantTag(u8),
    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),
    #[error("{what} exceeds limit of {limit}: {found}")]
    Limit {
        what: &'static str,
        limit: u32,
        found: u64,
    },
    #[error("functions nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("invalid bytecode in `{function}` at {ip:04}: {message}")]
    Bytecode {
        function: String,
        ip: usize,
        message: String,
    },
}

/// Serialize `proto` as one unit record.
pub fn write_unit<W: Write>(w: &mut W, kind: UnitKind, proto: &Prototype) -> Result<(), XdrError> {
    w.write_u8(kind.tag())?;
    write_body(w, proto, 0)
}

/// Serialize `proto` into a fresh buffer.
pub fn encode_unit(kind: UnitKind, proto: &Prototype) -> Result<Vec<u8>, XdrError> {
    let mut buf = Vec::new();
    write_unit(&mut buf, kind, proto)?;
    Ok(buf)
}

/// Read one unit record of the expected kind and verify its bytecode.
pub fn read_unit<R: Read>(r: &mut R, expected: UnitKind) -> Result<Prototype, XdrError> {
    let found = r.read_u8()?;
    if UnitKind::from_tag(found) != Some(expected) {
        return Err(XdrError::UnexpectedKind { expected, found });
    }
    let proto = read_body(r, 0)?;
    verify(&proto)?;
    Ok(proto)
}

fn check_limit(what: &'static str, found: usize, limit: u32) -> Result<u32, XdrError> {
    if found > limit as usize {
        return Err(XdrError::Limit {
            what,
            limit,
            found: found as u64,
        });
    }
    Ok(found as u32)
}

fn write_str<W: Write>(w: &mut W, s: &str, what: &'static str, limit: u32) -> Result<(), XdrError> {
    let len = check_limit(what, s.len(), limit)?;
    w.write_u32::<LittleEndian>(len)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn write_body<W: Write>(w: &mut W, proto: &Prototype, depth: usize) -> Result<(), XdrError> {
    if depth > MAX_DEPTH {
        return Err(XdrError::TooDeep(MAX_DEPTH));
    }

    write_str(w, &proto.name, "function name length", MAX_NAME_LEN)?;
    w.write_u8(proto.arity)?;
    w.write_u16::<LittleEndian>(proto.max_slots)?;

    let count = check_limit("constant count", proto.constants.len(), MAX_CONSTANTS)?;
    w.write_u32::<LittleEndian>(count)?;
    for c in &proto.constants {
        match c {
            Constant::Undefined => w.write_u8(TAG_UNDEFINED)?,
            Constant::Null => w.write_u8(TAG_NULL)?,
            Constant::Bool(false) => w.write_u8(TAG_FALSE)?,
            Constant::Bool(true) => w.write_u8(TAG_TRUE)?,
            Constant::Number(n) => {
                w.write_u8(TAG_NUMBER)?;
                w.write_f64::<LittleEndian>(*n)?;
            }
            Constant::String(s) => {
                w.write_u8(TAG_STRING)?;
                write_str(w, s, "string length", MAX_STRING_LEN)?;
            }
        }
    }

    let count = check_limit("prototype count", proto.protos.len(), MAX_PROTOS)?;
    w.write_u32::<LittleEndian>(count)?;
    for nested in &proto.protos {
        write_body(w, nested, depth + 1)?;
    }

    let count = check_limit("bytecode length", proto.code.len(), MAX_CODE_LEN)?;
    w.write_u32::<LittleEndian>(count)?;
    for inst in &proto.code {
        w.write_u32::<LittleEndian>(*inst)?;
    }
    Ok(())
}

fn read_count<R: Read>(r: &mut R, what: &'static str, limit: u32) -> Result<usize, XdrError> {
    let n = r.read_u32::<LittleEndian>()?;
    Ok(check_limit(what, n as usize, limit)? as usize)
}

fn read_str<R: Read>(r: &mut R, what: &'static str, limit: u32) -> Result<String, XdrError> {
    let len = read_count(r, what, limit)?;
    let mut bytes = vec![0u8; len];
    r.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| XdrError::InvalidUtf8(what))
}

fn read_body<R: Read>(r: &mut R, depth: usize) -> Result<Prototype, XdrError> {
    if depth > MAX_DEPTH {
        return Err(XdrError::TooDeep(MAX_DEPTH));
    }

    let name = read_str(r, "function name length", MAX_NAME_LEN)?;
    let arity = r.read_u8()?;
    let max_slots = r.read_u16::<LittleEndian>()?;

    let count = read_count(r, "constant count", MAX_CONSTANTS)?;
    let mut constants = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        let tag = r.read_u8()?;
        let c = match tag {
            TAG_UNDEFINED => Constant::Undefined,
            TAG_NULL => Constant::Null,
            TAG_FALSE => Constant::Bool(false),
            TAG_TRUE => Constant::Bool(true),
            TAG_NUMBER => Constant::Number(r.read_f64::<LittleEndian>()?),
            TAG_STRING => Constant::String(read_str(r, "string length", MAX_STRING_LEN)?),
            other => return Err(XdrError::UnknownConstantTag(other)),
        };
        constants.push(c);
    }

    let count = read_count(r, "prototype count", MAX_PROTOS)?;
    let mut protos = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        protos.push(read_body(r, depth + 1)?);
    }

    let count = read_count(r, "bytecode length", MAX_CODE_LEN)?;
    let mut code = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        code.push(r.read_u32::<LittleEndian>()?);
    }

    Ok(Prototype {
        name,
        arity,
        max_slots,
        code,
        constants,
        protos,
    })
}

/// Static checks that keep a decoded body from indexing outside its own
/// registers, constants, prototypes or code.
pub fn verify(proto: &Prototype) -> Result<(), XdrError> {
    let fail = |ip: usize, message: String| XdrError::Bytecode {
        function: proto.name.clone(),
        ip,
        message,
    };

    if (proto.max_slots as usize) < proto.arity as usize {
        return Err(fail(
            0,
            format!("{} slots cannot hold {} parameters", proto.max_slots, proto.arity),
        ));
    }

    let slots = proto.max_slots as usize;
    let reg = |ip: usize, r: usize| -> Result<(), XdrError> {
        if r < slots {
            Ok(())
        } else {
            Err(fail(ip, format!("register R{r} out of range ({slots} slots)")))
        }
    };

    for (ip, inst) in proto.code.iter().enumerate() {
        let op_byte = decode_opcode(*inst);
        let op = OpCode::from_u8(op_byte)
            .ok_or_else(|| fail(ip, format!("unknown opcode {op_byte:#04x}")))?;
        let a = decode_a(*inst) as usize;
        let b = decode_b(*inst) as usize;
        let c = decode_c(*inst) as usize;
        let bx = decode_bx(*inst) as usize;

        match op.format() {
            Format::None => {}
            Format::A => reg(ip, a)?,
            Format::Ret => {
                if b == 1 {
                    reg(ip, a)?;
                }
            }
            Format::AB => {
                reg(ip, a)?;
                reg(ip, b)?;
            }
            Format::ABC => {
                reg(ip, a)?;
                reg(ip, b)?;
                reg(ip, c)?;
            }
            Format::Call => {
                reg(ip, a)?;
                reg(ip, b + c)?;
            }
            Format::AK | Format::K => {
                if op.format() == Format::AK {
                    reg(ip, a)?;
                }
                let constant = proto
                    .constants
                    .get(bx)
                    .ok_or_else(|| fail(ip, format!("constant K{bx} out of range")))?;
                if op != OpCode::LoadConst && !matches!(constant, Constant::String(_)) {
                    return Err(fail(ip, format!("global name K{bx} is not a string")));
                }
            }
            Format::AJ | Format::J => {
                if op.format() == Format::AJ {
                    reg(ip, a)?;
                }
                if bx > proto.code.len() {
                    return Err(fail(ip, format!("jump target {bx} past end of code")));
                }
            }
            Format::AP => {
                reg(ip, a)?;
                if bx >= proto.protos.len() {
                    return Err(fail(ip, format!("prototype P{bx} out of range")));
                }
            }
        }
    }

    proto.protos.iter().try_for_each(verify)
}
