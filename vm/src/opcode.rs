//! OpCode definitions for the jsvm VM
//!
//! This module defines the complete instruction set for the VM.
//! Instructions are encoded as 32-bit values with the following formats:
//!
//! Format ABC: [8-bit opcode][8-bit A][8-bit B][8-bit C]
//! Format ABx: [8-bit opcode][8-bit A][16-bit Bx]
//!
//! Register-based instructions use A, B, C as register indices (0-255).
//! `K[x]` is entry `x` of the running function's constant pool.

use std::fmt;

/// Virtual machine instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    // ===== Constants & Moves =====
    /// Load constant from pool: R[A] = K[Bx]
    LoadConst = 0,
    /// Load True: R[A] = true
    LoadTrue = 1,
    /// Load False: R[A] = false
    LoadFalse = 2,
    /// Load Null: R[A] = null
    LoadNull = 3,
    /// Load Undefined: R[A] = undefined
    LoadUndef = 4,
    /// Move register: R[A] = R[B]
    Move = 5,

    // ===== Arithmetic =====
    /// Addition or string concatenation: R[A] = R[B] + R[C]
    Add = 10,
    /// Subtraction: R[A] = R[B] - R[C]
    Sub = 11,
    /// Multiplication: R[A] = R[B] * R[C]
    Mul = 12,
    /// Division: R[A] = R[B] / R[C]
    Div = 13,
    /// Remainder: R[A] = R[B] % R[C]
    Mod = 14,
    /// Negation: R[A] = -R[B]
    Neg = 16,

    // ===== Comparison =====
    /// Loose equality: R[A] = R[B] == R[C]
    Eq = 20,
    /// Less Than: R[A] = R[B] < R[C]
    Lt = 21,
    /// Greater Than: R[A] = R[B] > R[C]
    Gt = 22,
    /// Loose inequality: R[A] = R[B] != R[C]
    NotEq = 23,
    /// Less Than or Equal: R[A] = R[B] <= R[C]
    Le = 24,
    /// Greater Than or Equal: R[A] = R[B] >= R[C]
    Ge = 25,
    /// Logical Not: R[A] = !R[B]
    LogNot = 26,
    /// Strict equality: R[A] = R[B] === R[C]
    StrictEq = 27,
    /// Strict inequality: R[A] = R[B] !== R[C]
    StrictNotEq = 28,

    // ===== Functions =====
    /// Return: return R[A] if B == 1, else return undefined
    Return = 54,
    /// Call: R[A] = R[B](R[B+1], ..., R[B+C])
    Call = 55,
    /// Closure: R[A] = new closure over Protos[Bx], sharing the caller's scope
    Closure = 56,

    // ===== Flow Control =====
    /// Unconditional Jump: IP = Bx
    Jump = 60,
    /// Jump if False: If !R[A] then IP = Bx
    JumpIfFalse = 61,
    /// Jump if True: If R[A] then IP = Bx
    JumpIfTrue = 62,

    // ===== Global Variables =====
    /// Define global: Global[K[Bx]] = R[A], enumerable
    DefGlobal = 98,
    /// Declare global: Global[K[Bx]] = undefined unless already bound
    DeclGlobal = 99,
    /// Get global: R[A] = Global[K[Bx]]
    GetGlobal = 100,
    /// Set global: Global[K[Bx]] = R[A]
    SetGlobal = 101,

    // ===== Special =====
    /// No operation
    Nop = 255,
}

/// Operand layout of an instruction, used by the disassembler and the
/// bytecode verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// No operands
    None,
    /// R[A]
    A,
    /// R[A], R[B]
    AB,
    /// R[A], R[B], R[C]
    ABC,
    /// R[A], K[Bx]
    AK,
    /// K[Bx]
    K,
    /// R[A], jump target Bx
    AJ,
    /// jump target Bx
    J,
    /// R[A], prototype Bx
    AP,
    /// R[A], R[B], argument count C
    Call,
    /// R[A], flag B
    Ret,
}

impl OpCode {
    /// Get opcode from byte value
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(OpCode::LoadConst),
            1 => Some(OpCode::LoadTrue),
            2 => Some(OpCode::LoadFalse),
            3 => Some(OpCode::LoadNull),
            4 => Some(OpCode::LoadUndef),
            5 => Some(OpCode::Move),
            10 => Some(OpCode::Add),
            11 => Some(OpCode::Sub),
            12 => Some(OpCode::Mul),
            13 => Some(OpCode::Div),
            14 => Some(OpCode::Mod),
            16 => Some(OpCode::Neg),
            20 => Some(OpCode::Eq),
            21 => Some(OpCode::Lt),
            22 => Some(OpCode::Gt),
            23 => Some(OpCode::NotEq),
            24 => Some(OpCode::Le),
            25 => Some(OpCode::Ge),
            26 => Some(OpCode::LogNot),
            27 => Some(OpCode::StrictEq),
            28 => Some(OpCode::StrictNotEq),
            54 => Some(OpCode::Return),
            55 => Some(OpCode::Call),
            56 => Some(OpCode::Closure),
            60 => Some(OpCode::Jump),
            61 => Some(OpCode::JumpIfFalse),
            62 => Some(OpCode::JumpIfTrue),
            98 => Some(OpCode::DefGlobal),
            99 => Some(OpCode::DeclGlobal),
            100 => Some(OpCode::GetGlobal),
            101 => Some(OpCode::SetGlobal),
            255 => Some(OpCode::Nop),
            _ => None,
        }
    }

    /// Convert opcode to byte value
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            OpCode::LoadConst => "LOAD_CONST",
            OpCode::LoadTrue => "LOAD_TRUE",
            OpCode::LoadFalse => "LOAD_FALSE",
            OpCode::LoadNull => "LOAD_NULL",
            OpCode::LoadUndef => "LOAD_UNDEF",
            OpCode::Move => "MOVE",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Mod => "MOD",
            OpCode::Neg => "NEG",
            OpCode::Eq => "EQ",
            OpCode::Lt => "LT",
            OpCode::Gt => "GT",
            OpCode::NotEq => "NOT_EQ",
            OpCode::Le => "LE",
            OpCode::Ge => "GE",
            OpCode::LogNot => "LOG_NOT",
            OpCode::StrictEq => "STRICT_EQ",
            OpCode::StrictNotEq => "STRICT_NOT_EQ",
            OpCode::Return => "RETURN",
            OpCode::Call => "CALL",
            OpCode::Closure => "CLOSURE",
            OpCode::Jump => "JUMP",
            OpCode::JumpIfFalse => "JUMP_IF_FALSE",
            OpCode::JumpIfTrue => "JUMP_IF_TRUE",
            OpCode::DefGlobal => "DEF_GLOBAL",
            OpCode::DeclGlobal => "DECL_GLOBAL",
            OpCode::GetGlobal => "GET_GLOBAL",
            OpCode::SetGlobal => "SET_GLOBAL",
            OpCode::Nop => "NOP",
        }
    }

    pub fn format(self) -> Format {
        match self {
            OpCode::LoadConst
            | OpCode::DefGlobal
            | OpCode::GetGlobal
            | OpCode::SetGlobal => Format::AK,
            OpCode::DeclGlobal => Format::K,
            OpCode::LoadTrue | OpCode::LoadFalse | OpCode::LoadNull | OpCode::LoadUndef => {
                Format::A
            }
            OpCode::Move | OpCode::Neg | OpCode::LogNot => Format::AB,
            OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div
            | OpCode::Mod
            | OpCode::Eq
            | OpCode::Lt
            | OpCode::Gt
            | OpCode::NotEq
            | OpCode::Le
            | OpCode::Ge
            | OpCode::StrictEq
            | OpCode::StrictNotEq => Format::ABC,
            OpCode::Return => Format::Ret,
            OpCode::Call => Format::Call,
            OpCode::Closure => Format::AP,
            OpCode::Jump => Format::J,
            OpCode::JumpIfFalse | OpCode::JumpIfTrue => Format::AJ,
            OpCode::Nop => Format::None,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Instruction encoding/decoding utilities
pub mod instruction {
    /// Encode instruction in ABC format
    #[inline]
    pub fn encode_abc(opcode: u8, a: u8, b: u8, c: u8) -> u32 {
        ((opcode as u32) << 24) | ((a as u32) << 16) | ((b as u32) << 8) | (c as u32)
    }

    /// Encode instruction in ABx format
    #[inline]
    pub fn encode_abx(opcode: u8, a: u8, bx: u16) -> u32 {
        ((opcode as u32) << 24) | ((a as u32) << 16) | (bx as u32)
    }

    /// Decode instruction opcode
    #[inline]
    pub fn decode_opcode(instruction: u32) -> u8 {
        (instruction >> 24) as u8
    }

    /// Decode A operand
    #[inline]
    pub fn decode_a(instruction: u32) -> u8 {
        ((instruction >> 16) & 0xFF) as u8
    }

    /// Decode B operand
    #[inline]
    pub fn decode_b(instruction: u32) -> u8 {
        ((instruction >> 8) & 0xFF) as u8
    }

    /// Decode C operand
    #[inline]
    pub fn decode_c(instruction: u32) -> u8 {
        (instruction & 0xFF) as u8
    }

    /// Decode Bx operand (16-bit)
    #[inline]
    pub fn decode_bx(instruction: u32) -> u16 {
        (instruction & 0xFFFF) as u16
    }
}
