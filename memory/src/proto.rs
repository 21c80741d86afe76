//! Heap-independent function bodies.
//!
//! The compiler produces [`Prototype`] trees and the unit codec reads and
//! writes them; only the VM turns them into heap objects.

/// A literal in a function's constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Constant {
    /// Identity used for constant-pool deduplication. Unlike `==`, this
    /// keeps `0` and `-0` apart and treats equal NaN bit patterns as one.
    pub fn same_as(&self, other: &Constant) -> bool {
        match (self, other) {
            (Constant::Number(a), Constant::Number(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

/// A compiled function body with its nested function bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub arity: u8,
    pub max_slots: u16,
    pub code: Vec<u32>,
    pub constants: Vec<Constant>,
    pub protos: Vec<Prototype>,
}

impl Prototype {
    pub fn new(name: impl Into<String>, arity: u8) -> Self {
        Self {
            name: name.into(),
            arity,
            max_slots: arity as u16,
            code: Vec::new(),
            constants: Vec::new(),
            protos: Vec::new(),
        }
    }
}
