use crate::error::CompilerError;
use crate::types::Local;
use memory::{Constant, Prototype};
use vm::opcode::instruction::{encode_abc, encode_abx};
use vm::opcode::OpCode;

/// State specific to ONE function being compiled
pub struct FunctionCompiler {
    pub name: String,
    pub arity: u8,
    pub locals: Vec<Local>,
    pub scope_depth: u32,
    pub bytecode: Vec<u32>,
    pub constants: Vec<Constant>,
    pub protos: Vec<Prototype>,

    /// Set for the top-level script body: declarations become globals and
    /// expression statements update the completion register.
    pub is_script: bool,
    pub completion_reg: Option<u8>,

    // Register allocator state
    pub reg_top: u8,
    pub max_slots: u16,

    // Source line of the statement being compiled, for error reporting
    pub current_line: usize,
}

impl FunctionCompiler {
    /// Creates a new function compiler.
    /// reg_top starts at arity so arguments keep R0..R(arity-1).
    pub fn new(name: impl Into<String>, arity: u8) -> Self {
        Self {
            name: name.into(),
            arity,
            locals: Vec::new(),
            scope_depth: 0,
            bytecode: Vec::new(),
            constants: Vec::new(),
            protos: Vec::new(),
            is_script: false,
            completion_reg: None,
            reg_top: arity,
            max_slots: arity as u16,
            current_line: 0,
        }
    }

    /// A script body with its completion value kept in R0.
    pub fn script(name: impl Into<String>) -> Self {
        let mut fc = Self::new(name, 0);
        fc.is_script = true;
        fc.completion_reg = Some(0);
        fc.reg_top = 1;
        fc.max_slots = 1;
        fc
    }

    pub fn alloc_reg(&mut self) -> Result<u8, CompilerError> {
        let r = self.reg_top;
        if r == u8::MAX {
            return Err(CompilerError::RegisterOverflow {
                line: self.current_line,
            });
        }
        self.reg_top += 1;

        // Track high water mark
        if (self.reg_top as u16) > self.max_slots {
            self.max_slots = self.reg_top as u16;
        }

        Ok(r)
    }

    /// Registers are released in stack order.
    pub fn free_reg(&mut self, reg: u8) {
        debug_assert_eq!(reg + 1, self.reg_top, "register hygiene error");
        self.reg_top = reg;
    }

    pub fn add_constant(&mut self, constant: Constant) -> Result<u16, CompilerError> {
        if let Some(idx) = self.constants.iter().position(|c| c.same_as(&constant)) {
            return Ok(idx as u16);
        }
        if self.constants.len() > u16::MAX as usize {
            return Err(CompilerError::TooManyConstants {
                line: self.current_line,
            });
        }
        self.constants.push(constant);
        Ok((self.constants.len() - 1) as u16)
    }

    pub fn add_proto(&mut self, proto: Prototype) -> Result<u16, CompilerError> {
        if self.protos.len() > u16::MAX as usize {
            return Err(CompilerError::TooManyFunctions {
                line: self.current_line,
            });
        }
        self.protos.push(proto);
        Ok((self.protos.len() - 1) as u16)
    }

    pub fn emit_abc(&mut self, op: OpCode, a: u8, b: u8, c: u8) {
        self.bytecode.push(encode_abc(op.as_u8(), a, b, c));
    }

    pub fn emit_abx(&mut self, op: OpCode, a: u8, bx: u16) {
        self.bytecode.push(encode_abx(op.as_u8(), a, bx));
    }

    pub fn resolve_local(&self, name: &str) -> Option<&Local> {
        self.locals.iter().rev().find(|local| local.name == name)
    }

    pub fn into_prototype(self) -> Prototype {
        Prototype {
            name: self.name,
            arity: self.arity,
            max_slots: self.max_slots,
            code: self.bytecode,
            constants: self.constants,
            protos: self.protos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_start_after_arguments() {
        let mut fc = FunctionCompiler::new("f", 2);
        assert_eq!(fc.alloc_reg().unwrap(), 2);
        assert_eq!(fc.alloc_reg().unwrap(), 3);
        fc.free_reg(3);
        fc.free_reg(2);
        assert_eq!(fc.reg_top, 2);
        assert_eq!(fc.max_slots, 4);
    }

    #[test]
    fn test_script_reserves_completion_register() {
        let mut fc = FunctionCompiler::script("s");
        assert_eq!(fc.completion_reg, Some(0));
        assert_eq!(fc.alloc_reg().unwrap(), 1);
    }

    #[test]
    fn test_constants_are_deduplicated() {
        let mut fc = FunctionCompiler::new("f", 0);
        let a = fc.add_constant(Constant::Number(1.0)).unwrap();
        let b = fc.add_constant(Constant::String("x".into())).unwrap();
        let c = fc.add_constant(Constant::Number(1.0)).unwrap();
        let d = fc.add_constant(Constant::Number(-0.0)).unwrap();
        let e = fc.add_constant(Constant::Number(0.0)).unwrap();
        assert_eq!((a, b, c), (0, 1, 0));
        assert_ne!(d, e);
    }

    #[test]
    fn test_register_overflow() {
        let mut fc = FunctionCompiler::new("f", 0);
        for _ in 0..255 {
            fc.alloc_reg().unwrap();
        }
        assert!(matches!(
            fc.alloc_reg(),
            Err(CompilerError::RegisterOverflow { .. })
        ));
    }
}
