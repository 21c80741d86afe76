use crate::codegen::Compiler;
use crate::error::CompilerError;
use crate::scopes::ScopeCompiler;
use crate::types::Resolved;
use memory::Constant;
use vm::opcode::OpCode;

pub trait AtomCompiler {
    fn compile_number(&mut self, value: f64) -> Result<u8, CompilerError>;
    fn compile_string(&mut self, value: &str) -> Result<u8, CompilerError>;
    fn compile_load(&mut self, op: OpCode) -> Result<u8, CompilerError>;
    fn compile_identifier(&mut self, name: &str) -> Result<u8, CompilerError>;
}

impl AtomCompiler for Compiler {
    fn compile_number(&mut self, value: f64) -> Result<u8, CompilerError> {
        let idx = self.add_constant(Constant::Number(value))?;
        let reg = self.alloc_reg()?;
        self.emit_abx(OpCode::LoadConst, reg, idx);
        Ok(reg)
    }

    fn compile_string(&mut self, value: &str) -> Result<u8, CompilerError> {
        let idx = self.add_constant(Constant::String(value.to_string()))?;
        let reg = self.alloc_reg()?;
        self.emit_abx(OpCode::LoadConst, reg, idx);
        Ok(reg)
    }

    /// LoadTrue / LoadFalse / LoadNull / LoadUndef
    fn compile_load(&mut self, op: OpCode) -> Result<u8, CompilerError> {
        let reg = self.alloc_reg()?;
        self.emit_abc(op, reg, 0, 0);
        Ok(reg)
    }

    fn compile_identifier(&mut self, name: &str) -> Result<u8, CompilerError> {
        match self.resolve_name(name)? {
            Resolved::Local { reg: local, .. } => {
                let reg = self.alloc_reg()?;
                self.emit_abc(OpCode::Move, reg, local, 0);
                Ok(reg)
            }
            Resolved::Global => {
                let idx = self.name_constant(name)?;
                let reg = self.alloc_reg()?;
                self.emit_abx(OpCode::GetGlobal, reg, idx);
                Ok(reg)
            }
        }
    }
}
