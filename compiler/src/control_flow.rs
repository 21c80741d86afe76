use crate::codegen::Compiler;
use crate::error::CompilerError;
use crate::expressions::ExpressionCompiler;
use crate::scopes::ScopeCompiler;
use crate::statements::StatementCompiler;
use jsvm_parser::ast::{Block, Expr, Stmt};
use vm::opcode::instruction::{decode_a, decode_opcode, encode_abx};
use vm::opcode::OpCode;

pub trait ControlFlowCompiler {
    fn compile_block(&mut self, block: &Block) -> Result<(), CompilerError>;
    fn compile_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), CompilerError>;
    fn compile_while(&mut self, condition: &Expr, body: &Stmt) -> Result<(), CompilerError>;

    // Low level
    fn emit_jump(&mut self, op: OpCode, a: u8) -> usize;
    fn patch_jump(&mut self, idx: usize) -> Result<(), CompilerError>;
    fn emit_loop(&mut self, start: usize) -> Result<(), CompilerError>;
}

impl ControlFlowCompiler for Compiler {
    fn emit_jump(&mut self, op: OpCode, a: u8) -> usize {
        self.emit_abx(op, a, 0xFFFF);
        self.current().bytecode.len() - 1
    }

    fn patch_jump(&mut self, idx: usize) -> Result<(), CompilerError> {
        let line = self.line();
        let bytecode = &mut self.current().bytecode;
        let target = u16::try_from(bytecode.len()).map_err(|_| CompilerError::JumpTooFar { line })?;
        let instr = bytecode[idx];
        bytecode[idx] = encode_abx(decode_opcode(instr), decode_a(instr), target);
        Ok(())
    }

    fn emit_loop(&mut self, start: usize) -> Result<(), CompilerError> {
        let line = self.line();
        let target = u16::try_from(start).map_err(|_| CompilerError::JumpTooFar { line })?;
        self.emit_abx(OpCode::Jump, 0, target);
        Ok(())
    }

    fn compile_block(&mut self, block: &Block) -> Result<(), CompilerError> {
        self.begin_scope();
        for stmt in &block.stmts {
            self.compile_stmt(stmt)?;
        }
        self.end_scope();
        Ok(())
    }

    fn compile_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), CompilerError> {
        let cond_reg = self.compile_expr(condition)?;
        let jump_else = self.emit_jump(OpCode::JumpIfFalse, cond_reg);
        self.free_reg(cond_reg);

        self.compile_nested(then_branch)?;

        match else_branch {
            Some(else_branch) => {
                let jump_end = self.emit_jump(OpCode::Jump, 0);
                self.patch_jump(jump_else)?;
                self.compile_nested(else_branch)?;
                self.patch_jump(jump_end)
            }
            None => self.patch_jump(jump_else),
        }
    }

    fn compile_while(&mut self, condition: &Expr, body: &Stmt) -> Result<(), CompilerError> {
        let loop_start = self.current().bytecode.len();

        let cond_reg = self.compile_expr(condition)?;
        let exit = self.emit_jump(OpCode::JumpIfFalse, cond_reg);
        self.free_reg(cond_reg);

        self.compile_nested(body)?;
        self.emit_loop(loop_start)?;
        self.patch_jump(exit)
    }
}

impl Compiler {
    /// A branch or loop body gets its own scope even without braces.
    fn compile_nested(&mut self, stmt: &Stmt) -> Result<(), CompilerError> {
        self.begin_scope();
        self.compile_stmt(stmt)?;
        self.end_scope();
        Ok(())
    }
}
